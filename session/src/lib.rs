#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Level session that owns the world and its systems.
//!
//! Every public operation applies a single command and then pumps the
//! resulting events through the scheduling and projectile systems until no
//! follow-up commands remain, so callers always observe a settled world.

use std::{collections::VecDeque, fmt, time::Duration};

use belt_blast_core::{
    ColumnIndex, Command, ConfigError, Event, LevelData, Outcome, ShooterId, StageConfig,
};
use belt_blast_system_projectiles::{Config as ProjectileConfig, ProjectileFlight, Projectiles};
use belt_blast_system_scheduling::ScheduleComputer;
use belt_blast_world::{self as world, query, World};

/// Game-state collaborator notified when the session is decided.
pub trait OutcomeListener {
    /// Called once when the last block is destroyed.
    fn on_win(&mut self);

    /// Called once when a returning shooter finds the ready queue full.
    fn on_loss(&mut self);
}

/// Single level session.
pub struct Session {
    world: World,
    scheduler: ScheduleComputer,
    projectiles: Projectiles,
    listener: Option<Box<dyn OutcomeListener>>,
    journal: Vec<Event>,
}

impl Session {
    /// Creates a session and loads the provided level.
    ///
    /// A missing level starts the session on an empty grid.
    pub fn new(config: StageConfig, level: Option<LevelData>) -> Result<Self, ConfigError> {
        let projectiles = Projectiles::new(ProjectileConfig::from_stage(&config));
        let scheduler = ScheduleComputer::from_stage(&config);
        let world = World::with_config(config)?;
        let mut session = Self {
            world,
            scheduler,
            projectiles,
            listener: None,
            journal: Vec::new(),
        };

        let level = level.unwrap_or_else(|| {
            tracing::warn!("no level data supplied; starting with an empty grid");
            LevelData::default()
        });
        session.load(level);
        Ok(session)
    }

    /// Attaches the collaborator that receives the outcome.
    #[must_use]
    pub fn with_listener(mut self, listener: Box<dyn OutcomeListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Replaces the session contents with a new level.
    pub fn load(&mut self, level: LevelData) {
        self.submit(Command::LoadLevel { level });
    }

    /// Moves the front shooter of a table column into the ready queue.
    pub fn select_column(&mut self, column: ColumnIndex) {
        self.submit(Command::SelectShooter { column });
    }

    /// Sends a queued shooter to the belt.
    pub fn activate(&mut self, shooter: ShooterId) {
        self.submit(Command::ActivateShooter { shooter });
    }

    /// Removes a shooter immediately, releasing everything it holds.
    pub fn discard(&mut self, shooter: ShooterId) {
        self.submit(Command::DiscardShooter { shooter });
    }

    /// Advances the simulation by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.submit(Command::Tick { dt });
    }

    /// Authoritative world, for queries.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Projectiles currently in the air.
    #[must_use]
    pub fn projectiles(&self) -> &[ProjectileFlight] {
        self.projectiles.in_flight()
    }

    /// Outcome reached by the session, if any.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        query::outcome(&self.world)
    }

    /// Takes every event emitted since the previous call.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.journal)
    }

    fn submit(&mut self, command: Command) {
        let mut pending = VecDeque::from([command]);
        while let Some(command) = pending.pop_front() {
            let mut events = Vec::new();
            world::apply(&mut self.world, command, &mut events);
            if events.is_empty() {
                continue;
            }

            self.dispatch_outcomes(&events);

            let mut commands = Vec::new();
            self.scheduler.handle(
                &events,
                query::belt_layout(&self.world),
                &query::blocks(&self.world),
                &query::shooters(&self.world),
                &mut commands,
            );
            self.projectiles.handle(&events, &mut commands);
            pending.extend(commands);
            self.journal.extend(events);
        }
    }

    fn dispatch_outcomes(&mut self, events: &[Event]) {
        for event in events {
            let outcome = match event {
                Event::LevelWon => Outcome::Won,
                Event::LevelLost => Outcome::Lost,
                _ => continue,
            };
            match self.listener.as_mut() {
                Some(listener) => match outcome {
                    Outcome::Won => listener.on_win(),
                    Outcome::Lost => listener.on_loss(),
                },
                None => {
                    tracing::warn!(?outcome, "no outcome listener attached; dropping signal");
                }
            }
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("world", &self.world)
            .field("projectiles", &self.projectiles)
            .field("listener", &self.listener.is_some())
            .finish_non_exhaustive()
    }
}
