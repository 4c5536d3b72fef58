#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Straight-line projectile flight that reports arrivals back to the world.

use belt_blast_core::{CellCoord, Command, Event, ShooterId, StageConfig, Vec2};

/// Flight parameters shared by every projectile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// Travel speed in world units per second.
    pub speed: f32,
    /// Distance from the target at which a projectile counts as landed.
    pub arrival_radius: f32,
}

impl Config {
    /// Flight parameters derived from a stage configuration.
    #[must_use]
    pub fn from_stage(stage: &StageConfig) -> Self {
        Self {
            speed: stage.projectile_speed,
            ..Self::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            speed: 20.0,
            arrival_radius: 0.1,
        }
    }
}

/// Projectile travelling toward a claimed cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileFlight {
    /// Shooter that fired the projectile.
    pub shooter: ShooterId,
    /// Cell the projectile is aimed at.
    pub cell: CellCoord,
    /// Current world position.
    pub position: Vec2,
    /// World position of the target cell center.
    pub target: Vec2,
}

/// Pure system that advances projectiles and emits `Command::LandProjectile`.
#[derive(Debug, Default)]
pub struct Projectiles {
    config: Config,
    flights: Vec<ProjectileFlight>,
}

impl Projectiles {
    /// Creates a projectile system with the provided flight parameters.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            flights: Vec::new(),
        }
    }

    /// Projectiles currently in the air, in launch order.
    #[must_use]
    pub fn in_flight(&self) -> &[ProjectileFlight] {
        &self.flights
    }

    /// Consumes world events, advancing flights and reporting arrivals.
    ///
    /// Launches take effect after any time advance that precedes them in the
    /// same batch, so a projectile starts moving on the following tick.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::LevelLoaded { .. } => self.flights.clear(),
                Event::TimeAdvanced { dt } => self.advance(dt.as_secs_f32(), out),
                Event::ProjectileLaunched {
                    shooter,
                    cell,
                    origin,
                    target,
                } => self.flights.push(ProjectileFlight {
                    shooter: *shooter,
                    cell: *cell,
                    position: *origin,
                    target: *target,
                }),
                _ => {}
            }
        }
    }

    fn advance(&mut self, seconds: f32, out: &mut Vec<Command>) {
        let travel = self.config.speed * seconds;
        let radius = self.config.arrival_radius;
        self.flights.retain_mut(|flight| {
            let offset = flight.target - flight.position;
            let distance = offset.length();
            if distance <= travel || distance <= radius {
                flight.position = flight.target;
                out.push(Command::LandProjectile { cell: flight.cell });
                return false;
            }

            flight.position += offset / distance * travel;
            if flight.position.distance(flight.target) <= radius {
                out.push(Command::LandProjectile { cell: flight.cell });
                return false;
            }
            true
        });
    }
}
