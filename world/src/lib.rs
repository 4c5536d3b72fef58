#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Belt Blast.

mod grid;
mod lifecycle;
mod slots;

use std::{collections::VecDeque, time::Duration};

use belt_blast_core::{
    ActivationError, BeltLayout, BlockColor, CellCoord, ColumnIndex, Command, ConfigError, Event, LevelData,
    Outcome, ScheduleEntry, SelectionError, ShooterId, ShooterState, SlotIndex, StageConfig, Vec2,
};

use grid::{BlockGrid, Removal};
use lifecycle::{PendingShot, Shooter, Shot, Signal, TickContext};
use slots::{ReadySlots, ShooterTable};

/// Vertical gap between the grid edge and the ready queue, in cells.
const QUEUE_GAP_CELLS: f32 = 2.5;

/// Represents the authoritative Belt Blast world state.
#[derive(Debug)]
pub struct World {
    config: StageConfig,
    belt: BeltLayout,
    grid: BlockGrid,
    slots: ReadySlots,
    table: ShooterTable,
    shooters: Vec<Shooter>,
    next_shooter: u32,
    outcome: Option<Outcome>,
}

impl World {
    /// Creates an empty world using the default stage configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::from_valid_config(StageConfig::default())
    }

    /// Creates an empty world after validating the provided configuration.
    pub fn with_config(config: StageConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: StageConfig) -> Self {
        let belt = config.belt();
        Self {
            grid: BlockGrid::new(*belt.geometry()),
            slots: ReadySlots::new(config.ready_capacity),
            table: ShooterTable::default(),
            shooters: Vec::new(),
            next_shooter: 0,
            outcome: None,
            belt,
            config,
        }
    }

    fn shooter_index(&self, shooter: ShooterId) -> Option<usize> {
        self.shooters
            .binary_search_by_key(&shooter, Shooter::id)
            .ok()
    }

    fn allocate_shooter_id(&mut self) -> ShooterId {
        let id = ShooterId::new(self.next_shooter);
        self.next_shooter = self.next_shooter.saturating_add(1);
        id
    }

    fn slot_row(&self) -> f32 {
        let geometry = self.belt.geometry();
        let half_extent = geometry.size() as f32 * geometry.cell_size() * 0.5;
        geometry.center().y - half_extent - QUEUE_GAP_CELLS * geometry.cell_size()
    }

    fn slot_position(&self, slot: SlotIndex) -> Vec2 {
        let offset = centered_offset(slot.get() as usize, self.slots.capacity());
        Vec2::new(
            self.belt.geometry().center().x + offset * self.config.slot_spacing,
            self.slot_row(),
        )
    }

    fn table_position(&self, column: usize, depth: usize) -> Vec2 {
        let offset = centered_offset(column, self.table.column_count());
        let spacing = self.config.slot_spacing;
        Vec2::new(
            self.belt.geometry().center().x + offset * spacing,
            self.slot_row() - spacing * (1.0 + depth as f32),
        )
    }

    fn restack_column(&mut self, column: ColumnIndex) {
        let Some(entries) = self.table.column(column) else {
            return;
        };
        let placements: Vec<(ShooterId, Vec2)> = entries
            .iter()
            .enumerate()
            .map(|(depth, shooter)| {
                (
                    *shooter,
                    self.table_position(column.get() as usize, depth),
                )
            })
            .collect();
        for (shooter, position) in placements {
            if let Some(index) = self.shooter_index(shooter) {
                self.shooters[index].place(position);
            }
        }
    }

    fn load_level(&mut self, level: LevelData, out_events: &mut Vec<Event>) {
        let report = self.grid.populate(&level.cells);
        if report.out_of_bounds + report.unknown_color + report.duplicates > 0 {
            tracing::debug!(
                out_of_bounds = report.out_of_bounds,
                unknown_color = report.unknown_color,
                duplicates = report.duplicates,
                "level cells were adjusted while loading"
            );
        }

        self.slots = ReadySlots::new(self.config.ready_capacity);
        self.shooters.clear();
        self.outcome = None;

        let mut columns = Vec::with_capacity(level.columns.len());
        for column in &level.columns {
            let mut entries = VecDeque::with_capacity(column.shooters.len());
            for record in &column.shooters {
                let Ok(color) = record.color.parse::<BlockColor>() else {
                    tracing::warn!(color = %record.color, "skipping shooter with unknown color");
                    continue;
                };
                if record.ammo == 0 {
                    tracing::warn!(%color, "skipping shooter without ammo");
                    continue;
                }
                let id = self.allocate_shooter_id();
                self.shooters
                    .push(Shooter::in_table(id, color, record.ammo, Vec2::ZERO));
                entries.push_back(id);
            }
            columns.push(entries);
        }
        self.table = ShooterTable::new(columns);
        for column in 0..self.table.column_count() {
            if let Ok(column) = u32::try_from(column) {
                self.restack_column(ColumnIndex::new(column));
            }
        }

        let blocks = self.grid.live_count();
        if blocks == 0 {
            tracing::warn!("level has no blocks; the session cannot be won");
        }
        let shooters = u32::try_from(self.shooters.len()).unwrap_or(u32::MAX);
        tracing::debug!(blocks, shooters, "level loaded");
        out_events.push(Event::LevelLoaded { blocks, shooters });
    }

    fn select(&mut self, column: ColumnIndex, out_events: &mut Vec<Event>) {
        if let Err(reason) = self.check_selection(column) {
            out_events.push(Event::SelectionRejected { column, reason });
            return;
        }
        let Some(shooter) = self.table.pop_front(column) else {
            out_events.push(Event::SelectionRejected {
                column,
                reason: SelectionError::EmptyColumn,
            });
            return;
        };
        let Some(slot) = self.slots.register(shooter) else {
            out_events.push(Event::SelectionRejected {
                column,
                reason: SelectionError::QueueFull,
            });
            return;
        };

        let position = self.slot_position(slot);
        let duration = self.config.move_duration();
        if let Some(index) = self.shooter_index(shooter) {
            self.shooters[index].enter_queue(position, duration);
        }
        self.restack_column(column);
        out_events.push(Event::ShooterQueued { shooter, slot });
    }

    fn check_selection(&self, column: ColumnIndex) -> Result<(), SelectionError> {
        if self.outcome.is_some() {
            return Err(SelectionError::SessionOver);
        }
        let _ = self.table.front(column)?;
        if self.slots.is_full() {
            return Err(SelectionError::QueueFull);
        }
        Ok(())
    }

    fn activate(&mut self, shooter: ShooterId, out_events: &mut Vec<Event>) {
        if self.outcome.is_some() {
            out_events.push(Event::ActivationRejected {
                shooter,
                reason: ActivationError::SessionOver,
            });
            return;
        }
        let Some(index) = self.shooter_index(shooter) else {
            out_events.push(Event::ActivationRejected {
                shooter,
                reason: ActivationError::MissingShooter,
            });
            return;
        };
        if self.shooters[index].state() != ShooterState::InQueue {
            out_events.push(Event::ActivationRejected {
                shooter,
                reason: ActivationError::NotQueued,
            });
            return;
        }

        let _ = self.slots.unregister(shooter);
        let entry = self.belt.entry();
        let duration = self.config.move_duration();
        self.shooters[index].head_for_belt(entry, duration);
        out_events.push(Event::ScheduleRequested { shooter });
    }

    fn assign(&mut self, shooter: ShooterId, entries: Vec<ScheduleEntry>, out_events: &mut Vec<Event>) {
        let Some(index) = self.shooter_index(shooter) else {
            tracing::warn!(shooter = shooter.get(), "schedule delivered for unknown shooter");
            return;
        };
        let target = &self.shooters[index];
        if target.state() != ShooterState::Transitioning || !target.is_awaiting_schedule() {
            tracing::warn!(
                shooter = shooter.get(),
                state = ?target.state(),
                "ignoring unrequested schedule"
            );
            return;
        }

        let color = target.color();
        let ammo = usize::try_from(target.ammo()).unwrap_or(usize::MAX);
        let step_count = self.belt.step_count();
        let mut shots: Vec<PendingShot> = Vec::with_capacity(entries.len().min(ammo));
        let mut last_step = None;
        for entry in entries {
            if shots.len() >= ammo {
                tracing::warn!(shooter = shooter.get(), "schedule exceeds ammo; truncating");
                break;
            }
            if entry.step.get() >= step_count || last_step.is_some_and(|last| entry.step <= last) {
                tracing::warn!(
                    shooter = shooter.get(),
                    step = entry.step.get(),
                    "skipping out-of-order schedule entry"
                );
                continue;
            }
            let matches = self
                .grid
                .block(entry.cell)
                .is_some_and(|block| block.color == color);
            if !matches {
                tracing::warn!(
                    shooter = shooter.get(),
                    column = entry.cell.column(),
                    row = entry.cell.row(),
                    "skipping schedule entry aimed at a mismatched cell"
                );
                continue;
            }
            let Some(claim) = self.grid.claim(entry.cell, shooter) else {
                tracing::warn!(
                    shooter = shooter.get(),
                    column = entry.cell.column(),
                    row = entry.cell.row(),
                    "skipping schedule entry whose cell is no longer claimable"
                );
                continue;
            };
            last_step = Some(entry.step);
            shots.push(PendingShot::new(entry.step, claim));
        }

        let count = u32::try_from(shots.len()).unwrap_or(u32::MAX);
        self.shooters[index].attach_schedule(shots);
        out_events.push(Event::ScheduleAssigned {
            shooter,
            shots: count,
        });
        self.enter_belt(index, out_events);
    }

    fn enter_belt(&mut self, index: usize, out_events: &mut Vec<Event>) {
        let entry = self.belt.entry();
        let shooter = &mut self.shooters[index];
        if shooter.start_belt(entry) {
            out_events.push(Event::ShooterEnteredBelt {
                shooter: shooter.id(),
                boosted: shooter.is_boosted(),
            });
        }
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        out_events.push(Event::TimeAdvanced { dt });
        if self.outcome.is_some() {
            return;
        }

        let context = TickContext {
            belt: self.belt,
            belt_speed: self.config.belt_speed,
            death_duration: self.config.death_duration(),
        };
        let mut shots: Vec<Shot> = Vec::new();
        for index in 0..self.shooters.len() {
            if self.outcome.is_some() {
                break;
            }
            if self.shooters[index].state() == ShooterState::Destroyed {
                continue;
            }
            let signal = self.shooters[index].advance(dt, &context, &mut shots);
            for shot in shots.drain(..) {
                out_events.push(Event::ProjectileLaunched {
                    shooter: shot.shooter,
                    cell: shot.cell,
                    origin: shot.origin,
                    target: self.belt.geometry().cell_center(shot.cell),
                });
            }
            self.handle_signal(index, signal, out_events);
        }
        self.shooters
            .retain(|shooter| shooter.state() != ShooterState::Destroyed);
    }

    fn handle_signal(&mut self, index: usize, signal: Signal, out_events: &mut Vec<Event>) {
        let shooter = self.shooters[index].id();
        match signal {
            Signal::Idle => {}
            Signal::ReachedEntry => self.enter_belt(index, out_events),
            Signal::BounceFinished => {
                let entry = self.belt.entry();
                let duration = self.config.move_duration();
                let target = &mut self.shooters[index];
                target.boost();
                target.head_for_belt(entry, duration);
                out_events.push(Event::ScheduleRequested { shooter });
            }
            Signal::LapComplete => self.finish_lap(index, out_events),
            Signal::Depleted => {
                self.release_claims(index, out_events);
                self.shooters[index].start_dying();
                tracing::debug!(shooter = shooter.get(), "shooter ran out of ammo");
                out_events.push(Event::ShooterDepleted { shooter });
            }
            Signal::DeathFinished => {
                self.shooters[index].mark_destroyed();
                out_events.push(Event::ShooterDestroyed { shooter });
            }
        }
    }

    fn finish_lap(&mut self, index: usize, out_events: &mut Vec<Event>) {
        let shooter = self.shooters[index].id();
        if self.table.is_empty() && self.slots.is_empty() {
            let slot = self.slots.first_empty().unwrap_or(SlotIndex::new(0));
            let target = self.slot_position(slot);
            let duration = self.config.bounce_duration();
            self.shooters[index].bounce_toward(target, duration);
            tracing::debug!(shooter = shooter.get(), "re-engaging with boost");
            out_events.push(Event::ShooterReengaged { shooter });
            return;
        }

        if self.slots.is_full() {
            self.release_claims(index, out_events);
            self.shooters[index].mark_destroyed();
            out_events.push(Event::ShooterDestroyed { shooter });
            self.declare(Outcome::Lost, out_events);
            return;
        }

        let Some(slot) = self.slots.register(shooter) else {
            return;
        };
        let position = self.slot_position(slot);
        let duration = self.config.move_duration();
        self.shooters[index].enter_queue(position, duration);
        out_events.push(Event::ShooterReturned { shooter, slot });
    }

    fn release_claims(&mut self, index: usize, out_events: &mut Vec<Event>) {
        let cells = self.shooters[index].release_schedule(&mut self.grid);
        if !cells.is_empty() {
            out_events.push(Event::ClaimsReleased {
                shooter: self.shooters[index].id(),
                cells,
            });
        }
    }

    fn discard(&mut self, shooter: ShooterId, out_events: &mut Vec<Event>) {
        let Some(index) = self.shooter_index(shooter) else {
            tracing::warn!(shooter = shooter.get(), "cannot discard unknown shooter");
            return;
        };

        self.release_claims(index, out_events);
        let _ = self.slots.unregister(shooter);
        if let Some(column) = self.table.remove(shooter) {
            self.restack_column(column);
        }
        self.shooters[index].mark_destroyed();
        let _ = self.shooters.remove(index);
        out_events.push(Event::ShooterDestroyed { shooter });
    }

    fn land(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        match self.grid.remove_cell(cell) {
            Removal::Ignored => {
                tracing::debug!(
                    column = cell.column(),
                    row = cell.row(),
                    "projectile landed on an empty cell"
                );
            }
            Removal::Destroyed => out_events.push(Event::BlockDestroyed { cell }),
            Removal::Cleared => {
                out_events.push(Event::BlockDestroyed { cell });
                self.declare(Outcome::Won, out_events);
            }
        }
    }

    fn declare(&mut self, outcome: Outcome, out_events: &mut Vec<Event>) {
        if let Some(previous) = self.outcome {
            tracing::warn!(?previous, suppressed = ?outcome, "session already decided");
            return;
        }
        self.outcome = Some(outcome);
        tracing::info!(?outcome, "session decided");
        out_events.push(match outcome {
            Outcome::Won => Event::LevelWon,
            Outcome::Lost => Event::LevelLost,
        });
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

fn centered_offset(index: usize, count: usize) -> f32 {
    index as f32 - (count.saturating_sub(1) as f32) * 0.5
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::LoadLevel { level } => world.load_level(level, out_events),
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::SelectShooter { column } => world.select(column, out_events),
        Command::ActivateShooter { shooter } => world.activate(shooter, out_events),
        Command::AssignSchedule { shooter, entries } => world.assign(shooter, entries, out_events),
        Command::LandProjectile { cell } => world.land(cell, out_events),
        Command::DiscardShooter { shooter } => world.discard(shooter, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::World;
    use belt_blast_core::{
        BeltLayout, BlockState, BlockView, GridGeometry, Outcome, ShooterId, ShooterView,
        StageConfig,
    };

    /// Configuration the world was built with.
    #[must_use]
    pub fn stage_config(world: &World) -> &StageConfig {
        &world.config
    }

    /// Grid geometry shared by the spatial index and the belt.
    #[must_use]
    pub fn geometry(world: &World) -> &GridGeometry {
        world.grid.geometry()
    }

    /// Belt surrounding the grid.
    #[must_use]
    pub fn belt_layout(world: &World) -> &BeltLayout {
        &world.belt
    }

    /// Exposes a read-only view of the dense block grid.
    #[must_use]
    pub fn blocks(world: &World) -> BlockView<'_> {
        world.grid.view()
    }

    /// Bounds-checked block lookup at signed grid coordinates.
    #[must_use]
    pub fn cell_at(world: &World, x: i32, y: i32) -> Option<BlockState> {
        world.grid.cell_at(x, y).copied()
    }

    /// Number of blocks still standing.
    #[must_use]
    pub fn live_blocks(world: &World) -> u32 {
        world.grid.live_count()
    }

    /// Captures a read-only view of every shooter still in play.
    #[must_use]
    pub fn shooters(world: &World) -> ShooterView {
        let snapshots = world
            .shooters
            .iter()
            .map(|shooter| shooter.snapshot(world.slots.slot_of(shooter.id())))
            .collect();
        ShooterView::from_snapshots(snapshots)
    }

    /// Occupants of the ready slots in slot order.
    #[must_use]
    pub fn ready_slots(world: &World) -> &[Option<ShooterId>] {
        world.slots.occupants()
    }

    /// Shooters waiting in each table column, front first.
    #[must_use]
    pub fn table_columns(world: &World) -> Vec<Vec<ShooterId>> {
        world
            .table
            .columns()
            .iter()
            .map(|column| column.iter().copied().collect())
            .collect()
    }

    /// Reports whether every table column is empty.
    #[must_use]
    pub fn is_table_empty(world: &World) -> bool {
        world.table.is_empty()
    }

    /// Reports whether every ready slot is free.
    #[must_use]
    pub fn is_queue_empty(world: &World) -> bool {
        world.slots.is_empty()
    }

    /// Outcome reached by the session, if any.
    #[must_use]
    pub fn outcome(world: &World) -> Option<Outcome> {
        world.outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use belt_blast_core::{BeltStep, CellRecord, ShooterColumn, ShooterRecord};

    fn cell(x: i32, y: i32, color: &str) -> CellRecord {
        CellRecord {
            x,
            y,
            color: color.to_owned(),
        }
    }

    fn shooter(color: &str, ammo: u32) -> ShooterRecord {
        ShooterRecord {
            color: color.to_owned(),
            ammo,
        }
    }

    fn small_world() -> World {
        World::with_config(StageConfig {
            grid_size: 4,
            ready_capacity: 2,
            ..StageConfig::default()
        })
        .expect("config is valid")
    }

    fn load(world: &mut World, cells: Vec<CellRecord>, columns: Vec<Vec<ShooterRecord>>) -> Vec<Event> {
        let mut events = Vec::new();
        apply(
            world,
            Command::LoadLevel {
                level: LevelData {
                    cells,
                    columns: columns
                        .into_iter()
                        .map(|shooters| ShooterColumn { shooters })
                        .collect(),
                },
            },
            &mut events,
        );
        events
    }

    fn run(world: &mut World, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        apply(world, command, &mut events);
        events
    }

    #[test]
    fn load_level_skips_invalid_records() {
        let mut world = small_world();
        let events = load(
            &mut world,
            vec![cell(0, 0, "red"), cell(9, 9, "red"), cell(1, 1, "mauve")],
            vec![vec![shooter("red", 3), shooter("teal", 2), shooter("blue", 0)]],
        );

        assert_eq!(
            events,
            vec![Event::LevelLoaded {
                blocks: 1,
                shooters: 1
            }]
        );
        assert_eq!(query::live_blocks(&world), 1);
        assert!(query::cell_at(&world, 9, 9).is_none());
    }

    #[test]
    fn selection_moves_column_front_into_first_slot() {
        let mut world = small_world();
        let _ = load(
            &mut world,
            vec![cell(0, 0, "red")],
            vec![vec![shooter("red", 1), shooter("blue", 1)]],
        );

        let events = run(
            &mut world,
            Command::SelectShooter {
                column: ColumnIndex::new(0),
            },
        );
        assert_eq!(
            events,
            vec![Event::ShooterQueued {
                shooter: ShooterId::new(0),
                slot: SlotIndex::new(0),
            }]
        );
        assert_eq!(query::table_columns(&world), vec![vec![ShooterId::new(1)]]);
        assert_eq!(
            query::shooters(&world)
                .get(ShooterId::new(0))
                .map(|snapshot| snapshot.state),
            Some(ShooterState::InQueue)
        );
    }

    #[test]
    fn selection_rejects_empty_columns_and_full_queue() {
        let mut world = small_world();
        let _ = load(
            &mut world,
            vec![cell(0, 0, "red")],
            vec![
                vec![shooter("red", 1), shooter("red", 1), shooter("red", 1)],
                Vec::new(),
            ],
        );

        let empty = run(
            &mut world,
            Command::SelectShooter {
                column: ColumnIndex::new(1),
            },
        );
        assert_eq!(
            empty,
            vec![Event::SelectionRejected {
                column: ColumnIndex::new(1),
                reason: SelectionError::EmptyColumn,
            }]
        );

        for _ in 0..2 {
            let _ = run(
                &mut world,
                Command::SelectShooter {
                    column: ColumnIndex::new(0),
                },
            );
        }
        let full = run(
            &mut world,
            Command::SelectShooter {
                column: ColumnIndex::new(0),
            },
        );
        assert_eq!(
            full,
            vec![Event::SelectionRejected {
                column: ColumnIndex::new(0),
                reason: SelectionError::QueueFull,
            }]
        );
    }

    #[test]
    fn activation_requires_queued_shooter() {
        let mut world = small_world();
        let _ = load(&mut world, vec![cell(0, 0, "red")], vec![vec![shooter("red", 1)]]);

        let events = run(
            &mut world,
            Command::ActivateShooter {
                shooter: ShooterId::new(0),
            },
        );
        assert_eq!(
            events,
            vec![Event::ActivationRejected {
                shooter: ShooterId::new(0),
                reason: ActivationError::NotQueued,
            }]
        );

        let missing = run(
            &mut world,
            Command::ActivateShooter {
                shooter: ShooterId::new(9),
            },
        );
        assert_eq!(
            missing,
            vec![Event::ActivationRejected {
                shooter: ShooterId::new(9),
                reason: ActivationError::MissingShooter,
            }]
        );
    }

    #[test]
    fn assigned_schedule_claims_targets_and_discard_releases_them() {
        let mut world = small_world();
        let _ = load(
            &mut world,
            vec![cell(0, 0, "red"), cell(1, 0, "red"), cell(2, 0, "blue")],
            vec![vec![shooter("red", 5)]],
        );
        let id = ShooterId::new(0);
        let _ = run(
            &mut world,
            Command::SelectShooter {
                column: ColumnIndex::new(0),
            },
        );
        let activated = run(&mut world, Command::ActivateShooter { shooter: id });
        assert_eq!(activated, vec![Event::ScheduleRequested { shooter: id }]);

        let assigned = run(
            &mut world,
            Command::AssignSchedule {
                shooter: id,
                entries: vec![
                    ScheduleEntry {
                        step: BeltStep::new(0),
                        cell: CellCoord::new(0, 0),
                    },
                    ScheduleEntry {
                        step: BeltStep::new(1),
                        cell: CellCoord::new(1, 0),
                    },
                    ScheduleEntry {
                        step: BeltStep::new(2),
                        cell: CellCoord::new(2, 0),
                    },
                ],
            },
        );
        assert_eq!(assigned, vec![Event::ScheduleAssigned { shooter: id, shots: 2 }]);
        assert!(query::cell_at(&world, 0, 0).is_some_and(|block| block.is_claimed()));
        assert!(query::cell_at(&world, 2, 0).is_some_and(|block| !block.is_claimed()));

        let discarded = run(&mut world, Command::DiscardShooter { shooter: id });
        assert_eq!(
            discarded,
            vec![
                Event::ClaimsReleased {
                    shooter: id,
                    cells: vec![CellCoord::new(0, 0), CellCoord::new(1, 0)],
                },
                Event::ShooterDestroyed { shooter: id },
            ]
        );
        assert!(query::cell_at(&world, 0, 0).is_some_and(|block| block.is_targetable()));
        assert!(query::shooters(&world).get(id).is_none());
    }

    #[test]
    fn entering_the_belt_waits_for_glide_and_schedule() {
        let mut world = small_world();
        let _ = load(&mut world, vec![cell(0, 0, "red")], vec![vec![shooter("red", 1)]]);
        let id = ShooterId::new(0);
        let _ = run(
            &mut world,
            Command::SelectShooter {
                column: ColumnIndex::new(0),
            },
        );
        let _ = run(&mut world, Command::ActivateShooter { shooter: id });

        let glided = run(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(1),
            },
        );
        assert!(!glided
            .iter()
            .any(|event| matches!(event, Event::ShooterEnteredBelt { .. })));

        let assigned = run(
            &mut world,
            Command::AssignSchedule {
                shooter: id,
                entries: Vec::new(),
            },
        );
        assert_eq!(
            assigned,
            vec![
                Event::ScheduleAssigned { shooter: id, shots: 0 },
                Event::ShooterEnteredBelt {
                    shooter: id,
                    boosted: false,
                },
            ]
        );
    }

    #[test]
    fn last_block_wins_exactly_once() {
        let mut world = small_world();
        let _ = load(&mut world, vec![cell(0, 0, "red"), cell(1, 0, "red")], Vec::new());

        let first = run(
            &mut world,
            Command::LandProjectile {
                cell: CellCoord::new(0, 0),
            },
        );
        assert_eq!(
            first,
            vec![Event::BlockDestroyed {
                cell: CellCoord::new(0, 0)
            }]
        );

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::LandProjectile {
                cell: CellCoord::new(1, 0),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::LandProjectile {
                cell: CellCoord::new(1, 0),
            },
            &mut events,
        );
        let wins = events
            .iter()
            .filter(|event| matches!(event, Event::LevelWon))
            .count();
        assert_eq!(wins, 1);
        assert_eq!(query::outcome(&world), Some(Outcome::Won));
    }

    #[test]
    fn decided_session_rejects_selection() {
        let mut world = small_world();
        let _ = load(&mut world, vec![cell(0, 0, "red")], vec![vec![shooter("red", 1)]]);
        let _ = run(
            &mut world,
            Command::LandProjectile {
                cell: CellCoord::new(0, 0),
            },
        );

        let events = run(
            &mut world,
            Command::SelectShooter {
                column: ColumnIndex::new(0),
            },
        );
        assert_eq!(
            events,
            vec![Event::SelectionRejected {
                column: ColumnIndex::new(0),
                reason: SelectionError::SessionOver,
            }]
        );
    }

    #[test]
    fn later_outcome_is_suppressed() {
        let mut world = small_world();
        let _ = load(&mut world, vec![cell(0, 0, "red")], Vec::new());

        let mut events = Vec::new();
        world.declare(Outcome::Lost, &mut events);
        apply(
            &mut world,
            Command::LandProjectile {
                cell: CellCoord::new(0, 0),
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![
                Event::LevelLost,
                Event::BlockDestroyed {
                    cell: CellCoord::new(0, 0)
                },
            ]
        );
        assert_eq!(query::outcome(&world), Some(Outcome::Lost));
    }

    #[test]
    fn loss_freezes_shooters_later_in_the_same_tick() {
        let mut world = small_world();
        let _ = load(
            &mut world,
            (0..4).map(|x| cell(x, 0, "red")).collect(),
            vec![
                vec![shooter("red", 5), shooter("red", 5)],
                vec![shooter("red", 1), shooter("red", 1)],
            ],
        );
        let first = ShooterId::new(0);
        let second = ShooterId::new(1);

        for (id, entries) in [
            (first, Vec::new()),
            (
                second,
                vec![
                    ScheduleEntry {
                        step: BeltStep::new(0),
                        cell: CellCoord::new(0, 0),
                    },
                    ScheduleEntry {
                        step: BeltStep::new(1),
                        cell: CellCoord::new(1, 0),
                    },
                ],
            ),
        ] {
            let _ = run(
                &mut world,
                Command::SelectShooter {
                    column: ColumnIndex::new(0),
                },
            );
            let _ = run(&mut world, Command::ActivateShooter { shooter: id });
            let _ = run(&mut world, Command::AssignSchedule { shooter: id, entries });
        }
        for _ in 0..2 {
            let _ = run(
                &mut world,
                Command::SelectShooter {
                    column: ColumnIndex::new(1),
                },
            );
        }
        assert!(query::ready_slots(&world).iter().all(Option::is_some));

        let entered = run(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(500),
            },
        );
        let on_belt = entered
            .iter()
            .filter(|event| matches!(event, Event::ShooterEnteredBelt { .. }))
            .count();
        assert_eq!(on_belt, 2);

        // Long enough for a full lap: the first shooter returns to a full queue.
        let events = run(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(10),
            },
        );
        assert!(events.contains(&Event::LevelLost));
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::ProjectileLaunched { .. })));

        let frozen = query::shooters(&world)
            .get(second)
            .copied()
            .expect("second shooter still in play");
        assert_eq!(frozen.state, ShooterState::OnBelt);
        assert_eq!(frozen.ammo, 5);
        assert_eq!(frozen.pending_shots, 2);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let result = World::with_config(StageConfig {
            ready_capacity: 0,
            ..StageConfig::default()
        });
        assert!(matches!(result, Err(ConfigError::NoReadySlots)));
    }
}
