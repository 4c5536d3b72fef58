#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Firing-schedule precomputation for shooters about to enter the belt.
//!
//! The whole pass is simulated before the shooter moves: every belt step is
//! resolved to a target and accepted targets are provisionally claimed, so
//! later steps and later requests answered in the same batch never pick a cell
//! that is already spoken for.

use std::collections::BTreeMap;

use belt_blast_core::{
    BeltLayout, BlockColor, BlockState, BlockView, CellCoord, Command, Event, ScheduleEntry,
    ShooterId, ShooterView, StageConfig,
};
use belt_blast_system_targeting::{BlockLookup, TargetResolver};

/// Pure system that answers schedule requests with [`Command::AssignSchedule`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ScheduleComputer {
    resolver: TargetResolver,
}

impl ScheduleComputer {
    /// Creates a computer using the default target resolver.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_resolver(TargetResolver::new())
    }

    /// Creates a computer around a custom target resolver.
    #[must_use]
    pub const fn with_resolver(resolver: TargetResolver) -> Self {
        Self { resolver }
    }

    /// Creates a computer whose resolver uses the stage's approach tolerance.
    #[must_use]
    pub const fn from_stage(config: &StageConfig) -> Self {
        Self::with_resolver(TargetResolver::with_tolerance(config.approach_tolerance))
    }

    /// Tolerance of the resolver consulted for every step.
    #[must_use]
    pub const fn tolerance(&self) -> f32 {
        self.resolver.tolerance()
    }

    /// Computes the schedule of a single shooter against the provided blocks.
    #[must_use]
    pub fn compute<B>(
        &self,
        layout: &BeltLayout,
        blocks: &B,
        shooter: ShooterId,
        color: BlockColor,
        ammo: u32,
    ) -> Vec<ScheduleEntry>
    where
        B: BlockLookup + ?Sized,
    {
        let mut overlay = ProvisionalClaims::new(blocks);
        self.compute_with(layout, &mut overlay, shooter, color, ammo)
    }

    /// Answers every schedule request in `events`.
    ///
    /// Requests are answered in event order; provisional claims persist across
    /// the batch so concurrent requests receive disjoint targets.
    pub fn handle(
        &self,
        events: &[Event],
        layout: &BeltLayout,
        blocks: &BlockView<'_>,
        shooters: &ShooterView,
        out: &mut Vec<Command>,
    ) {
        let mut overlay: Option<ProvisionalClaims<'_, BlockView<'_>>> = None;
        for event in events {
            let Event::ScheduleRequested { shooter } = event else {
                continue;
            };
            let Some(snapshot) = shooters.get(*shooter) else {
                tracing::warn!(shooter = shooter.get(), "schedule requested for unknown shooter");
                continue;
            };

            let claims = overlay.get_or_insert_with(|| ProvisionalClaims::new(blocks));
            let entries =
                self.compute_with(layout, claims, *shooter, snapshot.color, snapshot.ammo);
            tracing::debug!(
                shooter = shooter.get(),
                shots = entries.len(),
                ammo = snapshot.ammo,
                "schedule computed"
            );
            out.push(Command::AssignSchedule {
                shooter: *shooter,
                entries,
            });
        }
    }

    fn compute_with<B>(
        &self,
        layout: &BeltLayout,
        overlay: &mut ProvisionalClaims<'_, B>,
        shooter: ShooterId,
        color: BlockColor,
        ammo: u32,
    ) -> Vec<ScheduleEntry>
    where
        B: BlockLookup + ?Sized,
    {
        let budget = usize::try_from(ammo).unwrap_or(usize::MAX);
        let mut entries = Vec::with_capacity(budget.min(layout.step_count() as usize));
        let geometry = layout.geometry();

        for step in layout.steps() {
            if entries.len() >= budget {
                break;
            }
            let Some(position) = layout.position_for(step) else {
                continue;
            };
            let Some(cell) = self.resolver.resolve(geometry, &*overlay, position) else {
                continue;
            };
            let accepted = overlay
                .block(cell)
                .is_some_and(|block| block.is_targetable() && block.color == color);
            if !accepted {
                continue;
            }
            overlay.claim(cell, shooter);
            entries.push(ScheduleEntry { step, cell });
        }

        entries
    }
}

/// Block lookup that layers not-yet-applied claims over the world's blocks.
struct ProvisionalClaims<'a, B: ?Sized> {
    base: &'a B,
    claims: BTreeMap<CellCoord, ShooterId>,
}

impl<'a, B: BlockLookup + ?Sized> ProvisionalClaims<'a, B> {
    fn new(base: &'a B) -> Self {
        Self {
            base,
            claims: BTreeMap::new(),
        }
    }

    fn claim(&mut self, cell: CellCoord, shooter: ShooterId) {
        let _ = self.claims.insert(cell, shooter);
    }
}

impl<B: BlockLookup + ?Sized> BlockLookup for ProvisionalClaims<'_, B> {
    fn block(&self, cell: CellCoord) -> Option<BlockState> {
        let mut block = self.base.block(cell)?;
        if let Some(shooter) = self.claims.get(&cell) {
            block.claimant = Some(*shooter);
        }
        Some(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use belt_blast_core::{GridGeometry, Vec2};

    fn layout() -> BeltLayout {
        BeltLayout::new(GridGeometry::from_origin(Vec2::ZERO, 3, 1.0))
    }

    fn grid(colors: &[(u32, u32, BlockColor)]) -> Vec<Option<BlockState>> {
        let mut cells = vec![None; 9];
        for (x, y, color) in colors {
            cells[(*y * 3 + *x) as usize] = Some(BlockState::live(*color));
        }
        cells
    }

    #[test]
    fn schedule_stops_at_ammo() {
        let cells = grid(&[
            (0, 0, BlockColor::Red),
            (1, 0, BlockColor::Red),
            (2, 0, BlockColor::Red),
        ]);
        let view = BlockView::new(&cells, 3);
        let entries =
            ScheduleComputer::new().compute(&layout(), &view, ShooterId::new(0), BlockColor::Red, 2);

        let cells: Vec<_> = entries.iter().map(|entry| entry.cell).collect();
        assert_eq!(cells, vec![CellCoord::new(0, 0), CellCoord::new(1, 0)]);
    }

    #[test]
    fn mismatched_colors_are_passed_over() {
        let cells = grid(&[(0, 0, BlockColor::Blue), (0, 1, BlockColor::Red)]);
        let view = BlockView::new(&cells, 3);
        let entries =
            ScheduleComputer::new().compute(&layout(), &view, ShooterId::new(0), BlockColor::Red, 5);

        // Column 0 from below is fronted by blue; the right side reaches row 1 across empty cells.
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].cell, CellCoord::new(0, 1));
        assert_eq!(entries[0].step.get(), 4);
    }

    #[test]
    fn provisional_claims_stop_later_scans() {
        let cells = grid(&[(2, 0, BlockColor::Red), (1, 0, BlockColor::Red)]);
        let view = BlockView::new(&cells, 3);
        let entries =
            ScheduleComputer::new().compute(&layout(), &view, ShooterId::new(0), BlockColor::Red, 9);

        let cells: Vec<_> = entries.iter().map(|entry| entry.cell).collect();
        // Later sides meet the claimed cells first and stop there.
        assert_eq!(cells, vec![CellCoord::new(1, 0), CellCoord::new(2, 0)]);
    }

    #[test]
    fn stage_tolerance_reaches_the_resolver() {
        let config = StageConfig {
            approach_tolerance: 1.5,
            ..StageConfig::default()
        };
        assert_eq!(ScheduleComputer::from_stage(&config).tolerance(), 1.5);

        // The belt runs one cell outside the grid, inside a 1.5 cell band.
        let cells = grid(&[(0, 0, BlockColor::Red)]);
        let view = BlockView::new(&cells, 3);
        let entries = ScheduleComputer::from_stage(&config).compute(
            &layout(),
            &view,
            ShooterId::new(0),
            BlockColor::Red,
            3,
        );
        assert!(entries.is_empty());
    }

    #[test]
    fn zero_ammo_yields_empty_schedule() {
        let cells = grid(&[(0, 0, BlockColor::Red)]);
        let view = BlockView::new(&cells, 3);
        let entries =
            ScheduleComputer::new().compute(&layout(), &view, ShooterId::new(0), BlockColor::Red, 0);
        assert!(entries.is_empty());
    }
}
