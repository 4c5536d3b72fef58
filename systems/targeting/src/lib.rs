#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Directional nearest-target search for shooters standing outside the grid.
//!
//! A world position is converted into fractional grid coordinates and
//! classified into one of four approach regions. Each region fixes a lane
//! (the column or row facing the shooter) and a scan direction that starts at
//! the grid edge nearest the shooter. The first live block in scan order is
//! the only candidate: if another shooter already claimed it the scan stops
//! there instead of reaching past it.

use belt_blast_core::{BeltSide, BlockState, BlockView, CellCoord, GridGeometry, Vec2};

/// Margin, in cells, a position must clear beyond the grid edge to select an approach.
pub const DEFAULT_TOLERANCE: f32 = 0.4;

/// Source of block state consulted while scanning.
pub trait BlockLookup {
    /// Returns the block stored at the provided cell, if any.
    fn block(&self, cell: CellCoord) -> Option<BlockState>;
}

impl BlockLookup for BlockView<'_> {
    fn block(&self, cell: CellCoord) -> Option<BlockState> {
        BlockView::block(self, cell)
    }
}

/// Approach region and lane selected for a world position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Approach {
    /// Grid edge the position faces.
    pub side: BeltSide,
    /// Column (bottom/top) or row (left/right) scanned from that edge.
    pub lane: u32,
}

/// Result of walking a lane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The nearest live block is unclaimed and may be targeted.
    Free(CellCoord),
    /// The nearest live block is claimed by another shooter.
    Blocked(CellCoord),
    /// The lane holds no live block.
    Clear,
}

/// Complete outcome of a directional scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scan {
    /// Approach the scan used.
    pub approach: Approach,
    /// What the scan found.
    pub outcome: ScanOutcome,
}

impl Scan {
    /// Cell that may be targeted, if the scan found one.
    #[must_use]
    pub const fn target(&self) -> Option<CellCoord> {
        match self.outcome {
            ScanOutcome::Free(cell) => Some(cell),
            ScanOutcome::Blocked(_) | ScanOutcome::Clear => None,
        }
    }
}

/// Pure resolver that maps belt-side positions to grid targets.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetResolver {
    tolerance: f32,
}

impl TargetResolver {
    /// Creates a resolver using [`DEFAULT_TOLERANCE`].
    #[must_use]
    pub const fn new() -> Self {
        Self::with_tolerance(DEFAULT_TOLERANCE)
    }

    /// Creates a resolver with a custom approach tolerance.
    #[must_use]
    pub const fn with_tolerance(tolerance: f32) -> Self {
        Self { tolerance }
    }

    /// Tolerance applied when classifying positions.
    #[must_use]
    pub const fn tolerance(&self) -> f32 {
        self.tolerance
    }

    /// Determines the approach region of a world position.
    ///
    /// Regions are tested bottom, right, top, left with strict inequalities;
    /// positions over the grid or inside the tolerance band have no approach.
    #[must_use]
    pub fn classify(&self, geometry: &GridGeometry, world: Vec2) -> Option<Approach> {
        let size = geometry.size();
        if size == 0 {
            return None;
        }
        let raw = geometry.world_to_grid(world);
        let far_edge = (size - 1) as f32 + self.tolerance;

        let side = if raw.y < -self.tolerance {
            BeltSide::Bottom
        } else if raw.x > far_edge {
            BeltSide::Right
        } else if raw.y > far_edge {
            BeltSide::Top
        } else if raw.x < -self.tolerance {
            BeltSide::Left
        } else {
            return None;
        };

        let along = match side {
            BeltSide::Bottom | BeltSide::Top => raw.x,
            BeltSide::Right | BeltSide::Left => raw.y,
        };
        Some(Approach {
            side,
            lane: lane_index(along, size),
        })
    }

    /// Walks the lane facing `world` and reports the first live block.
    #[must_use]
    pub fn scan<B>(&self, geometry: &GridGeometry, blocks: &B, world: Vec2) -> Option<Scan>
    where
        B: BlockLookup + ?Sized,
    {
        let approach = self.classify(geometry, world)?;
        let size = geometry.size();
        let lane = approach.lane;

        let outcome = lane_cells(approach.side, lane, size)
            .find_map(|cell| {
                let block = blocks.block(cell)?;
                if !block.alive {
                    return None;
                }
                Some(if block.is_claimed() {
                    ScanOutcome::Blocked(cell)
                } else {
                    ScanOutcome::Free(cell)
                })
            })
            .unwrap_or(ScanOutcome::Clear);

        Some(Scan { approach, outcome })
    }

    /// Returns the nearest live, unclaimed block facing `world`.
    #[must_use]
    pub fn resolve<B>(&self, geometry: &GridGeometry, blocks: &B, world: Vec2) -> Option<CellCoord>
    where
        B: BlockLookup + ?Sized,
    {
        self.scan(geometry, blocks, world)?.target()
    }
}

impl Default for TargetResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Rounds half to even and clamps into the grid.
fn lane_index(along: f32, size: u32) -> u32 {
    let max = (size - 1) as f32;
    let rounded = along.round_ties_even();
    if rounded.is_nan() {
        return 0;
    }
    rounded.clamp(0.0, max) as u32
}

fn lane_cells(side: BeltSide, lane: u32, size: u32) -> impl Iterator<Item = CellCoord> {
    (0..size).map(move |offset| {
        let far = size - 1 - offset;
        match side {
            BeltSide::Bottom => CellCoord::new(lane, offset),
            BeltSide::Right => CellCoord::new(far, lane),
            BeltSide::Top => CellCoord::new(lane, far),
            BeltSide::Left => CellCoord::new(offset, lane),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use belt_blast_core::{BlockColor, ShooterId};

    fn geometry() -> GridGeometry {
        GridGeometry::from_origin(Vec2::ZERO, 4, 1.0)
    }

    fn cells_with(blocks: &[(u32, u32, BlockState)]) -> Vec<Option<BlockState>> {
        let mut cells = vec![None; 16];
        for (x, y, block) in blocks {
            cells[(*y * 4 + *x) as usize] = Some(*block);
        }
        cells
    }

    fn claimed(color: BlockColor) -> BlockState {
        BlockState {
            claimant: Some(ShooterId::new(1)),
            ..BlockState::live(color)
        }
    }

    fn dead(color: BlockColor) -> BlockState {
        BlockState {
            alive: false,
            ..BlockState::live(color)
        }
    }

    #[test]
    fn regions_are_classified_in_priority_order() {
        let resolver = TargetResolver::new();
        let geometry = geometry();

        let bottom = resolver.classify(&geometry, Vec2::new(2.0, -1.0));
        assert_eq!(
            bottom,
            Some(Approach {
                side: BeltSide::Bottom,
                lane: 2
            })
        );
        let right = resolver.classify(&geometry, Vec2::new(4.0, 1.0));
        assert_eq!(right.map(|approach| approach.side), Some(BeltSide::Right));
        let top = resolver.classify(&geometry, Vec2::new(1.0, 4.0));
        assert_eq!(top.map(|approach| approach.side), Some(BeltSide::Top));
        let left = resolver.classify(&geometry, Vec2::new(-1.0, 3.0));
        assert_eq!(left.map(|approach| approach.side), Some(BeltSide::Left));

        let corner = resolver.classify(&geometry, Vec2::new(4.0, -1.0));
        assert_eq!(
            corner,
            Some(Approach {
                side: BeltSide::Bottom,
                lane: 3
            })
        );
    }

    #[test]
    fn tolerance_band_and_interior_have_no_approach() {
        let resolver = TargetResolver::new();
        let geometry = geometry();

        assert_eq!(resolver.classify(&geometry, Vec2::new(1.0, -0.4)), None);
        assert_eq!(resolver.classify(&geometry, Vec2::new(3.4, 2.0)), None);
        assert_eq!(resolver.classify(&geometry, Vec2::new(1.5, 1.5)), None);
        assert!(resolver.classify(&geometry, Vec2::new(1.0, -0.41)).is_some());
    }

    #[test]
    fn lane_index_rounds_half_to_even() {
        assert_eq!(lane_index(0.5, 4), 0);
        assert_eq!(lane_index(1.5, 4), 2);
        assert_eq!(lane_index(2.5, 4), 2);
        assert_eq!(lane_index(-3.0, 4), 0);
        assert_eq!(lane_index(9.0, 4), 3);
    }

    #[test]
    fn scan_skips_empty_and_dead_slots() {
        let cells = cells_with(&[
            (1, 0, dead(BlockColor::Red)),
            (1, 2, BlockState::live(BlockColor::Blue)),
        ]);
        let view = BlockView::new(&cells, 4);
        let resolver = TargetResolver::new();

        let found = resolver.resolve(&geometry(), &view, Vec2::new(1.0, -1.0));
        assert_eq!(found, Some(CellCoord::new(1, 2)));
    }

    #[test]
    fn claimed_block_stops_the_scan() {
        let cells = cells_with(&[
            (3, 1, claimed(BlockColor::Red)),
            (1, 1, BlockState::live(BlockColor::Red)),
        ]);
        let view = BlockView::new(&cells, 4);
        let resolver = TargetResolver::new();

        let scan = resolver.scan(&geometry(), &view, Vec2::new(4.0, 1.0));
        assert_eq!(
            scan.map(|scan| scan.outcome),
            Some(ScanOutcome::Blocked(CellCoord::new(3, 1)))
        );
        assert_eq!(resolver.resolve(&geometry(), &view, Vec2::new(4.0, 1.0)), None);
    }

    #[test]
    fn each_side_scans_from_its_own_edge() {
        let cells = cells_with(&[
            (2, 0, BlockState::live(BlockColor::Red)),
            (2, 3, BlockState::live(BlockColor::Green)),
            (0, 1, BlockState::live(BlockColor::Yellow)),
            (3, 1, BlockState::live(BlockColor::Blue)),
        ]);
        let view = BlockView::new(&cells, 4);
        let resolver = TargetResolver::new();
        let geometry = geometry();

        assert_eq!(
            resolver.resolve(&geometry, &view, Vec2::new(2.0, -1.0)),
            Some(CellCoord::new(2, 0))
        );
        assert_eq!(
            resolver.resolve(&geometry, &view, Vec2::new(2.0, 4.0)),
            Some(CellCoord::new(2, 3))
        );
        assert_eq!(
            resolver.resolve(&geometry, &view, Vec2::new(-1.0, 1.0)),
            Some(CellCoord::new(0, 1))
        );
        assert_eq!(
            resolver.resolve(&geometry, &view, Vec2::new(4.0, 1.0)),
            Some(CellCoord::new(3, 1))
        );
    }

    #[test]
    fn empty_lane_reports_clear() {
        let cells = cells_with(&[]);
        let view = BlockView::new(&cells, 4);
        let scan = TargetResolver::new().scan(&geometry(), &view, Vec2::new(0.0, -1.0));
        assert_eq!(scan.map(|scan| scan.outcome), Some(ScanOutcome::Clear));
    }
}
