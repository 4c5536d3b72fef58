use belt_blast_core::{
    BlockColor, BlockState, BlockView, CellCoord, CellRecord, GridGeometry, ShooterId,
};

/// Reservation of a single block held by a shooter's pending schedule entry.
///
/// A claim can only leave a schedule by being fired or handed back through
/// [`BlockGrid::release`].
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a claim must be fired or released"]
pub(crate) struct Claim {
    cell: CellCoord,
    owner: ShooterId,
}

impl Claim {
    /// Converts the claim into a shot; the block stays reserved until the projectile lands.
    pub(crate) fn fire(self) -> CellCoord {
        self.cell
    }
}

/// Outcome of removing a block from the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Removal {
    /// The cell held no live block.
    Ignored,
    /// A block was destroyed and others remain.
    Destroyed,
    /// The last live block was destroyed.
    Cleared,
}

/// Counts of level records dropped while materializing the grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct PopulateReport {
    pub(crate) out_of_bounds: u32,
    pub(crate) unknown_color: u32,
    pub(crate) duplicates: u32,
}

/// Dense storage of grid blocks together with the live block count.
#[derive(Clone, Debug)]
pub(crate) struct BlockGrid {
    geometry: GridGeometry,
    cells: Vec<Option<BlockState>>,
    live: u32,
    cleared: bool,
}

impl BlockGrid {
    pub(crate) fn new(geometry: GridGeometry) -> Self {
        Self {
            geometry,
            cells: vec![None; geometry.cell_count()],
            live: 0,
            cleared: false,
        }
    }

    /// Replaces the grid contents with the provided level records.
    pub(crate) fn populate(&mut self, records: &[CellRecord]) -> PopulateReport {
        self.cells.fill(None);
        self.live = 0;
        self.cleared = false;

        let mut report = PopulateReport::default();
        for record in records {
            let Some(cell) = self.cell_from_signed(record.x, record.y) else {
                report.out_of_bounds += 1;
                continue;
            };
            let Ok(color) = record.color.parse::<BlockColor>() else {
                tracing::warn!(
                    x = record.x,
                    y = record.y,
                    color = %record.color,
                    "skipping level cell with unknown color"
                );
                report.unknown_color += 1;
                continue;
            };
            let Some(index) = self.geometry.index(cell) else {
                report.out_of_bounds += 1;
                continue;
            };

            if self.cells[index].replace(BlockState::live(color)).is_some() {
                report.duplicates += 1;
            } else {
                self.live += 1;
            }
        }

        if report.out_of_bounds > 0 {
            tracing::debug!(
                skipped = report.out_of_bounds,
                "dropped level cells outside the grid"
            );
        }
        report
    }

    pub(crate) fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub(crate) fn live_count(&self) -> u32 {
        self.live
    }

    pub(crate) fn view(&self) -> BlockView<'_> {
        BlockView::new(&self.cells, self.geometry.size())
    }

    /// Bounds-checked lookup; out-of-range coordinates and empty slots yield `None`.
    pub(crate) fn cell_at(&self, x: i32, y: i32) -> Option<&BlockState> {
        let cell = self.cell_from_signed(x, y)?;
        self.block(cell)
    }

    pub(crate) fn block(&self, cell: CellCoord) -> Option<&BlockState> {
        let index = self.geometry.index(cell)?;
        self.cells.get(index)?.as_ref()
    }

    /// Reserves a live, unclaimed block for the provided shooter.
    pub(crate) fn claim(&mut self, cell: CellCoord, owner: ShooterId) -> Option<Claim> {
        let block = self.block_mut(cell)?;
        if !block.is_targetable() {
            return None;
        }
        block.claimant = Some(owner);
        Some(Claim { cell, owner })
    }

    /// Hands a claim back so other shooters may target the block again.
    pub(crate) fn release(&mut self, claim: Claim) -> CellCoord {
        let Claim { cell, owner } = claim;
        if let Some(block) = self.block_mut(cell) {
            if block.claimant == Some(owner) {
                block.claimant = None;
            }
        }
        cell
    }

    /// Destroys the block at `cell`; a second removal of the same block is a no-op.
    pub(crate) fn remove_cell(&mut self, cell: CellCoord) -> Removal {
        let Some(block) = self.block_mut(cell) else {
            return Removal::Ignored;
        };
        if !block.alive {
            return Removal::Ignored;
        }

        block.alive = false;
        block.claimant = None;
        self.live = self.live.saturating_sub(1);

        if self.live == 0 && !self.cleared {
            self.cleared = true;
            Removal::Cleared
        } else {
            Removal::Destroyed
        }
    }

    fn block_mut(&mut self, cell: CellCoord) -> Option<&mut BlockState> {
        let index = self.geometry.index(cell)?;
        self.cells.get_mut(index)?.as_mut()
    }

    fn cell_from_signed(&self, x: i32, y: i32) -> Option<CellCoord> {
        let cell = CellCoord::new(u32::try_from(x).ok()?, u32::try_from(y).ok()?);
        self.geometry.contains(cell).then_some(cell)
    }
}
