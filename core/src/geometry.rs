use glam::Vec2;

use crate::CellCoord;

/// Maps between world space and the square block grid.
///
/// The origin is the world position of the center of cell `(0, 0)`; grid
/// coordinates grow by one per `cell_size` world units along each axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridGeometry {
    size: u32,
    cell_size: f32,
    origin: Vec2,
}

impl GridGeometry {
    /// Creates a geometry whose cell `(0, 0)` is centered on `origin`.
    #[must_use]
    pub const fn from_origin(origin: Vec2, size: u32, cell_size: f32) -> Self {
        Self {
            size,
            cell_size,
            origin,
        }
    }

    /// Creates a geometry for a grid centered on the provided world position.
    #[must_use]
    pub fn centered_on(center: Vec2, size: u32, cell_size: f32) -> Self {
        let start_offset = size as f32 * cell_size / 2.0 - cell_size / 2.0;
        Self::from_origin(center - Vec2::splat(start_offset), size, cell_size)
    }

    /// Number of cells along each edge.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Side length of a single cell in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// World position of the center of cell `(0, 0)`.
    #[must_use]
    pub const fn origin(&self) -> Vec2 {
        self.origin
    }

    /// World position of the center of the whole grid.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        let half_span = (self.size as f32 - 1.0) * self.cell_size / 2.0;
        self.origin + Vec2::splat(half_span)
    }

    /// Total number of cell slots.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        let size = usize::try_from(self.size).unwrap_or(0);
        size.saturating_mul(size)
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.size && cell.row() < self.size
    }

    /// Converts a world position into fractional grid coordinates.
    #[must_use]
    pub fn world_to_grid(&self, world: Vec2) -> Vec2 {
        (world - self.origin) / self.cell_size
    }

    /// Converts fractional grid coordinates into a world position.
    #[must_use]
    pub fn grid_to_world(&self, grid: Vec2) -> Vec2 {
        self.origin + grid * self.cell_size
    }

    /// World position of the center of the provided cell.
    #[must_use]
    pub fn cell_center(&self, cell: CellCoord) -> Vec2 {
        self.grid_to_world(Vec2::new(cell.column() as f32, cell.row() as f32))
    }

    /// Row-major storage index of the cell, if it lies inside the grid.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.size).ok()?;
        Some(row * width + column)
    }
}
