use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use crate::GridGeometry;

/// Discrete position index around the belt perimeter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BeltStep(u32);

impl BeltStep {
    /// Creates a new belt step.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric step index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Edge of the grid a belt segment runs along, in traversal order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BeltSide {
    /// Below the grid, walked left to right.
    Bottom,
    /// Right of the grid, walked bottom to top.
    Right,
    /// Above the grid, walked right to left.
    Top,
    /// Left of the grid, walked top to bottom.
    Left,
}

impl BeltSide {
    /// Sides in traversal order.
    pub const ALL: [BeltSide; 4] = [Self::Bottom, Self::Right, Self::Top, Self::Left];

    /// Zero-based position of the side in traversal order.
    #[must_use]
    pub const fn ordinal(self) -> u32 {
        match self {
            Self::Bottom => 0,
            Self::Right => 1,
            Self::Top => 2,
            Self::Left => 3,
        }
    }
}

/// Pure model of the belt that loops around the grid one cell outside its edges.
///
/// Step `k` of a side sits in front of the `k`-th cell of that side's lane
/// in traversal order, so a shooter at any step is positioned for the
/// approach region that matches its side.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BeltLayout {
    geometry: GridGeometry,
}

impl BeltLayout {
    /// Creates the belt that surrounds the provided grid.
    #[must_use]
    pub const fn new(geometry: GridGeometry) -> Self {
        Self { geometry }
    }

    /// Grid the belt surrounds.
    #[must_use]
    pub const fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// Number of steps along a single side.
    #[must_use]
    pub const fn side_length(&self) -> u32 {
        self.geometry.size()
    }

    /// Number of steps in a full lap.
    #[must_use]
    pub const fn step_count(&self) -> u32 {
        self.geometry.size().saturating_mul(4)
    }

    /// Iterates over every step of a lap in traversal order.
    pub fn steps(&self) -> impl Iterator<Item = BeltStep> {
        (0..self.step_count()).map(BeltStep::new)
    }

    /// First step of the provided side.
    #[must_use]
    pub const fn first_step(&self, side: BeltSide) -> BeltStep {
        BeltStep::new(side.ordinal() * self.side_length())
    }

    /// Side the step belongs to; `None` when the step lies beyond the lap.
    #[must_use]
    pub fn side_of(&self, step: BeltStep) -> Option<BeltSide> {
        let side_length = self.side_length();
        if side_length == 0 || step.get() >= self.step_count() {
            return None;
        }
        let ordinal = usize::try_from(step.get() / side_length).ok()?;
        BeltSide::ALL.get(ordinal).copied()
    }

    /// Integer grid coordinates of the step, one cell outside the grid.
    #[must_use]
    pub fn grid_position_for(&self, step: BeltStep) -> Option<IVec2> {
        let side = self.side_of(step)?;
        let size = i32::try_from(self.side_length()).ok()?;
        let local = i32::try_from(step.get() % self.side_length()).ok()?;

        let position = match side {
            BeltSide::Bottom => IVec2::new(local, -1),
            BeltSide::Right => IVec2::new(size, local),
            BeltSide::Top => IVec2::new(size - 1 - local, size),
            BeltSide::Left => IVec2::new(-1, size - 1 - local),
        };
        Some(position)
    }

    /// World position a shooter occupies at the provided step.
    #[must_use]
    pub fn position_for(&self, step: BeltStep) -> Option<Vec2> {
        self.grid_position_for(step)
            .map(|grid| self.geometry.grid_to_world(grid.as_vec2()))
    }

    /// Outer corners of the belt; segment `i` runs from corner `i` to corner `i + 1`.
    #[must_use]
    pub fn waypoints(&self) -> [Vec2; 4] {
        let far = self.side_length() as f32;
        [
            Vec2::new(-1.0, -1.0),
            Vec2::new(far, -1.0),
            Vec2::new(far, far),
            Vec2::new(-1.0, far),
        ]
        .map(|corner| self.geometry.grid_to_world(corner))
    }

    /// Point where shooters join the belt.
    #[must_use]
    pub fn entry(&self) -> Vec2 {
        self.waypoints()[0]
    }
}
