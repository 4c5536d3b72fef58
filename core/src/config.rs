use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{BeltLayout, GridGeometry};

/// Tunable parameters of a level session.
///
/// Defaults reproduce the stage the levels were authored for: a 20×20 grid
/// of unit cells centered on the world origin and a five-slot ready queue.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Number of cells along each grid edge.
    pub grid_size: u32,
    /// Side length of a cell in world units.
    pub cell_size: f32,
    /// World position of the grid center.
    pub grid_center: [f32; 2],
    /// Number of ready slots.
    pub ready_capacity: u32,
    /// Belt traversal speed in world units per second.
    pub belt_speed: f32,
    /// Seconds spent gliding between the table, the queue and the belt entry.
    pub move_seconds: f32,
    /// Seconds of the death animation played when a shooter runs dry.
    pub death_seconds: f32,
    /// Projectile speed in world units per second.
    pub projectile_speed: f32,
    /// Margin, in cells, a position must clear beyond the grid to select an approach.
    pub approach_tolerance: f32,
    /// Distance between neighbouring ready slots and table columns in world units.
    pub slot_spacing: f32,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            grid_size: 20,
            cell_size: 1.0,
            grid_center: [0.0, 0.0],
            ready_capacity: 5,
            belt_speed: 5.0,
            move_seconds: 0.4,
            death_seconds: 0.3,
            projectile_speed: 20.0,
            approach_tolerance: 0.4,
            slot_spacing: 1.5,
        }
    }
}

/// Reasons a [`StageConfig`] may be rejected.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// The grid has no cells.
    #[error("grid size must be at least one cell")]
    EmptyGrid,
    /// The grid would overflow its storage or belt indices.
    #[error("grid size {0} exceeds the supported maximum of 4096")]
    OversizedGrid(u32),
    /// The ready queue has no slots.
    #[error("ready queue capacity must be at least one slot")]
    NoReadySlots,
    /// A parameter that must be strictly positive is not.
    #[error("`{field}` must be a positive finite number, got {value}")]
    NonPositive {
        /// Name of the offending parameter.
        field: &'static str,
        /// Value supplied for it.
        value: f32,
    },
    /// A parameter that must be non-negative is not.
    #[error("`{field}` must be a non-negative finite number, got {value}")]
    Negative {
        /// Name of the offending parameter.
        field: &'static str,
        /// Value supplied for it.
        value: f32,
    },
    /// The grid center is not a finite position.
    #[error("`grid_center` must be a finite position")]
    NonFiniteCenter,
}

const MAX_GRID_SIZE: u32 = 4096;

impl StageConfig {
    /// Checks that every parameter lies within its supported range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size == 0 {
            return Err(ConfigError::EmptyGrid);
        }
        if self.grid_size > MAX_GRID_SIZE {
            return Err(ConfigError::OversizedGrid(self.grid_size));
        }
        if self.ready_capacity == 0 {
            return Err(ConfigError::NoReadySlots);
        }

        let positive = [
            ("cell_size", self.cell_size),
            ("belt_speed", self.belt_speed),
            ("projectile_speed", self.projectile_speed),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NonPositive { field, value });
            }
        }

        let non_negative = [
            ("move_seconds", self.move_seconds),
            ("death_seconds", self.death_seconds),
            ("approach_tolerance", self.approach_tolerance),
            ("slot_spacing", self.slot_spacing),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }

        if !self.grid_center.iter().all(|value| value.is_finite()) {
            return Err(ConfigError::NonFiniteCenter);
        }

        Ok(())
    }

    /// Grid geometry described by the configuration.
    #[must_use]
    pub fn geometry(&self) -> GridGeometry {
        GridGeometry::centered_on(Vec2::from(self.grid_center), self.grid_size, self.cell_size)
    }

    /// Belt surrounding the configured grid.
    #[must_use]
    pub fn belt(&self) -> BeltLayout {
        BeltLayout::new(self.geometry())
    }

    /// Duration of a glide between the table, the queue and the belt entry.
    #[must_use]
    pub fn move_duration(&self) -> Duration {
        seconds(self.move_seconds)
    }

    /// Duration of the bounce toward the queue before a boosted pass.
    #[must_use]
    pub fn bounce_duration(&self) -> Duration {
        seconds(self.move_seconds * 0.5)
    }

    /// Duration of the death animation.
    #[must_use]
    pub fn death_duration(&self) -> Duration {
        seconds(self.death_seconds)
    }
}

fn seconds(value: f32) -> Duration {
    Duration::try_from_secs_f32(value).unwrap_or(Duration::ZERO)
}
