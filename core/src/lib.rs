#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Belt Blast engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! views such as [`BlockView`] and [`ShooterView`], and respond exclusively
//! with new command batches.

mod belt;
mod config;
mod geometry;

use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

pub use belt::{BeltLayout, BeltSide, BeltStep};
pub use config::{ConfigError, StageConfig};
pub use geometry::GridGeometry;
pub use glam::{IVec2, Vec2};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the current session contents with the provided level.
    LoadLevel {
        /// Cell and shooter records describing the level.
        level: LevelData,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Moves the front shooter of a table column into the ready queue.
    SelectShooter {
        /// Table column the player picked from.
        column: ColumnIndex,
    },
    /// Sends a queued shooter toward the belt entry.
    ActivateShooter {
        /// Identifier of the queued shooter.
        shooter: ShooterId,
    },
    /// Delivers the firing schedule computed for a shooter about to enter the belt.
    AssignSchedule {
        /// Shooter that requested the schedule.
        shooter: ShooterId,
        /// Ordered schedule entries; each target is claimed when applied.
        entries: Vec<ScheduleEntry>,
    },
    /// Reports that a projectile reached the cell it was aimed at.
    LandProjectile {
        /// Cell struck by the projectile.
        cell: CellCoord,
    },
    /// Removes a shooter immediately regardless of its current state.
    DiscardShooter {
        /// Identifier of the shooter to remove.
        shooter: ShooterId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that a level replaced the previous session contents.
    LevelLoaded {
        /// Number of live blocks materialized on the grid.
        blocks: u32,
        /// Number of shooters placed into the table.
        shooters: u32,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a shooter left the table and occupies a ready slot.
    ShooterQueued {
        /// Shooter that moved into the queue.
        shooter: ShooterId,
        /// Slot the shooter registered into.
        slot: SlotIndex,
    },
    /// Reports that a table selection could not be honored.
    SelectionRejected {
        /// Column provided in the request.
        column: ColumnIndex,
        /// Specific reason the selection failed.
        reason: SelectionError,
    },
    /// Reports that an activation request could not be honored.
    ActivationRejected {
        /// Shooter named in the request.
        shooter: ShooterId,
        /// Specific reason the activation failed.
        reason: ActivationError,
    },
    /// Asks the scheduling system for a fresh firing schedule.
    ScheduleRequested {
        /// Shooter heading for the belt.
        shooter: ShooterId,
    },
    /// Confirms that a schedule was attached and its targets claimed.
    ScheduleAssigned {
        /// Shooter that received the schedule.
        shooter: ShooterId,
        /// Number of shots that survived validation.
        shots: u32,
    },
    /// Announces that a shooter started traversing the belt.
    ShooterEnteredBelt {
        /// Shooter that entered the belt.
        shooter: ShooterId,
        /// Whether the shooter travels at doubled speed.
        boosted: bool,
    },
    /// Requests a projectile flight from a shooter toward a claimed cell.
    ProjectileLaunched {
        /// Shooter that fired.
        shooter: ShooterId,
        /// Cell the projectile is aimed at.
        cell: CellCoord,
        /// World position the projectile starts from.
        origin: Vec2,
        /// World position of the target cell center.
        target: Vec2,
    },
    /// Announces that a shooter finished a lap and bounces back for a boosted pass.
    ShooterReengaged {
        /// Shooter performing the re-engage bounce.
        shooter: ShooterId,
    },
    /// Confirms that a shooter finished a lap and went back into the queue.
    ShooterReturned {
        /// Shooter that returned.
        shooter: ShooterId,
        /// Slot the shooter registered into.
        slot: SlotIndex,
    },
    /// Announces that a shooter ran out of ammo and started its death animation.
    ShooterDepleted {
        /// Shooter that ran dry.
        shooter: ShooterId,
    },
    /// Confirms that a shooter was removed from play.
    ShooterDestroyed {
        /// Shooter that was removed.
        shooter: ShooterId,
    },
    /// Reports claims dropped by a shooter before its schedule was consumed.
    ClaimsReleased {
        /// Shooter that owned the claims.
        shooter: ShooterId,
        /// Cells that became targetable again.
        cells: Vec<CellCoord>,
    },
    /// Confirms that a block was destroyed by a landed projectile.
    BlockDestroyed {
        /// Cell that held the block.
        cell: CellCoord,
    },
    /// Announces that the last live block was destroyed.
    LevelWon,
    /// Announces that a returning shooter found the ready queue full.
    LevelLost,
}

/// Final result of a level session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Every block was destroyed.
    Won,
    /// A returning shooter had nowhere to go.
    Lost,
}

/// Reasons a table selection may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectionError {
    /// The session already reached an outcome.
    SessionOver,
    /// The requested column does not exist in the table.
    MissingColumn,
    /// The requested column has no shooters left.
    EmptyColumn,
    /// Every ready slot is occupied.
    QueueFull,
}

/// Reasons an activation request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivationError {
    /// The session already reached an outcome.
    SessionOver,
    /// No shooter with the provided identifier exists.
    MissingShooter,
    /// The shooter is not waiting in the ready queue.
    NotQueued,
}

/// Palette of colors shared by blocks and shooters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockColor {
    /// Red blocks and shooters.
    Red,
    /// Blue blocks and shooters.
    Blue,
    /// Green blocks and shooters.
    Green,
    /// Yellow blocks and shooters.
    Yellow,
}

impl BlockColor {
    /// Every palette entry in declaration order.
    pub const ALL: [BlockColor; 4] = [Self::Red, Self::Blue, Self::Green, Self::Yellow];

    /// Lowercase name used by level files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Yellow => "yellow",
        }
    }
}

impl fmt::Display for BlockColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a color name is not part of the palette.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("color `{0}` is not part of the palette")]
pub struct UnknownColor(pub String);

impl FromStr for BlockColor {
    type Err = UnknownColor;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|color| color.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| UnknownColor(value.to_owned()))
    }
}

/// Unique identifier assigned to a shooter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShooterId(u32);

impl ShooterId {
    /// Creates a new shooter identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Position of a ready slot within the queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotIndex(u32);

impl SlotIndex {
    /// Creates a new slot index.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric slot position.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Column of the shooter table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnIndex(u32);

impl ColumnIndex {
    /// Creates a new column index.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric column position.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
///
/// Row zero is the bottom edge of the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }
}

/// One precomputed shot: fire at `cell` once the shooter reaches `step`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Belt step at which the shot fires.
    pub step: BeltStep,
    /// Cell the shot is aimed at.
    pub cell: CellCoord,
}

/// Lifecycle stage of a shooter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShooterState {
    /// Waiting in a table column.
    InTable,
    /// Registered into a ready slot.
    InQueue,
    /// Moving toward the belt entry.
    Transitioning,
    /// Traversing the belt perimeter.
    OnBelt,
    /// Lap finished; heading back to the queue or bouncing for a boosted pass.
    Returning,
    /// Out of ammo and playing the death animation.
    Dying,
    /// Removed from play.
    Destroyed,
}

/// Immutable state of a single grid block used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockState {
    /// Color a shooter must match to fire at the block.
    pub color: BlockColor,
    /// Whether the block still stands.
    pub alive: bool,
    /// Shooter holding a claim on the block, if any.
    pub claimant: Option<ShooterId>,
}

impl BlockState {
    /// Creates a live, unclaimed block.
    #[must_use]
    pub const fn live(color: BlockColor) -> Self {
        Self {
            color,
            alive: true,
            claimant: None,
        }
    }

    /// Reports whether some shooter has reserved the block.
    #[must_use]
    pub const fn is_claimed(&self) -> bool {
        self.claimant.is_some()
    }

    /// Reports whether the block may be selected as a fresh target.
    #[must_use]
    pub const fn is_targetable(&self) -> bool {
        self.alive && self.claimant.is_none()
    }
}

/// Read-only view into the dense block grid.
#[derive(Clone, Copy, Debug)]
pub struct BlockView<'a> {
    cells: &'a [Option<BlockState>],
    size: u32,
}

impl<'a> BlockView<'a> {
    /// Captures a new block view backed by the provided row-major cell slice.
    #[must_use]
    pub fn new(cells: &'a [Option<BlockState>], size: u32) -> Self {
        Self { cells, size }
    }

    /// Number of cells along each edge of the square grid.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Returns the block stored at the provided cell, if any.
    #[must_use]
    pub fn block(&self, cell: CellCoord) -> Option<BlockState> {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied().flatten())
    }

    /// Returns the block stored at signed grid coordinates.
    ///
    /// Negative or out-of-range coordinates yield `None`.
    #[must_use]
    pub fn block_at(&self, x: i32, y: i32) -> Option<BlockState> {
        let column = u32::try_from(x).ok()?;
        let row = u32::try_from(y).ok()?;
        self.block(CellCoord::new(column, row))
    }

    /// Iterates over every populated slot, including dead blocks.
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, BlockState)> + 'a {
        let size = self.size;
        self.cells
            .iter()
            .enumerate()
            .filter_map(move |(index, slot)| {
                let block = (*slot)?;
                let index = u32::try_from(index).ok()?;
                Some((CellCoord::new(index % size, index / size), block))
            })
    }

    /// Counts blocks that are still alive.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.iter().filter(|(_, block)| block.alive).count()
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.size && cell.row() < self.size {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.size).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

/// Immutable representation of a single shooter used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShooterSnapshot {
    /// Identifier allocated to the shooter by the world.
    pub id: ShooterId,
    /// Color of blocks the shooter may fire at.
    pub color: BlockColor,
    /// Shots left.
    pub ammo: u32,
    /// Current lifecycle stage.
    pub state: ShooterState,
    /// Whether belt traversal runs at doubled speed.
    pub boosted: bool,
    /// Current world position.
    pub position: Vec2,
    /// Ready slot held by the shooter, if any.
    pub slot: Option<SlotIndex>,
    /// Schedule entries not yet fired.
    pub pending_shots: u32,
}

/// Read-only snapshot describing every shooter of the session.
#[derive(Clone, Debug, Default)]
pub struct ShooterView {
    snapshots: Vec<ShooterSnapshot>,
}

impl ShooterView {
    /// Creates a new shooter view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<ShooterSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured shooter snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &ShooterSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot of a single shooter.
    #[must_use]
    pub fn get(&self, id: ShooterId) -> Option<&ShooterSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<ShooterSnapshot> {
        self.snapshots
    }
}

/// Populated grid cell as described by a level file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRecord {
    /// Column of the cell; values outside the grid are skipped.
    pub x: i32,
    /// Row of the cell; values outside the grid are skipped.
    pub y: i32,
    /// Palette name of the block color.
    pub color: String,
}

/// Shooter entry of a table column as described by a level file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShooterRecord {
    /// Palette name of the shooter color.
    pub color: String,
    /// Shots available to the shooter.
    pub ammo: u32,
}

/// Ordered column of shooters; the first record is the front of the column.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShooterColumn {
    /// Shooters from front to back.
    #[serde(default)]
    pub shooters: Vec<ShooterRecord>,
}

/// Complete level description consumed when a session starts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelData {
    /// Populated grid cells.
    #[serde(default)]
    pub cells: Vec<CellRecord>,
    /// Table columns of shooters.
    #[serde(default)]
    pub columns: Vec<ShooterColumn>,
}
