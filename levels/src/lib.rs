#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Level data feed for Belt Blast.
//!
//! A level is stored as two JSON documents next to each other: the grid file
//! `<name>_grid.json` lists populated cells and the table file
//! `<name>_table.json` lists the shooter columns.

mod catalog;
mod showcase;

use std::path::PathBuf;

use belt_blast_core::{CellRecord, ShooterColumn};
use serde::{Deserialize, Serialize};

pub use catalog::{level_name, level_number, LevelCatalog};
pub use showcase::{showcase, SHOWCASE_MAX_AMMO};

/// Suffix appended to a level name to form its grid file name.
pub const GRID_SUFFIX: &str = "_grid.json";

/// Suffix appended to a level name to form its table file name.
pub const TABLE_SUFFIX: &str = "_table.json";

/// Errors raised while reading or writing level files.
#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    /// A level file could not be read or written.
    #[error("failed to access level file {path}")]
    Io {
        /// File that could not be accessed.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// A level file is not valid level JSON.
    #[error("malformed level file {path}")]
    Parse {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying decoding failure.
        #[source]
        source: serde_json::Error,
    },
    /// Level data could not be encoded.
    #[error("failed to encode level file {path}")]
    Encode {
        /// File that was being written.
        path: PathBuf,
        /// Underlying encoding failure.
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct GridFile {
    #[serde(default)]
    cells: Vec<CellRecord>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TableFile {
    #[serde(default)]
    columns: Vec<ShooterColumn>,
}

/// Decodes the populated cells of a grid document.
pub fn parse_grid(json: &str) -> Result<Vec<CellRecord>, serde_json::Error> {
    serde_json::from_str::<GridFile>(json).map(|file| file.cells)
}

/// Decodes the shooter columns of a table document.
pub fn parse_table(json: &str) -> Result<Vec<ShooterColumn>, serde_json::Error> {
    serde_json::from_str::<TableFile>(json).map(|file| file.columns)
}

fn encode_grid(cells: &[CellRecord]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&GridFile {
        cells: cells.to_vec(),
    })
}

fn encode_table(columns: &[ShooterColumn]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&TableFile {
        columns: columns.to_vec(),
    })
}
