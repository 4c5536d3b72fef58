use std::{
    fs,
    path::{Path, PathBuf},
};

use belt_blast_core::LevelData;

use crate::{encode_grid, encode_table, parse_grid, parse_table, LevelError, GRID_SUFFIX, TABLE_SUFFIX};

const LEVEL_PREFIX: &str = "Level";

/// Directory of level files addressed by level name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelCatalog {
    root: PathBuf,
}

impl LevelCatalog {
    /// Creates a catalog over the provided directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory the catalog reads from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the grid file of the named level.
    #[must_use]
    pub fn grid_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}{GRID_SUFFIX}"))
    }

    /// Path of the table file of the named level.
    #[must_use]
    pub fn table_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}{TABLE_SUFFIX}"))
    }

    /// Reports whether the named level has a grid file.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.grid_path(name).is_file()
    }

    /// Reads both files of the named level.
    pub fn load(&self, name: &str) -> Result<LevelData, LevelError> {
        let grid_path = self.grid_path(name);
        let cells = parse_grid(&read(&grid_path)?)
            .map_err(|source| LevelError::Parse {
                path: grid_path,
                source,
            })?;
        let table_path = self.table_path(name);
        let columns = parse_table(&read(&table_path)?)
            .map_err(|source| LevelError::Parse {
                path: table_path,
                source,
            })?;
        Ok(LevelData { cells, columns })
    }

    /// Reads the named level, replacing any missing or malformed file with an empty part.
    #[must_use]
    pub fn load_lenient(&self, name: &str) -> LevelData {
        let grid_path = self.grid_path(name);
        let cells = read(&grid_path)
            .and_then(|json| {
                parse_grid(&json).map_err(|source| LevelError::Parse {
                    path: grid_path,
                    source,
                })
            })
            .unwrap_or_else(|error| {
                tracing::warn!(%error, level = name, "using an empty grid");
                Vec::new()
            });
        let table_path = self.table_path(name);
        let columns = read(&table_path)
            .and_then(|json| {
                parse_table(&json).map_err(|source| LevelError::Parse {
                    path: table_path,
                    source,
                })
            })
            .unwrap_or_else(|error| {
                tracing::warn!(%error, level = name, "using an empty shooter table");
                Vec::new()
            });
        LevelData { cells, columns }
    }

    /// Writes both files of the named level, creating the directory if needed.
    pub fn save(&self, name: &str, level: &LevelData) -> Result<(), LevelError> {
        fs::create_dir_all(&self.root).map_err(|source| LevelError::Io {
            path: self.root.clone(),
            source,
        })?;

        let grid_path = self.grid_path(name);
        let grid = encode_grid(&level.cells).map_err(|source| LevelError::Encode {
            path: grid_path.clone(),
            source,
        })?;
        write(&grid_path, &grid)?;

        let table_path = self.table_path(name);
        let table = encode_table(&level.columns).map_err(|source| LevelError::Encode {
            path: table_path.clone(),
            source,
        })?;
        write(&table_path, &table)
    }

    /// Name of the level following `name`, if the catalog holds it.
    #[must_use]
    pub fn next_level(&self, name: &str) -> Option<String> {
        let next = level_name(level_number(name).checked_add(1)?);
        if self.contains(&next) {
            Some(next)
        } else {
            tracing::debug!(current = name, "no further level in catalog");
            None
        }
    }
}

/// Name of the level with the provided number.
#[must_use]
pub fn level_name(number: u32) -> String {
    format!("{LEVEL_PREFIX}_{number}")
}

/// Parses the number out of a `Level_<n>` name, falling back to 1.
#[must_use]
pub fn level_number(name: &str) -> u32 {
    let parsed = name
        .split_once('_')
        .and_then(|(_, number)| number.parse::<u32>().ok());
    match parsed {
        Some(number) => number,
        None => {
            tracing::warn!(level = name, "level name is not of the form Level_<n>; assuming 1");
            1
        }
    }
}

fn read(path: &Path) -> Result<String, LevelError> {
    fs::read_to_string(path).map_err(|source| LevelError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write(path: &Path, contents: &str) -> Result<(), LevelError> {
    fs::write(path, contents).map_err(|source| LevelError::Io {
        path: path.to_path_buf(),
        source,
    })
}
