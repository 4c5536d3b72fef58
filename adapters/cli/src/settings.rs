use std::{fs, path::Path};

use anyhow::{Context, Result};
use belt_blast_core::StageConfig;
use serde::Deserialize;

/// Defaults applied when the settings file omits the autoplay table.
const DEFAULT_SEED: u64 = 0x5eed_b1a5_7000_0001;
const DEFAULT_BELT_LIMIT: usize = 2;
const DEFAULT_FRAME_MS: u64 = 16;
const DEFAULT_MAX_SECONDS: u64 = 600;

/// Autoplay parameters read from the settings file.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub(crate) struct AutoplaySettings {
    /// Seed of the column-picking RNG.
    pub(crate) seed: u64,
    /// Maximum number of shooters out on the belt at once.
    pub(crate) belt_limit: usize,
    /// Simulated milliseconds per frame.
    pub(crate) frame_ms: u64,
    /// Simulated seconds after which a level is abandoned.
    pub(crate) max_seconds: u64,
}

impl Default for AutoplaySettings {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            belt_limit: DEFAULT_BELT_LIMIT,
            frame_ms: DEFAULT_FRAME_MS,
            max_seconds: DEFAULT_MAX_SECONDS,
        }
    }
}

/// Contents of the optional TOML settings file.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    /// Stage parameters handed to the session.
    pub(crate) stage: StageConfig,
    /// Autoplay parameters.
    pub(crate) autoplay: AutoplaySettings,
}

impl Settings {
    /// Reads the settings file, or returns defaults when no path is given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to parse settings file {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        let settings: Self = toml::from_str(contents)?;
        settings.stage.validate()?;
        Ok(settings)
    }
}
