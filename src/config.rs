use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::Level;

use crate::engine::narrative::Phrasing;
use crate::engine::simulation::SimOptions;
use crate::error::Result;

/// Runtime settings read from `labsim.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Event poll interval; 16 ms is roughly 60 frames a second.
    pub tick_rate_ms: u64,
    pub seed: u64,
    pub phrasing: Phrasing,
    pub default_speed: f64,
    pub max_step_secs: f64,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub file: PathBuf,
    pub level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tick_rate_ms: 16,
            seed: 42,
            phrasing: Phrasing::Varied,
            default_speed: 1.0,
            max_step_secs: 0.25,
            log: LogSettings::default(),
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self { file: PathBuf::from("labsim.log"), level: "info".to_string() }
    }
}

impl LogSettings {
    /// `None` when `level` names no tracing level.
    pub fn max_level(&self) -> Option<Level> {
        self.level.trim().parse().ok()
    }
}

impl Settings {
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        if !path.as_ref().exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let settings: Self = toml::from_str(&content)?;
        Ok(settings)
    }

    pub fn sim_options(&self) -> SimOptions {
        SimOptions {
            seed: self.seed,
            phrasing: self.phrasing,
            speed: self.default_speed,
            max_step: self.max_step_secs,
        }
    }
}
