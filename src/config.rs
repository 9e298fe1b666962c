use anyhow::{Context, Result};
use fleetkit::PoolOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::paths;

/// Settings read from `config.toml`; every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Worker count (default: twice the available parallelism)
    pub jobs: Option<usize>,
    /// Pause between worker launches, in milliseconds
    pub stagger_ms: u64,
    /// How long an idle worker waits for the queue, in seconds
    pub dequeue_timeout_secs: u64,
    /// Directory receiving one `<hostname>.txt` per host
    pub log_dir: String,
    /// Provisioning tool invoked as `<tool> bootstrap ...`
    pub tool: String,
    /// Pass `--sudo` to the bootstrap
    pub sudo: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            jobs: None,
            stagger_ms: 50,
            dequeue_timeout_secs: 2,
            log_dir: "./logs".to_string(),
            tool: "knife".to_string(),
            sudo: true,
        }
    }
}

impl Config {
    /// Load config from an explicit path, or the default location if present.
    ///
    /// An explicit path must exist; a missing default file means defaults.
    pub fn load(explicit: Option<&str>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(&paths::expand(path));
        }

        let path = paths::config_file()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            log::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid config format in {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Pool options, with `jobs` from the command line taking precedence.
    pub fn pool_options(&self, jobs: Option<usize>) -> PoolOptions {
        PoolOptions {
            jobs: jobs.or(self.jobs),
            stagger: Duration::from_millis(self.stagger_ms),
            dequeue_timeout: Duration::from_secs(self.dequeue_timeout_secs),
        }
    }

    /// Expanded log directory, with the command line taking precedence.
    pub fn log_dir(&self, cli_override: Option<&str>) -> PathBuf {
        paths::expand(cli_override.unwrap_or(&self.log_dir))
    }
}
