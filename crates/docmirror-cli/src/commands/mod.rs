//! CLI command implementations

pub mod config;
pub mod sync;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use docmirror_core::config::Config;

/// Where the configuration is read from
#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub path: PathBuf,
    /// True if the path came from `--config`
    pub explicit: bool,
}

impl ConfigSource {
    pub fn resolve(cli_path: Option<PathBuf>) -> Self {
        match cli_path {
            Some(path) => Self {
                path,
                explicit: true,
            },
            None => Self {
                path: Config::default_path(),
                explicit: false,
            },
        }
    }

    /// Load strictly: a file that exists must parse, and an explicit path must exist
    pub fn load(&self) -> Result<Config> {
        load_config(&self.path, self.explicit)
    }
}

fn load_config(path: &Path, explicit: bool) -> Result<Config> {
    if path.exists() {
        return Config::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()));
    }
    if explicit {
        anyhow::bail!("Configuration file not found: {}", path.display());
    }
    Ok(Config::default())
}
