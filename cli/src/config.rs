//! # Configuration
//!
//! Server address and auth token, stored as YAML:
//!
//! ```yaml
//! url: https://notes.example.com
//! token: 3BzV9bLl6P1w_Mn...
//! timeout_secs: 30   # optional
//! ```
//!
//! The file is looked up in priority order:
//! 1. `--config <file>`
//! 2. `TRNOTES_CONFIG` environment variable (handled by clap)
//! 3. `<user config dir>/trnotes/config.yaml` (via the `directories` crate)

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use trnotes_core::ClientOptions;

const CONFIG_FILE: &str = "config.yaml";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub url: String,
    pub token: String,
    /// Per-request timeout; the client default applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Config {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            timeout_secs: None,
        }
    }

    pub fn client_options(&self) -> ClientOptions {
        match self.timeout_secs {
            Some(secs) => ClientOptions {
                timeout: Duration::from_secs(secs),
                ..ClientOptions::default()
            },
            None => ClientOptions::default(),
        }
    }

    /// Read the config at `path`. A missing file is `Ok(None)`.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("error reading config {}", path.display()))
            }
        };
        let config: Self = serde_yaml::from_str(&raw)
            .with_context(|| format!("error parsing config {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(Some(config))
    }

    fn validate(&self) -> Result<()> {
        if self.timeout_secs == Some(0) {
            bail!("timeout_secs must be at least 1");
        }
        Ok(())
    }

    /// Write the config, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("error creating {}", parent.display()))?;
        }
        let raw = serde_yaml::to_string(self).context("error serializing config")?;
        fs::write(path, raw).with_context(|| format!("error saving config {}", path.display()))
    }
}

/// The explicit path if given, otherwise the per-user default.
pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => default_path(),
    }
}

pub fn default_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "trnotes")
        .context("could not determine the user config directory")?;
    Ok(dirs.config_dir().join(CONFIG_FILE))
}
