//! Runtime configuration.
//!
//! Loaded from TOML, then overridden from the environment:
//!
//! | variable                     | field               |
//! |------------------------------|---------------------|
//! | `TAXONOMY_DATA_DIR`          | `data_dir`          |
//! | `TAXONOMY_KIND`              | `taxonomy`          |
//! | `TAXONOMY_CHECK_CYCLES`      | `check_cycles`      |
//! | `TAXONOMY_SNAPSHOT_INTERVAL` | `snapshot_interval` |
//! | `TAXONOMY_LOG_LEVEL`         | `log_level`         |

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use taxonomy_engine::{GraphConfig, TaxonomyKind};

use crate::error::{Result, RuntimeError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Root directory; each pipeline gets `<data_dir>/<name>/`.
    pub data_dir: PathBuf,
    pub taxonomy: TaxonomyKind,
    pub check_cycles: bool,
    /// Snapshot every N committed events. 0 disables snapshots.
    pub snapshot_interval: u64,
    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            taxonomy: TaxonomyKind::default(),
            check_cycles: true,
            snapshot_interval: 1000,
            log_level: "info".to_string(),
        }
    }
}

impl RuntimeConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            RuntimeError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| RuntimeError::Config(e.to_string()))
    }

    /// Apply `TAXONOMY_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup. Unset keys leave the
    /// field untouched; unparsable values are errors.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("TAXONOMY_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(kind) = lookup("TAXONOMY_KIND") {
            self.taxonomy = kind.parse().map_err(RuntimeError::Config)?;
        }
        if let Some(flag) = lookup("TAXONOMY_CHECK_CYCLES") {
            self.check_cycles = parse_bool(&flag).ok_or_else(|| {
                RuntimeError::Config(format!("TAXONOMY_CHECK_CYCLES: not a boolean: {}", flag))
            })?;
        }
        if let Some(interval) = lookup("TAXONOMY_SNAPSHOT_INTERVAL") {
            self.snapshot_interval = interval.trim().parse().map_err(|e| {
                RuntimeError::Config(format!("TAXONOMY_SNAPSHOT_INTERVAL: {}", e))
            })?;
        }
        if let Some(level) = lookup("TAXONOMY_LOG_LEVEL") {
            self.log_level = level;
        }
        Ok(())
    }

    pub fn graph_config(&self) -> GraphConfig {
        GraphConfig {
            check_cycles: self.check_cycles,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
