//! Saved user preferences: endpoint URL and display name.
//!
//! Stored as JSON under the user config dir, or wherever `BEACON_PREFS` points.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const PREFS_ENV: &str = "BEACON_PREFS";

#[derive(Debug, thiserror::Error)]
pub enum PrefsError {
    #[error("no config directory available; set {PREFS_ENV}")]
    NoConfigDir,

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path} is not a valid preferences file: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Prefs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// `BEACON_PREFS`, else `<config dir>/beacon/prefs.json`.
pub fn default_path() -> Result<PathBuf, PrefsError> {
    if let Some(path) = std::env::var_os(PREFS_ENV).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    dirs::config_dir()
        .map(|dir| dir.join("beacon").join("prefs.json"))
        .ok_or(PrefsError::NoConfigDir)
}

impl Prefs {
    /// A missing file reads as empty preferences.
    pub fn load(path: &Path) -> Result<Self, PrefsError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(PrefsError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        serde_json::from_str(&raw).map_err(|source| PrefsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), PrefsError> {
        let io_err = |source| PrefsError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| PrefsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(io_err)
    }
}
