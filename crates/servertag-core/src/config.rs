//! Server configuration loaded from layered TOML files
//!
//! Files are read from least to most specific; a key set in a later file
//! overrides the same key from an earlier one.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::{Result, ServerTagError};
use crate::logging_facility::Profile;

pub const DEFAULT_HISTORY_PAGE_SIZE: usize = 50;
pub const DEFAULT_MAX_CONFLICT_RETRIES: u32 = 3;

const SYSTEM_CONFIG_PATH: &str = "/etc/servertag/server.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address of the backing document store
    pub db_server: String,
    /// Number of most-recent history events the history view returns
    pub history_page_size: usize,
    pub max_conflict_retries: u32,
    pub log_profile: Profile,
}

// One file's worth of settings, every key optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PartialServerConfig {
    db_server: Option<String>,
    history_page_size: Option<usize>,
    max_conflict_retries: Option<u32>,
    log_profile: Option<Profile>,
}

impl PartialServerConfig {
    fn parse(contents: &str, origin: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| ServerTagError::InvalidConfig {
            reason: format!("failed to parse {origin}: {e}"),
        })
    }

    /// Overlay `other` on top of `self`
    fn merge(self, other: Self) -> Self {
        Self {
            db_server: other.db_server.or(self.db_server),
            history_page_size: other.history_page_size.or(self.history_page_size),
            max_conflict_retries: other.max_conflict_retries.or(self.max_conflict_retries),
            log_profile: other.log_profile.or(self.log_profile),
        }
    }

    fn finish(self) -> Result<ServerConfig> {
        let db_server = self
            .db_server
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ServerTagError::InvalidConfig {
                reason: "db_server is required".to_string(),
            })?;

        let history_page_size = self.history_page_size.unwrap_or(DEFAULT_HISTORY_PAGE_SIZE);
        if history_page_size == 0 {
            return Err(ServerTagError::InvalidConfig {
                reason: "history_page_size must be at least 1".to_string(),
            });
        }

        Ok(ServerConfig {
            db_server,
            history_page_size,
            max_conflict_retries: self
                .max_conflict_retries
                .unwrap_or(DEFAULT_MAX_CONFLICT_RETRIES),
            log_profile: self.log_profile.unwrap_or_default(),
        })
    }
}

impl ServerConfig {
    /// System-wide file, then the per-user file under `$HOME`
    pub fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(SYSTEM_CONFIG_PATH)];
        if let Some(home) = std::env::var_os("HOME") {
            paths.push(Path::new(&home).join(".servertag").join("server.toml"));
        }
        paths
    }

    /// Load and merge the default paths
    ///
    /// # Errors
    /// See [`ServerConfig::load_from_paths`]
    pub fn load() -> Result<Self> {
        Self::load_from_paths(&Self::default_paths())
    }

    /// Merge every existing file in `paths`, later files winning
    ///
    /// Paths that do not exist are skipped.
    ///
    /// # Errors
    /// * `Io` - If an existing file cannot be read
    /// * `InvalidConfig` - If a file is not valid TOML, has unknown keys, or
    ///   the merged result lacks `db_server`
    pub fn load_from_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut merged = PartialServerConfig::default();
        for path in paths {
            let path = path.as_ref();
            if !path.is_file() {
                tracing::debug!(path = %path.display(), "config file not present");
                continue;
            }

            let contents = fs::read_to_string(path).map_err(|e| ServerTagError::Io {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
            let layer = PartialServerConfig::parse(&contents, &path.display().to_string())?;
            tracing::debug!(path = %path.display(), "loaded config file");
            merged = merged.merge(layer);
        }
        merged.finish()
    }

    /// Parse a single TOML document
    ///
    /// # Errors
    /// * `InvalidConfig` - If the document is malformed or lacks `db_server`
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        PartialServerConfig::parse(contents, "config")?.finish()
    }
}
