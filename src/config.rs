// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Client configuration.
//!
//! Precedence (highest to lowest):
//! 1. Environment variables (`FINTRACK_*`)
//! 2. Config file (`./fintrack.toml`, then the platform config dir)
//! 3. Default values

use crate::db::APP;
use crate::error::{ClientError, ClientResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api: ApiConfig,
    pub cache: CacheConfig,
    pub guard: GuardConfig,
    pub storage: StorageConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the finance API
    pub base_url: String,
    /// Transport timeout in milliseconds; expiry surfaces as a network error
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://finance-zgvt.onrender.com".to_string(),
            timeout_ms: 15_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Age after which a cached response is served as stale
    pub stale_after_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_after_secs: 5 * 60,
        }
    }
}

impl CacheConfig {
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Reject expense/saving creation locally when the cached balance is short
    pub enforce_balance_check: bool,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            enforce_balance_check: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite file holding the session; the platform data dir when unset
    pub db_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl ClientConfig {
    pub fn load() -> ClientResult<Self> {
        Self::load_from(None)
    }

    /// Like `load`, but an explicit file replaces the search.
    pub fn load_from(explicit: Option<&Path>) -> ClientResult<Self> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(Self::find_config_file);
        let mut config = match path {
            Some(path) => {
                debug!(path = %path.display(), "Loading config file");
                Self::load_from_file(&path)?
            }
            None => Self::default(),
        };
        config.apply_env_overrides();
        debug!(?config, "Loaded client configuration");
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> ClientResult<Self> {
        toml::from_str(content)
            .map_err(|e| ClientError::Config(format!("failed to parse config: {}", e)))
    }

    fn find_config_file() -> Option<PathBuf> {
        let local = PathBuf::from("./fintrack.toml");
        if local.is_file() {
            return Some(local);
        }
        let proj = ProjectDirs::from(APP.0, APP.1, APP.2)?;
        let path = proj.config_dir().join("config.toml");
        path.is_file().then_some(path)
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    pub(crate) fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("FINTRACK_API_URL") {
            self.api.base_url = url;
        }
        if let Some(ms) = var("FINTRACK_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.api.timeout_ms = ms;
        }
        if let Some(secs) = var("FINTRACK_STALE_AFTER_SECS").and_then(|v| v.parse().ok()) {
            self.cache.stale_after_secs = secs;
        }
        if let Some(flag) = var("FINTRACK_ENFORCE_BALANCE_CHECK").and_then(|v| v.parse().ok()) {
            self.guard.enforce_balance_check = flag;
        }
        if let Some(path) = var("FINTRACK_DB_PATH") {
            self.storage.db_path = Some(PathBuf::from(path));
        }
        if let Some(level) = var("FINTRACK_LOG") {
            self.log.level = level;
        }
    }
}
