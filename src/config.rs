//! Application configuration (~/.daybell/config.toml).

use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{DaybellError, Result};

/// Poll cadence bounds in seconds.
pub const MIN_POLL_SECS: u64 = 5;
pub const MAX_POLL_SECS: u64 = 600;

/// Clamp a poll cadence into the supported range.
pub fn clamp_interval(secs: u64) -> u64 {
    secs.clamp(MIN_POLL_SECS, MAX_POLL_SECS)
}

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaybellConfig {
    /// Seconds between sweeps, clamped to [5, 600] wherever accepted.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Fixed lead in seconds added ahead of the target time (the poll
    /// interval is added on top at evaluation time).
    #[serde(default = "default_lead_secs")]
    pub lead_secs: u64,
    /// IANA name of the fixed target timezone.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Override for the schedules-file directory; defaults to ~/.daybell.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

fn default_poll_interval() -> u64 {
    30
}
fn default_lead_secs() -> u64 {
    300
}
fn default_timezone() -> String {
    "Asia/Seoul".into()
}

impl Default for DaybellConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            lead_secs: default_lead_secs(),
            timezone: default_timezone(),
            data_dir: None,
        }
    }
}

impl DaybellConfig {
    /// Load config from the default path; a missing or unreadable file
    /// yields defaults (startup must never fail on config).
    pub fn load() -> Self {
        let path = Self::default_path();
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("⚠️ {e}; using default config");
                Self::default()
            }
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DaybellError::Persistence(format!("read {}: {e}", path.display())))?;
        toml::from_str(&content)
            .map_err(|e| DaybellError::Validation(format!("parse {}: {e}", path.display())))
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| DaybellError::Persistence(e.to_string()))?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| DaybellError::Persistence(format!("serialize config: {e}")))?;
        std::fs::write(&path, content)
            .map_err(|e| DaybellError::Persistence(format!("write {}: {e}", path.display())))
    }

    /// Default config file path (~/.daybell/config.toml).
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// The daybell home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".daybell")
    }

    /// Directory holding the schedules file.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(Self::home_dir)
    }

    /// Parsed target timezone; unknown names warn and fall back.
    pub fn tz(&self) -> Tz {
        self.timezone.parse().unwrap_or_else(|_| {
            tracing::warn!(
                "⚠️ unknown timezone '{}', falling back to {}",
                self.timezone,
                default_timezone()
            );
            chrono_tz::Asia::Seoul
        })
    }

    /// Clamped poll cadence.
    pub fn poll_interval(&self) -> u64 {
        clamp_interval(self.poll_interval_secs)
    }
}
