//! TOML configuration for rollcall.
//!
//! Layered model: compiled-in defaults, overridden by a TOML file found via
//! the `--config` flag, the `ROLLCALL_CONFIG` environment variable, or the
//! standard system location.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "ROLLCALL_CONFIG";

const SYSTEM_CONFIG_PATH: &str = "/etc/rollcall/rollcall.toml";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration for the rollcall process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RollcallConfig {
    #[serde(default)]
    pub attendance: AttendanceConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl RollcallConfig {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        info!(path = %path.display(), "loaded rollcall configuration");
        Ok(config)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve configuration in order:
    /// 1. An explicit path (the `--config` flag). Errors here are fatal.
    /// 2. The path in `ROLLCALL_CONFIG`.
    /// 3. `/etc/rollcall/rollcall.toml`.
    /// 4. Compiled-in defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(env_path);
            match Self::load(&path) {
                Ok(cfg) => return Ok(cfg),
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "ROLLCALL_CONFIG set but file could not be loaded, trying fallback"
                    );
                }
            }
        }

        let system_path = Path::new(SYSTEM_CONFIG_PATH);
        if system_path.exists() {
            match Self::load(system_path) {
                Ok(cfg) => return Ok(cfg),
                Err(e) => {
                    warn!(
                        path = %system_path.display(),
                        error = %e,
                        "system config file exists but could not be loaded, using defaults"
                    );
                }
            }
        }

        debug!("no config file found, using compiled-in defaults");
        Ok(Self::default())
    }

    /// Reject values the attendance flow cannot run with.
    pub fn validate(&self) -> Result<()> {
        let a = &self.attendance;
        if a.countdown_secs == 0 {
            anyhow::bail!("attendance.countdown_secs must be at least 1");
        }
        if !(0.0..=1.0).contains(&a.failure_threshold) {
            anyhow::bail!(
                "attendance.failure_threshold must be within [0, 1], got {}",
                a.failure_threshold
            );
        }

        let s = &self.scheduler;
        if s.min_interval_secs == 0 || s.min_interval_secs > s.max_interval_secs {
            anyhow::bail!(
                "scheduler bounds invalid: min {} max {}",
                s.min_interval_secs,
                s.max_interval_secs
            );
        }
        if !(s.min_interval_secs..=s.max_interval_secs).contains(&s.interval_secs) {
            anyhow::bail!(
                "scheduler.interval_secs {} outside [{}, {}]",
                s.interval_secs,
                s.min_interval_secs,
                s.max_interval_secs
            );
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Attendance capture
// ---------------------------------------------------------------------------

/// Timing and decision parameters of a capture session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AttendanceConfig {
    /// Seconds before verification fires on its own.
    pub countdown_secs: u32,
    /// Simulated processing time between "verify" and the decision.
    pub processing_delay_ms: u64,
    /// How long the success confirmation stays up before completion.
    pub success_hold_ms: u64,
    /// How long the failure notice stays up before the session closes.
    pub failure_hold_ms: u64,
    /// A verification draw at or below this value fails.
    pub failure_threshold: f64,
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        Self {
            countdown_secs: 10,
            processing_delay_ms: 2000,
            success_hold_ms: 1500,
            failure_hold_ms: 2000,
            failure_threshold: 0.1,
        }
    }
}

impl AttendanceConfig {
    pub fn processing_delay(&self) -> Duration {
        Duration::from_millis(self.processing_delay_ms)
    }

    pub fn success_hold(&self) -> Duration {
        Duration::from_millis(self.success_hold_ms)
    }

    pub fn failure_hold(&self) -> Duration {
        Duration::from_millis(self.failure_hold_ms)
    }
}

// ---------------------------------------------------------------------------
// Auto-trigger scheduler
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Initial interval between automatic checks.
    pub interval_secs: u64,
    pub min_interval_secs: u64,
    pub max_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            min_interval_secs: 10,
            max_interval_secs: 300,
        }
    }
}

// ---------------------------------------------------------------------------
// Video transport
// ---------------------------------------------------------------------------

/// Connection retry policy for the video transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Retries after the first failed attempt.
    pub max_retries: u32,
    pub retry_delay_secs: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_secs: 3,
        }
    }
}

impl TransportConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

// ---------------------------------------------------------------------------
// Storage / server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database holding the per-meeting attendance logs.
    pub db_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("data/rollcall.db"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}
