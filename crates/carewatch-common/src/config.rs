use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Minimum detection confidence for a label change to be accepted.
pub const CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Sessions shorter than this are kept in history but never logged.
pub const MIN_SESSION_DURATION_MS: u64 = 5_000;

/// Silence after which the open session is closed.
pub const IDLE_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self { log_level: default_log_level() }
    }
}

/// Which frames re-arm the inactivity watchdog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WatchdogReset {
    /// Every incoming frame, accepted or not, pushes the deadline out.
    #[default]
    EveryFrame,
    /// Only accepted label changes push the deadline out.
    AcceptedOnly,
}

/// Tunables for session segmentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,

    #[serde(default = "default_min_session_duration")]
    pub min_session_duration_ms: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_ms: u64,

    #[serde(default)]
    pub watchdog_reset: WatchdogReset,
}

fn default_confidence_threshold() -> f64 {
    CONFIDENCE_THRESHOLD
}

fn default_min_session_duration() -> u64 {
    MIN_SESSION_DURATION_MS
}

fn default_idle_timeout() -> u64 {
    IDLE_TIMEOUT_MS
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: CONFIDENCE_THRESHOLD,
            min_session_duration_ms: MIN_SESSION_DURATION_MS,
            idle_timeout_ms: IDLE_TIMEOUT_MS,
            watchdog_reset: WatchdogReset::default(),
        }
    }
}

impl DetectionConfig {
    pub fn min_session_duration(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.min_session_duration_ms as i64)
    }

    pub fn idle_timeout(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.idle_timeout_ms as i64)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(Error::InvalidConfig(format!(
                "confidence_threshold must be within [0, 1], got {}",
                self.confidence_threshold
            )));
        }

        if self.idle_timeout_ms == 0 {
            return Err(Error::InvalidConfig("idle_timeout_ms must be greater than zero".into()));
        }

        if self.min_session_duration_ms > i64::MAX as u64 || self.idle_timeout_ms > i64::MAX as u64
        {
            return Err(Error::InvalidConfig("durations must fit in a signed 64-bit value".into()));
        }

        Ok(())
    }
}
