use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};

use crate::presence::LYING_GAP_THRESHOLD;

pub const CONFIG_PATH_ENV: &str = "CAREWATCH_CONFIG";
pub const DEBUG_ENV: &str = "CAREWATCH_DEBUG";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    /// Shoulder-to-hip vertical gap below which a torso counts as horizontal.
    pub lying_gap_threshold: f64,
    /// Time without a face sighting before the missing-user alert fires.
    pub absence_threshold_secs: u64,
    pub monitor_interval_secs: u64,
    /// Sensor readings closer than this force `Stop`.
    pub proximity_stop_cm: f64,
    pub live_view_interval_ms: u64,
    pub detector_timeout_ms: u64,
    pub hardware_interval_ms: u64,
    pub alert_recipient: Option<String>,
    pub sleep_mode: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            lying_gap_threshold: LYING_GAP_THRESHOLD,
            absence_threshold_secs: 20 * 60,
            monitor_interval_secs: 60,
            proximity_stop_cm: 15.0,
            live_view_interval_ms: 50,
            detector_timeout_ms: 2_000,
            hardware_interval_ms: 100,
            alert_recipient: None,
            sleep_mode: false,
        }
    }
}

impl ServiceConfig {
    /// Loads from `$CAREWATCH_CONFIG` when set, defaults otherwise. `CAREWATCH_DEBUG`
    /// shortens the monitor interval to one second.
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::load(Path::new(&path))?,
            Err(_) => Self::default(),
        };

        let debug_mode = std::env::var(DEBUG_ENV)
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        if debug_mode {
            config.monitor_interval_secs = 1;
        }

        Ok(config)
    }

    /// Missing file means defaults; a file that exists but cannot be parsed is logged
    /// and replaced by defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        Ok(serde_json::from_str(&contents).unwrap_or_else(|err| {
            warn!("ignoring malformed config {}: {err}", path.display());
            Self::default()
        }))
    }

    pub fn absence_threshold(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.absence_threshold_secs.min(u64::from(u32::MAX)) as i64)
    }

    pub fn monitor_interval(&self) -> Duration {
        Duration::from_secs(self.monitor_interval_secs.max(1))
    }

    pub fn live_view_interval(&self) -> Duration {
        Duration::from_millis(self.live_view_interval_ms.max(1))
    }

    pub fn detector_timeout(&self) -> Duration {
        Duration::from_millis(self.detector_timeout_ms)
    }

    pub fn hardware_interval(&self) -> Duration {
        Duration::from_millis(self.hardware_interval_ms.max(1))
    }
}
