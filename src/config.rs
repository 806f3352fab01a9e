use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::PranaError;

/// Top-level configuration. Every component reads what it needs once, at
/// construction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PranaConfig {
    /// Kill switch: every component becomes an inert no-op.
    pub disabled: bool,
    /// Emission window. Must be a positive multiple of 100ms.
    pub window_ms: u64,
    pub accounting_ms: u64,
    pub signal_tick_ms: u64,
    pub classifier_tick_ms: u64,
    pub system_type: String,
    pub role: String,
    pub classifier: ClassifierConfig,
    pub delivery: DeliveryConfig,
}

impl Default for PranaConfig {
    fn default() -> Self {
        Self {
            disabled: false,
            window_ms: 5_000,
            accounting_ms: 100,
            signal_tick_ms: 1_000,
            classifier_tick_ms: 1_000,
            system_type: "SCHOOL".to_string(),
            role: "STUDENT".to_string(),
            classifier: ClassifierConfig::default(),
            delivery: DeliveryConfig::default(),
        }
    }
}

/// Thresholds for the rule list. Velocities are px/s, durations ms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub cooldown_ms: u64,
    pub idle_threshold_ms: u64,
    pub off_task_velocity: f64,
    pub rapid_click_threshold: u32,
    pub deep_focus_min_dwell_ms: u64,
    pub deep_focus_max_velocity: f64,
    pub deep_focus_max_inactivity_ms: u64,
    pub deep_focus_sustain_ms: u64,
    pub thinking_max_velocity: f64,
    pub thinking_min_inactivity_ms: u64,
    pub thinking_max_inactivity_ms: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: 5_000,
            idle_threshold_ms: 600_000,
            off_task_velocity: 2_000.0,
            rapid_click_threshold: 3,
            deep_focus_min_dwell_ms: 60_000,
            deep_focus_max_velocity: 200.0,
            deep_focus_max_inactivity_ms: 30_000,
            deep_focus_sustain_ms: 15_000,
            thinking_max_velocity: 200.0,
            thinking_min_inactivity_ms: 3_000,
            thinking_max_inactivity_ms: 60_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    pub endpoint: String,
    pub batch_size: usize,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub send_timeout_ms: u64,
    /// Offline entries kept on every persist (most recent wins).
    pub offline_cap: usize,
    pub sweep_interval_ms: u64,
    pub storage_key: String,
    pub store_path: PathBuf,
    /// Connectivity assumed at construction, until the host reports otherwise.
    pub start_online: bool,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000/api/prana/ingest".to_string(),
            batch_size: 5,
            max_retries: 3,
            backoff_base_ms: 1_000,
            send_timeout_ms: 10_000,
            offline_cap: 100,
            sweep_interval_ms: 30_000,
            storage_key: "prana_offline_queue".to_string(),
            store_path: PathBuf::from(".prana"),
            start_online: true,
        }
    }
}

impl PranaConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, PranaError> {
        let content = std::fs::read_to_string(path)?;
        let config: PranaConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Overlay `PRANA_*` environment variables. Unparseable values are
    /// ignored with a warning.
    pub fn apply_env(mut self) -> Self {
        self.apply_vars(|key| std::env::var(key).ok());
        self
    }

    fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(raw) = lookup("PRANA_DISABLED") {
            match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.disabled = true,
                "0" | "false" | "no" | "off" => self.disabled = false,
                other => warn!(value = other, "ignoring unparseable PRANA_DISABLED"),
            }
        }
        if let Some(endpoint) = lookup("PRANA_ENDPOINT") {
            self.delivery.endpoint = endpoint;
        }
        if let Some(raw) = lookup("PRANA_WINDOW_MS") {
            match raw.trim().parse::<u64>() {
                Ok(ms) => self.window_ms = ms,
                Err(err) => warn!(error = %err, "ignoring unparseable PRANA_WINDOW_MS"),
            }
        }
        if let Some(system_type) = lookup("PRANA_SYSTEM_TYPE") {
            self.system_type = system_type;
        }
        if let Some(role) = lookup("PRANA_ROLE") {
            self.role = role;
        }
    }

    pub fn validate(&self) -> Result<(), PranaError> {
        if self.window_ms == 0 || self.window_ms % 100 != 0 {
            return Err(PranaError::InvalidConfig(format!(
                "window_ms must be a positive multiple of 100, got {}",
                self.window_ms
            )));
        }
        if self.accounting_ms == 0 || self.signal_tick_ms == 0 || self.classifier_tick_ms == 0 {
            return Err(PranaError::InvalidConfig("tick periods must be non-zero".to_string()));
        }
        if self.delivery.batch_size == 0 {
            return Err(PranaError::InvalidConfig("delivery.batch_size must be non-zero".to_string()));
        }
        if self.delivery.offline_cap == 0 {
            return Err(PranaError::InvalidConfig("delivery.offline_cap must be non-zero".to_string()));
        }
        Ok(())
    }
}
