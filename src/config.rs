use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{Timeframe, TimeframePolicy};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub alert: AlertConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Per-timeframe overrides of the built-in policy table, keyed by the
    /// timeframe label ("1D", "1W", ...). Unset fields keep their defaults.
    #[serde(default)]
    pub policies: HashMap<String, PolicyOverride>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    #[serde(default = "default_volume_cap")]
    pub volume_cap: u64,
    /// Pause between cancelling the old timer and rebuilding on a
    /// timeframe switch, to let a UI transition settle.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
    #[serde(default = "default_realtime_poll_ms")]
    pub realtime_poll_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlertConfig {
    #[serde(default = "default_alert_threshold")]
    pub threshold_percent: f64,
    #[serde(default = "default_alert_display_ms")]
    pub display_duration_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PolicyOverride {
    pub retained_points: Option<usize>,
    pub sample_interval_minutes: Option<i64>,
    pub tick_interval_ms: Option<u64>,
    pub volatility: Option<f64>,
    pub mean_reversion: Option<f64>,
}

impl PolicyOverride {
    fn apply(&self, mut policy: TimeframePolicy) -> TimeframePolicy {
        if let Some(v) = self.retained_points {
            policy.retained_points = v;
        }
        if let Some(v) = self.sample_interval_minutes {
            policy.sample_interval_minutes = v;
        }
        if let Some(v) = self.tick_interval_ms {
            policy.tick_interval_ms = v;
        }
        if let Some(v) = self.volatility {
            policy.volatility = v;
        }
        if let Some(v) = self.mean_reversion {
            policy.mean_reversion = v;
        }
        policy
    }
}

fn default_volume_cap() -> u64 {
    1_000_000
}

fn default_settle_delay_ms() -> u64 {
    300
}

fn default_event_channel_capacity() -> usize {
    64
}

fn default_realtime_poll_ms() -> u64 {
    1_000
}

fn default_alert_threshold() -> f64 {
    5.0
}

fn default_alert_display_ms() -> u64 {
    5_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            volume_cap: default_volume_cap(),
            settle_delay_ms: default_settle_delay_ms(),
            event_channel_capacity: default_event_channel_capacity(),
            realtime_poll_ms: default_realtime_poll_ms(),
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            threshold_percent: default_alert_threshold(),
            display_duration_ms: default_alert_display_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl SimConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let payload = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&payload)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn from_toml_str(payload: &str) -> Result<Self> {
        let config: SimConfig = toml::from_str(payload).context("invalid TOML")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.stream.volume_cap == 0 {
            anyhow::bail!("stream.volume_cap must be > 0");
        }
        if self.stream.event_channel_capacity == 0 {
            anyhow::bail!("stream.event_channel_capacity must be > 0");
        }
        if self.stream.realtime_poll_ms == 0 {
            anyhow::bail!("stream.realtime_poll_ms must be > 0");
        }
        if !(self.alert.threshold_percent > 0.0) {
            anyhow::bail!("alert.threshold_percent must be > 0");
        }
        if self.alert.display_duration_ms == 0 {
            anyhow::bail!("alert.display_duration_ms must be > 0");
        }
        for (label, over) in &self.policies {
            let timeframe: Timeframe = label
                .parse()
                .map_err(|e| anyhow::anyhow!("policies.{}: {}", label, e))?;
            over.apply(TimeframePolicy::defaults_for(timeframe))
                .validate()
                .map_err(|e| anyhow::anyhow!("policies.{}: {}", label, e))?;
        }
        Ok(())
    }

    /// Effective policy for a timeframe: built-in table plus any override.
    pub fn policy_for(&self, timeframe: Timeframe) -> TimeframePolicy {
        let defaults = TimeframePolicy::defaults_for(timeframe);
        match self.policies.get(timeframe.label()) {
            Some(over) => over.apply(defaults),
            None => defaults,
        }
    }
}
