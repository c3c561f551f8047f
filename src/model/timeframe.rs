use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Named viewing window. Determines sampling resolution, retained history
/// length, and the volatility profile of the synthetic walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1D")]
    D1,
    #[serde(rename = "1W")]
    W1,
    #[serde(rename = "1M")]
    M1,
    #[serde(rename = "3M")]
    M3,
    #[serde(rename = "1Y")]
    Y1,
    #[serde(rename = "5Y")]
    Y5,
}

impl Timeframe {
    pub const ALL: [Timeframe; 6] = [
        Timeframe::D1,
        Timeframe::W1,
        Timeframe::M1,
        Timeframe::M3,
        Timeframe::Y1,
        Timeframe::Y5,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::D1 => "1D",
            Timeframe::W1 => "1W",
            Timeframe::M1 => "1M",
            Timeframe::M3 => "3M",
            Timeframe::Y1 => "1Y",
            Timeframe::Y5 => "5Y",
        }
    }

    /// Format a timestamp at the granularity tier of this timeframe:
    /// hour:minute for 1D, weekday+month+day for 1W, month+day for 1M,
    /// month+year for 3M/1Y, year only for 5Y.
    pub fn format_label(&self, ts: DateTime<Utc>) -> String {
        let fmt = match self {
            Timeframe::D1 => "%H:%M",
            Timeframe::W1 => "%a %b %-d",
            Timeframe::M1 => "%b %-d",
            Timeframe::M3 | Timeframe::Y1 => "%b %Y",
            Timeframe::Y5 => "%Y",
        };
        ts.format(fmt).to_string()
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Timeframe {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Timeframe::ALL
            .iter()
            .copied()
            .find(|tf| tf.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SimError::Config(format!("unknown timeframe '{}'", s)))
    }
}

/// Static tuning knobs for one timeframe. This is configuration, not derived
/// state; the defaults below are the canonical table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeframePolicy {
    pub retained_points: usize,
    pub sample_interval_minutes: i64,
    pub tick_interval_ms: u64,
    pub volatility: f64,
    pub mean_reversion: f64,
}

impl TimeframePolicy {
    pub fn defaults_for(timeframe: Timeframe) -> Self {
        let (retained_points, sample_interval_minutes, volatility, mean_reversion) =
            match timeframe {
                Timeframe::D1 => (24, 60, 0.020, 0.05),
                Timeframe::W1 => (7, 1_440, 0.030, 0.06),
                Timeframe::M1 => (30, 1_440, 0.035, 0.08),
                Timeframe::M3 => (90, 1_440, 0.040, 0.10),
                Timeframe::Y1 => (365, 1_440, 0.050, 0.12),
                Timeframe::Y5 => (60, 43_200, 0.060, 0.15),
            };
        Self {
            retained_points,
            sample_interval_minutes,
            tick_interval_ms: 2_000,
            volatility,
            mean_reversion,
        }
    }

    pub fn sample_interval(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.sample_interval_minutes)
    }

    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_interval_ms)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if self.retained_points == 0 {
            return Err(SimError::Config("retained_points must be > 0".to_string()));
        }
        if self.sample_interval_minutes <= 0 {
            return Err(SimError::Config(
                "sample_interval_minutes must be > 0".to_string(),
            ));
        }
        if self.tick_interval_ms == 0 {
            return Err(SimError::Config("tick_interval_ms must be > 0".to_string()));
        }
        if !(self.volatility > 0.0) || !self.volatility.is_finite() {
            return Err(SimError::Config("volatility must be > 0".to_string()));
        }
        if !(0.0..1.0).contains(&self.mean_reversion) {
            return Err(SimError::Config(
                "mean_reversion must be in [0, 1)".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn labels_round_trip() {
        for tf in Timeframe::ALL {
            assert_eq!(tf.label().parse::<Timeframe>().unwrap(), tf);
        }
        assert!("2H".parse::<Timeframe>().is_err());
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("1d".parse::<Timeframe>().unwrap(), Timeframe::D1);
        assert_eq!(" 5y ".parse::<Timeframe>().unwrap(), Timeframe::Y5);
    }

    #[test]
    fn default_policies_are_valid() {
        for tf in Timeframe::ALL {
            TimeframePolicy::defaults_for(tf).validate().unwrap();
        }
    }

    #[test]
    fn daily_window_is_hourly() {
        let p = TimeframePolicy::defaults_for(Timeframe::D1);
        assert_eq!(p.retained_points, 24);
        assert_eq!(p.sample_interval_minutes, 60);
        assert_eq!(p.tick_interval_ms, 2_000);
    }

    #[test]
    fn label_tiers() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 7, 14, 5, 0).unwrap();
        assert_eq!(Timeframe::D1.format_label(ts), "14:05");
        assert_eq!(Timeframe::W1.format_label(ts), "Thu Mar 7");
        assert_eq!(Timeframe::M1.format_label(ts), "Mar 7");
        assert_eq!(Timeframe::M3.format_label(ts), "Mar 2024");
        assert_eq!(Timeframe::Y5.format_label(ts), "2024");
    }

    #[test]
    fn validate_rejects_bad_policies() {
        let mut p = TimeframePolicy::defaults_for(Timeframe::D1);
        p.mean_reversion = 1.0;
        assert!(p.validate().is_err());

        let mut p = TimeframePolicy::defaults_for(Timeframe::D1);
        p.retained_points = 0;
        assert!(p.validate().is_err());

        let mut p = TimeframePolicy::defaults_for(Timeframe::D1);
        p.volatility = 0.0;
        assert!(p.validate().is_err());
    }
}
