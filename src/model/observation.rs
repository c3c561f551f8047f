use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::timeframe::Timeframe;

/// Sign of the last price step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Up,
    Down,
}

/// One timestamped point of the series. Immutable once appended, except for
/// the most recent point while a smoothed transition is in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub display_label: String,
    pub volume: u64,
    /// Arithmetic mean of the trailing 20 prices; `None` until 20 points exist.
    pub ma20: Option<f64>,
    /// Absolute move vs the window's anchor price; `None` when the anchor is 0.
    pub change: Option<f64>,
    /// Percentage move vs the anchor; `None` when the anchor is 0.
    pub change_percent: Option<f64>,
}

/// Read-only view of the series handed to consumers on every mutation.
/// Plain data, no behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSnapshot {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub observations: Vec<Observation>,
    pub anchor_price: f64,
    pub current_price: f64,
    pub trend: Trend,
    pub change: Option<f64>,
    pub change_percent: Option<f64>,
}

impl SeriesSnapshot {
    pub fn last(&self) -> Option<&Observation> {
        self.observations.last()
    }
}
