use crate::model::{AlertSeverity, MarketAlert};

/// Fires when the price has moved more than `threshold_percent` from the
/// window's anchor. Upward moves are informational, downward moves warn.
#[derive(Debug, Clone, Copy)]
pub struct AlertRule {
    threshold_percent: f64,
}

impl AlertRule {
    pub fn new(threshold_percent: f64) -> Self {
        assert!(
            threshold_percent > 0.0,
            "alert threshold must be > 0"
        );
        Self { threshold_percent }
    }

    pub fn evaluate(&self, previous_anchor: f64, new_price: f64) -> Option<MarketAlert> {
        if previous_anchor <= 0.0 {
            return None;
        }
        let percent = (new_price - previous_anchor) / previous_anchor * 100.0;
        if percent.abs() <= self.threshold_percent {
            return None;
        }
        let (title, severity) = if percent > 0.0 {
            ("Price spike", AlertSeverity::Info)
        } else {
            ("Price drop", AlertSeverity::Warning)
        };
        Some(MarketAlert {
            title: title.to_string(),
            message: format!(
                "Price moved {:+.2}% from anchor {:.2}",
                percent, previous_anchor
            ),
            severity,
        })
    }
}
