pub mod alert;
pub mod observation;
pub mod timeframe;

pub use alert::{AlertSeverity, MarketAlert};
pub use observation::{Observation, SeriesSnapshot, Trend};
pub use timeframe::{Timeframe, TimeframePolicy};

/// Compact metric formatting for dashboard cards: 127400.0 -> "127.4K".
pub fn format_compact(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1e9 {
        format!("{:.1}B", value / 1e9)
    } else if abs >= 1e6 {
        format!("{:.1}M", value / 1e6)
    } else if abs >= 1e3 {
        format!("{:.1}K", value / 1e3)
    } else {
        format!("{:.1}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_tiers() {
        assert_eq!(format_compact(127_400.0), "127.4K");
        assert_eq!(format_compact(4_200_000_000.0), "4.2B");
        assert_eq!(format_compact(12_500_000.0), "12.5M");
        assert_eq!(format_compact(892.0), "892.0");
        assert_eq!(format_compact(-2_100.0), "-2.1K");
    }
}
