use crate::model::{MarketAlert, SeriesSnapshot};

/// What a subscription delivers to its consumer. One `Snapshot` per series
/// mutation; alert events carry the live alert lifecycle.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    Snapshot(SeriesSnapshot),
    Alert(MarketAlert),
    AlertCleared,
    /// An external data provider call failed. The stream keeps running on
    /// synthetic data; this is informational.
    ProviderError(String),
}
