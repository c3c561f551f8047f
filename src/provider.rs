use async_trait::async_trait;

use crate::error::SimError;
use crate::model::{Observation, Timeframe};

/// Optional external source of backfill history. When supplied, its output
/// replaces the synthetic window once the fetch completes; the synthetic
/// generator keeps the stream alive in the meantime and on failure.
#[async_trait]
pub trait HistoricalDataProvider: Send + Sync {
    async fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<Vec<Observation>, SimError>;
}

/// Optional external source of single price updates, polled on its own
/// interval independent of the tick cadence.
#[async_trait]
pub trait RealtimeDataProvider: Send + Sync {
    async fn fetch_latest(&self, symbol: &str) -> Result<f64, SimError>;
}
