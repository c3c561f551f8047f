//! Synthetic market-data stream engine.
//!
//! Generates statistically plausible price/volume series for a named
//! instrument, resamples them per timeframe, and streams incremental
//! updates on a timer so a chart consumer can render a "live" feed.
//! Nothing here talks to a real exchange; the point is an internally
//! consistent, reproducible mechanism, not financial realism.
//!
//! The flow: [`scheduler::TimeframeScheduler`] maps a timeframe to its
//! [`model::TimeframePolicy`], [`series::SeriesBuilder`] backfills the
//! window, and each tick [`process::PriceProcess`] walks the price while
//! [`engine::StreamEngine`] commits the mutation and [`alert::AlertRule`]
//! watches for threshold moves. Consumers receive [`event::StreamEvent`]s
//! over a channel.

pub mod alert;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod indicator;
pub mod model;
pub mod process;
pub mod provider;
pub mod random;
pub mod scheduler;
pub mod series;

pub use config::SimConfig;
pub use engine::{StreamEngine, TickMode};
pub use error::SimError;
pub use event::StreamEvent;
pub use model::{
    AlertSeverity, MarketAlert, Observation, SeriesSnapshot, Timeframe, TimeframePolicy, Trend,
};
pub use scheduler::{ProviderSet, SubscribeConfig, Subscription, TimeframeScheduler};
