use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("config error: {0}")]
    Config(String),

    #[error("historical provider error: {0}")]
    HistoricalProvider(String),

    #[error("realtime provider error: {0}")]
    RealtimeProvider(String),

    #[error("subscription closed")]
    SubscriptionClosed,
}
