use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertSeverity {
    Info,
    Warning,
    Error,
}

/// Transient alert derived from the stream. At most one is live at a time;
/// a newly fired alert supersedes the previous one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketAlert {
    pub title: String,
    pub message: String,
    pub severity: AlertSeverity,
}
