//! Thin consumer used to eyeball the stream: subscribes, logs a handful of
//! ticks, switches timeframe once, and shuts down.

use anyhow::Result;
use market_sim::{
    SimConfig, StreamEvent, SubscribeConfig, TickMode, Timeframe, TimeframeScheduler,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                config
                    .logging
                    .level
                    .parse()
                    .unwrap_or_else(|_| "info".parse().unwrap())
            }),
        )
        .init();

    let scheduler = TimeframeScheduler::new(config);
    let mut subscription = scheduler.subscribe(SubscribeConfig {
        mode: TickMode::Smoothed { substeps: 10 },
        ..SubscribeConfig::new("DEMO", 250.50, Timeframe::D1)
    });

    let mut seen = 0usize;
    let mut switched = false;
    while let Some(event) = subscription.recv().await {
        match event {
            StreamEvent::Snapshot(snapshot) => {
                seen += 1;
                tracing::info!(
                    timeframe = %snapshot.timeframe,
                    points = snapshot.observations.len(),
                    price = snapshot.current_price,
                    trend = ?snapshot.trend,
                    change_pct = ?snapshot.change_percent,
                    "snapshot"
                );
                if seen == 20 && !switched {
                    switched = true;
                    subscription.change_timeframe(Timeframe::W1).await?;
                } else if seen >= 40 {
                    break;
                }
            }
            StreamEvent::Alert(alert) => {
                tracing::warn!(severity = ?alert.severity, "{}: {}", alert.title, alert.message);
            }
            StreamEvent::AlertCleared => tracing::info!("alert cleared"),
            StreamEvent::ProviderError(e) => tracing::warn!(error = %e, "provider error"),
        }
    }

    subscription.unsubscribe().await;
    Ok(())
}
