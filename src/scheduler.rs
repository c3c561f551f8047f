use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, sleep_until, Duration, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::SimConfig;
use crate::engine::{EngineConfig, StreamEngine, TickMode, TickOutcome, Transition};
use crate::error::SimError;
use crate::event::StreamEvent;
use crate::model::{MarketAlert, Observation, Timeframe, TimeframePolicy};
use crate::provider::{HistoricalDataProvider, RealtimeDataProvider};
use crate::random::{RandomSource, SeededRandom, ThreadRandom};

#[derive(Debug, Clone)]
pub struct SubscribeConfig {
    pub symbol: String,
    pub initial_price: f64,
    pub timeframe: Timeframe,
    pub mode: TickMode,
    /// Seeds the generator for a reproducible stream; `None` uses the
    /// thread-local RNG.
    pub seed: Option<u64>,
}

impl SubscribeConfig {
    pub fn new(symbol: impl Into<String>, initial_price: f64, timeframe: Timeframe) -> Self {
        Self {
            symbol: symbol.into(),
            initial_price,
            timeframe,
            mode: TickMode::default(),
            seed: None,
        }
    }
}

/// Optional external data sources for a subscription.
#[derive(Clone, Default)]
pub struct ProviderSet {
    pub historical: Option<Arc<dyn HistoricalDataProvider>>,
    pub realtime: Option<Arc<dyn RealtimeDataProvider>>,
}

enum Command {
    ChangeTimeframe(Timeframe),
    Stop,
}

enum ProviderUpdate {
    Historical(Timeframe, Result<Vec<Observation>, SimError>),
    Realtime(Result<f64, SimError>),
}

/// Maps timeframes to policies and spawns subscription actors that own all
/// timers for their stream.
#[derive(Debug, Clone)]
pub struct TimeframeScheduler {
    config: SimConfig,
}

impl TimeframeScheduler {
    pub fn new(config: SimConfig) -> Self {
        Self { config }
    }

    /// Pure lookup into the policy table (built-in defaults + config
    /// overrides).
    pub fn policy_for(&self, timeframe: Timeframe) -> TimeframePolicy {
        self.config.policy_for(timeframe)
    }

    pub fn subscribe(&self, config: SubscribeConfig) -> Subscription {
        self.subscribe_with_providers(config, ProviderSet::default())
    }

    /// Start a subscription. Must be called within a tokio runtime; the
    /// returned handle owns the actor task.
    pub fn subscribe_with_providers(
        &self,
        config: SubscribeConfig,
        providers: ProviderSet,
    ) -> Subscription {
        let policy = self.policy_for(config.timeframe);
        let rng: Box<dyn RandomSource> = match config.seed {
            Some(seed) => Box::new(SeededRandom::new(seed)),
            None => Box::new(ThreadRandom),
        };
        let engine = StreamEngine::new(
            EngineConfig {
                symbol: config.symbol.clone(),
                initial_price: config.initial_price,
                timeframe: config.timeframe,
                mode: config.mode,
                volume_cap: self.config.stream.volume_cap,
                alert_threshold_percent: self.config.alert.threshold_percent,
            },
            policy,
            rng,
        );

        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (events_tx, events_rx) = mpsc::channel(self.config.stream.event_channel_capacity);
        let (provider_tx, provider_rx) = mpsc::channel(16);

        let poller = providers.realtime.clone().map(|provider| {
            spawn_realtime_poller(
                provider,
                config.symbol.clone(),
                self.config.stream.realtime_poll_ms,
                provider_tx.clone(),
            )
        });

        info!(
            symbol = %config.symbol,
            timeframe = %config.timeframe,
            seeded = config.seed.is_some(),
            "starting subscription"
        );

        let sim_config = self.config.clone();
        let symbol = config.symbol;
        let task = tokio::spawn(async move {
            let ticker = new_ticker(engine.policy().tick_interval());
            let task = SubscriptionTask {
                symbol,
                engine,
                config: sim_config,
                historical: providers.historical,
                events_tx,
                cmd_rx,
                provider_rx,
                provider_tx,
                poller,
                historical_fetch: None,
                ticker,
                alert_deadline: None,
                active_alert: None,
            };
            task.run().await;
        });

        Subscription {
            cmd_tx,
            events: events_rx,
            task,
        }
    }
}

/// Handle to a live subscription. Dropping it tears the stream down; prefer
/// [`Subscription::unsubscribe`] for a graceful stop.
pub struct Subscription {
    cmd_tx: mpsc::Sender<Command>,
    events: mpsc::Receiver<StreamEvent>,
    task: JoinHandle<()>,
}

impl Subscription {
    /// Next event; `None` once the subscription has fully stopped and all
    /// buffered events are drained.
    pub async fn recv(&mut self) -> Option<StreamEvent> {
        self.events.recv().await
    }

    pub fn try_recv(&mut self) -> Result<StreamEvent, mpsc::error::TryRecvError> {
        self.events.try_recv()
    }

    pub async fn change_timeframe(&self, timeframe: Timeframe) -> Result<(), SimError> {
        self.cmd_tx
            .send(Command::ChangeTimeframe(timeframe))
            .await
            .map_err(|_| SimError::SubscriptionClosed)
    }

    /// Graceful teardown. When this returns, the actor and every timer it
    /// owned (tick, sub-step, alert-dismiss, provider polling) are dead.
    pub async fn unsubscribe(&mut self) {
        let _ = self.cmd_tx.send(Command::Stop).await;
        let _ = (&mut self.task).await;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

struct SubscriptionTask {
    symbol: String,
    engine: StreamEngine,
    config: SimConfig,
    historical: Option<Arc<dyn HistoricalDataProvider>>,
    events_tx: mpsc::Sender<StreamEvent>,
    cmd_rx: mpsc::Receiver<Command>,
    provider_rx: mpsc::Receiver<ProviderUpdate>,
    provider_tx: mpsc::Sender<ProviderUpdate>,
    poller: Option<JoinHandle<()>>,
    historical_fetch: Option<JoinHandle<()>>,
    ticker: Interval,
    alert_deadline: Option<Instant>,
    active_alert: Option<MarketAlert>,
}

impl SubscriptionTask {
    async fn run(mut self) {
        let snapshot = self.engine.backfill(Utc::now());
        self.emit(StreamEvent::Snapshot(snapshot));
        let timeframe = self.engine.timeframe();
        self.spawn_historical_fetch(timeframe);

        loop {
            // sleep_until needs a concrete deadline even when the branch is
            // disabled
            let alert_at = self.alert_deadline.unwrap_or_else(Instant::now);
            tokio::select! {
                biased;
                cmd = self.cmd_rx.recv() => {
                    if self.on_command(cmd).await == Flow::Stop {
                        break;
                    }
                }
                _ = self.ticker.tick() => {
                    if self.on_tick().await == Flow::Stop {
                        break;
                    }
                }
                _ = sleep_until(alert_at), if self.alert_deadline.is_some() => {
                    self.alert_deadline = None;
                    self.active_alert = None;
                    self.emit(StreamEvent::AlertCleared);
                }
                Some(update) = self.provider_rx.recv() => {
                    self.on_provider_update(update);
                }
            }
        }

        self.shutdown();
    }

    async fn on_command(&mut self, cmd: Option<Command>) -> Flow {
        match cmd {
            Some(Command::ChangeTimeframe(timeframe)) => {
                // The in-flight backfill (if any) belongs to the old
                // timeframe; kill it before anything else.
                self.abort_historical_fetch();
                if self.config.stream.settle_delay_ms > 0 {
                    sleep(Duration::from_millis(self.config.stream.settle_delay_ms)).await;
                }
                let policy = self.config.policy_for(timeframe);
                let snapshot = self.engine.change_timeframe(timeframe, policy, Utc::now());
                // Replacing the interval before the loop polls again
                // guarantees no tick fires under the old cadence.
                self.ticker = new_ticker(self.engine.policy().tick_interval());
                self.spawn_historical_fetch(timeframe);
                self.emit(StreamEvent::Snapshot(snapshot));
                info!(symbol = %self.symbol, timeframe = %timeframe, "timeframe switched");
                Flow::Continue
            }
            Some(Command::Stop) | None => Flow::Stop,
        }
    }

    async fn on_tick(&mut self) -> Flow {
        let TickOutcome {
            snapshot,
            alert,
            transition,
        } = self.engine.tick(Utc::now());
        self.note_alert(alert);
        self.emit(StreamEvent::Snapshot(snapshot));
        match transition {
            Some(transition) => self.run_transition(transition).await,
            None => Flow::Continue,
        }
    }

    /// Walk the last point's price through the interpolation steps. A
    /// command arriving mid-transition cancels the remaining steps.
    async fn run_transition(&mut self, transition: Transition) -> Flow {
        if transition.steps.is_empty() {
            return Flow::Continue;
        }
        let step_ms = (self.engine.policy().tick_interval_ms
            / (transition.steps.len() as u64 + 1))
            .max(1);
        let period = Duration::from_millis(step_ms);
        let mut substep = interval_at(Instant::now() + period, period);
        for price in transition.steps {
            tokio::select! {
                biased;
                cmd = self.cmd_rx.recv() => {
                    debug!(symbol = %self.symbol, "transition cancelled by command");
                    return self.on_command(cmd).await;
                }
                _ = substep.tick() => {
                    let snapshot = self.engine.apply_substep(price);
                    self.emit(StreamEvent::Snapshot(snapshot));
                }
            }
        }
        Flow::Continue
    }

    fn on_provider_update(&mut self, update: ProviderUpdate) {
        match update {
            ProviderUpdate::Historical(timeframe, Ok(observations)) => {
                if timeframe != self.engine.timeframe() {
                    debug!(symbol = %self.symbol, "dropping stale backfill for {}", timeframe);
                    return;
                }
                match self.engine.adopt_backfill(observations) {
                    Ok(snapshot) => {
                        info!(symbol = %self.symbol, "adopted provider backfill");
                        self.emit(StreamEvent::Snapshot(snapshot));
                    }
                    Err(e) => {
                        warn!(symbol = %self.symbol, error = %e, "rejected provider backfill");
                        self.emit(StreamEvent::ProviderError(e.to_string()));
                    }
                }
            }
            ProviderUpdate::Historical(_, Err(e)) => {
                warn!(symbol = %self.symbol, error = %e, "historical fetch failed");
                self.emit(StreamEvent::ProviderError(e.to_string()));
            }
            ProviderUpdate::Realtime(Ok(price)) => {
                let outcome = self.engine.apply_realtime(price, Utc::now());
                self.note_alert(outcome.alert);
                self.emit(StreamEvent::Snapshot(outcome.snapshot));
            }
            ProviderUpdate::Realtime(Err(e)) => {
                warn!(symbol = %self.symbol, error = %e, "realtime fetch failed");
                self.emit(StreamEvent::ProviderError(e.to_string()));
            }
        }
    }

    fn note_alert(&mut self, alert: Option<MarketAlert>) {
        if let Some(alert) = alert {
            // A fresh firing always restarts the dismiss countdown; the
            // event is only re-emitted when the alert content changed, so
            // a steady drift updates the displayed percentage without
            // spamming identical alerts every tick.
            self.alert_deadline = Some(
                Instant::now() + Duration::from_millis(self.config.alert.display_duration_ms),
            );
            if self.active_alert.as_ref() != Some(&alert) {
                self.emit(StreamEvent::Alert(alert.clone()));
                self.active_alert = Some(alert);
            }
        }
    }

    fn spawn_historical_fetch(&mut self, timeframe: Timeframe) {
        let Some(provider) = self.historical.clone() else {
            return;
        };
        let tx = self.provider_tx.clone();
        let symbol = self.symbol.clone();
        self.historical_fetch = Some(tokio::spawn(async move {
            let result = provider.fetch(&symbol, timeframe).await;
            let _ = tx.send(ProviderUpdate::Historical(timeframe, result)).await;
        }));
    }

    fn abort_historical_fetch(&mut self) {
        if let Some(handle) = self.historical_fetch.take() {
            handle.abort();
        }
    }

    fn emit(&self, event: StreamEvent) {
        match self.events_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                debug!(symbol = %self.symbol, "event channel full, dropping event");
            }
            Err(TrySendError::Closed(_)) => {}
        }
    }

    fn shutdown(&mut self) {
        self.abort_historical_fetch();
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
        info!(symbol = %self.symbol, "subscription stopped");
    }
}

fn new_ticker(period: Duration) -> Interval {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

fn spawn_realtime_poller(
    provider: Arc<dyn RealtimeDataProvider>,
    symbol: String,
    poll_ms: u64,
    tx: mpsc::Sender<ProviderUpdate>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = new_ticker(Duration::from_millis(poll_ms));
        loop {
            ticker.tick().await;
            let result = provider.fetch_latest(&symbol).await;
            // Each poll cycle is independent; a failure only produces one
            // error update.
            if tx.send(ProviderUpdate::Realtime(result)).await.is_err() {
                break;
            }
        }
    })
}
