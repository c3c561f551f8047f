use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::alert::AlertRule;
use crate::error::SimError;
use crate::model::{MarketAlert, Observation, SeriesSnapshot, Timeframe, TimeframePolicy, Trend};
use crate::process::{round_cents, PriceProcess, PRICE_FLOOR};
use crate::random::RandomSource;
use crate::series::{recompute_derived, SeriesBuilder};

/// How a tick mutates the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickMode {
    /// Rebuild the whole window every tick (discontinuous).
    Regenerate,
    /// Append one point and trim the oldest (continuous, default).
    Append,
    /// Append, then interpolate the new point's price over sub-steps
    /// within the tick interval.
    Smoothed { substeps: u32 },
}

impl Default for TickMode {
    fn default() -> Self {
        TickMode::Append
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub symbol: String,
    pub initial_price: f64,
    pub timeframe: Timeframe,
    pub mode: TickMode,
    pub volume_cap: u64,
    pub alert_threshold_percent: f64,
}

/// Remaining interpolation prices of a smoothed tick; the last entry is the
/// tick's target price. Each entry is applied via [`StreamEngine::apply_substep`].
#[derive(Debug, Clone)]
pub struct Transition {
    pub steps: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct TickOutcome {
    pub snapshot: SeriesSnapshot,
    pub alert: Option<MarketAlert>,
    pub transition: Option<Transition>,
}

/// Owns one subscription's series state and mutates it tick by tick.
/// A tick either fully commits or leaves the prior state untouched.
pub struct StreamEngine {
    symbol: String,
    timeframe: Timeframe,
    policy: TimeframePolicy,
    mode: TickMode,
    builder: SeriesBuilder,
    process: PriceProcess,
    alert_rule: AlertRule,
    observations: Vec<Observation>,
    anchor_price: f64,
    current_price: f64,
    trend: Trend,
}

impl StreamEngine {
    pub fn new(
        config: EngineConfig,
        policy: TimeframePolicy,
        rng: Box<dyn RandomSource>,
    ) -> Self {
        let initial = if config.initial_price.is_finite() {
            round_cents(config.initial_price.max(0.0))
        } else {
            PRICE_FLOOR
        };
        Self {
            symbol: config.symbol,
            timeframe: config.timeframe,
            policy,
            mode: config.mode,
            builder: SeriesBuilder::new(config.volume_cap),
            process: PriceProcess::new(rng),
            alert_rule: AlertRule::new(config.alert_threshold_percent),
            observations: Vec::new(),
            anchor_price: initial,
            current_price: initial,
            trend: Trend::Up,
        }
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn policy(&self) -> &TimeframePolicy {
        &self.policy
    }

    pub fn current_price(&self) -> f64 {
        self.current_price
    }

    pub fn anchor_price(&self) -> f64 {
        self.anchor_price
    }

    pub fn trend(&self) -> Trend {
        self.trend
    }

    /// Build the initial window from the anchor price.
    pub fn backfill(&mut self, now: DateTime<Utc>) -> SeriesSnapshot {
        let observations = self.builder.build(
            self.timeframe,
            self.anchor_price,
            &self.policy,
            now,
            &mut self.process,
        );
        self.commit(observations);
        debug!(
            symbol = %self.symbol,
            timeframe = %self.timeframe,
            points = self.observations.len(),
            "backfilled series"
        );
        self.snapshot()
    }

    /// One scheduled update cycle.
    pub fn tick(&mut self, now: DateTime<Utc>) -> TickOutcome {
        match self.mode {
            TickMode::Regenerate => {
                let observations = self.builder.build(
                    self.timeframe,
                    self.anchor_price,
                    &self.policy,
                    now,
                    &mut self.process,
                );
                self.commit(observations);
                self.outcome(None)
            }
            TickMode::Append => {
                let target =
                    self.process
                        .next(self.current_price, self.anchor_price, &self.policy);
                self.append(target, now);
                self.outcome(None)
            }
            TickMode::Smoothed { substeps } => {
                let target =
                    self.process
                        .next(self.current_price, self.anchor_price, &self.policy);
                let steps = interpolation_steps(self.current_price, target, substeps);
                // The new point enters at the old price; sub-steps walk it
                // to the target.
                self.append(self.current_price, now);
                let alert = self.alert_rule.evaluate(self.anchor_price, target);
                TickOutcome {
                    snapshot: self.snapshot(),
                    alert,
                    transition: Some(Transition { steps }),
                }
            }
        }
    }

    /// Apply one smoothed sub-step: move the most recent point's price and
    /// recompute every derived field, exactly as a full tick would.
    pub fn apply_substep(&mut self, price: f64) -> SeriesSnapshot {
        let previous = self.current_price;
        if let Some(last) = self.observations.last_mut() {
            last.price = price;
        }
        recompute_derived(&mut self.observations, self.anchor_price);
        self.current_price = price;
        self.trend = if price >= previous { Trend::Up } else { Trend::Down };
        self.snapshot()
    }

    /// Ingest one price update from a realtime provider. Same commit path
    /// as an append tick; out-of-range input is clamped, not an error.
    pub fn apply_realtime(&mut self, price: f64, now: DateTime<Utc>) -> TickOutcome {
        let sanitized = if price.is_finite() {
            round_cents(price.max(PRICE_FLOOR))
        } else {
            self.current_price
        };
        self.append(sanitized, now);
        self.outcome(None)
    }

    /// Replace the window with provider-supplied history. Validates before
    /// touching state, so a bad payload leaves the series intact.
    pub fn adopt_backfill(
        &mut self,
        mut observations: Vec<Observation>,
    ) -> Result<SeriesSnapshot, SimError> {
        if observations.is_empty() {
            return Err(SimError::HistoricalProvider(
                "empty backfill payload".to_string(),
            ));
        }
        if observations
            .windows(2)
            .any(|w| w[0].timestamp >= w[1].timestamp)
        {
            return Err(SimError::HistoricalProvider(
                "backfill timestamps are not strictly increasing".to_string(),
            ));
        }
        if observations
            .iter()
            .any(|o| !o.price.is_finite() || o.price < 0.0)
        {
            return Err(SimError::HistoricalProvider(
                "backfill contains invalid prices".to_string(),
            ));
        }
        let overflow = observations.len().saturating_sub(self.policy.retained_points);
        observations.drain(..overflow);
        self.commit(observations);
        Ok(self.snapshot())
    }

    /// Switch timeframes: the anchor resets to the current price and the
    /// window is rebuilt under the new policy.
    pub fn change_timeframe(
        &mut self,
        timeframe: Timeframe,
        policy: TimeframePolicy,
        now: DateTime<Utc>,
    ) -> SeriesSnapshot {
        self.timeframe = timeframe;
        self.policy = policy;
        self.anchor_price = self.current_price;
        debug!(
            symbol = %self.symbol,
            timeframe = %self.timeframe,
            anchor = self.anchor_price,
            "timeframe changed, rebuilding window"
        );
        self.backfill(now)
    }

    pub fn snapshot(&self) -> SeriesSnapshot {
        let last = self.observations.last();
        SeriesSnapshot {
            symbol: self.symbol.clone(),
            timeframe: self.timeframe,
            observations: self.observations.clone(),
            anchor_price: self.anchor_price,
            current_price: self.current_price,
            trend: self.trend,
            change: last.and_then(|o| o.change),
            change_percent: last.and_then(|o| o.change_percent),
        }
    }

    fn append(&mut self, price: f64, now: DateTime<Utc>) {
        let mut next = self.observations.clone();
        let timestamp = match next.last() {
            // Appended points must keep timestamps strictly increasing even
            // when ticks land within the same millisecond.
            Some(last) if now <= last.timestamp => last.timestamp + Duration::milliseconds(1),
            _ => now,
        };
        let cap = self.builder.volume_cap();
        next.push(Observation {
            timestamp,
            price,
            display_label: self.timeframe.format_label(timestamp),
            volume: self.process.volume(cap),
            ma20: None,
            change: None,
            change_percent: None,
        });
        let overflow = next.len().saturating_sub(self.policy.retained_points);
        next.drain(..overflow);
        self.commit(next);
    }

    fn commit(&mut self, mut observations: Vec<Observation>) {
        recompute_derived(&mut observations, self.anchor_price);
        let previous = self.current_price;
        self.observations = observations;
        if let Some(last) = self.observations.last() {
            self.current_price = last.price;
        }
        self.trend = if self.current_price >= previous {
            Trend::Up
        } else {
            Trend::Down
        };
    }

    fn outcome(&self, transition: Option<Transition>) -> TickOutcome {
        let alert = self
            .alert_rule
            .evaluate(self.anchor_price, self.current_price);
        TickOutcome {
            snapshot: self.snapshot(),
            alert,
            transition,
        }
    }
}

fn interpolation_steps(from: f64, to: f64, substeps: u32) -> Vec<f64> {
    let n = substeps.max(1) as usize;
    let mut steps = Vec::with_capacity(n);
    for k in 1..=n {
        let frac = k as f64 / n as f64;
        steps.push(round_cents(from + (to - from) * frac));
    }
    // Rounding must not displace the endpoint.
    if let Some(last) = steps.last_mut() {
        *last = to;
    }
    steps
}
