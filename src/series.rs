use chrono::{DateTime, Utc};

use crate::indicator::TrailingMean;
use crate::model::{Observation, Timeframe, TimeframePolicy};
use crate::process::PriceProcess;

/// Number of trailing points in the moving average.
pub const MA_WINDOW: usize = 20;

/// Builds a complete backfill window for a timeframe: timestamps spaced at
/// the policy's sample interval ending at `reference`, prices walked from
/// the anchor, volumes drawn uniformly.
pub struct SeriesBuilder {
    volume_cap: u64,
}

impl SeriesBuilder {
    pub fn new(volume_cap: u64) -> Self {
        assert!(volume_cap > 0, "volume_cap must be > 0");
        Self { volume_cap }
    }

    pub fn volume_cap(&self) -> u64 {
        self.volume_cap
    }

    pub fn build(
        &self,
        timeframe: Timeframe,
        anchor: f64,
        policy: &TimeframePolicy,
        reference: DateTime<Utc>,
        process: &mut PriceProcess,
    ) -> Vec<Observation> {
        let n = policy.retained_points;
        let mut observations = Vec::with_capacity(n);
        let mut running = anchor;
        for i in 0..n {
            let offset = (n - 1 - i) as i32;
            let timestamp = reference - policy.sample_interval() * offset;
            running = process.next(running, anchor, policy);
            observations.push(Observation {
                timestamp,
                price: running,
                display_label: timeframe.format_label(timestamp),
                volume: process.volume(self.volume_cap),
                ma20: None,
                change: None,
                change_percent: None,
            });
        }
        recompute_derived(&mut observations, anchor);
        observations
    }

    /// Constant-price placeholder window shown before the stream warms up.
    pub fn flat_warmup(
        &self,
        timeframe: Timeframe,
        price: f64,
        policy: &TimeframePolicy,
        reference: DateTime<Utc>,
        process: &mut PriceProcess,
    ) -> Vec<Observation> {
        let n = policy.retained_points;
        let mut observations = Vec::with_capacity(n);
        for i in 0..n {
            let offset = (n - 1 - i) as i32;
            let timestamp = reference - policy.sample_interval() * offset;
            observations.push(Observation {
                timestamp,
                price,
                display_label: timeframe.format_label(timestamp),
                volume: process.volume(self.volume_cap),
                ma20: None,
                change: None,
                change_percent: None,
            });
        }
        recompute_derived(&mut observations, price);
        observations
    }
}

/// Recompute every derived field over the window. Pure function of
/// (prices, anchor): running it twice yields identical results.
pub fn recompute_derived(observations: &mut [Observation], anchor: f64) {
    let mut mean = TrailingMean::new(MA_WINDOW);
    for obs in observations.iter_mut() {
        obs.ma20 = mean.push(obs.price);
        if anchor > 0.0 {
            let change = obs.price - anchor;
            obs.change = Some(change);
            obs.change_percent = Some(change / anchor * 100.0);
        } else {
            obs.change = None;
            obs.change_percent = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SeededRandom;

    fn process(seed: u64) -> PriceProcess {
        PriceProcess::new(Box::new(SeededRandom::new(seed)))
    }

    #[test]
    fn derived_fields_match_anchor() {
        let policy = TimeframePolicy::defaults_for(Timeframe::D1);
        let builder = SeriesBuilder::new(1_000_000);
        let obs = builder.build(Timeframe::D1, 200.0, &policy, Utc::now(), &mut process(3));
        for o in &obs {
            let change = o.change.unwrap();
            assert!((change - (o.price - 200.0)).abs() < 1e-9);
            assert!((o.change_percent.unwrap() - change / 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn zero_anchor_leaves_change_undefined() {
        let policy = TimeframePolicy::defaults_for(Timeframe::W1);
        let builder = SeriesBuilder::new(1_000_000);
        let obs = builder.build(Timeframe::W1, 0.0, &policy, Utc::now(), &mut process(5));
        assert!(obs.iter().all(|o| o.change.is_none()));
        assert!(obs.iter().all(|o| o.change_percent.is_none()));
    }

    #[test]
    fn flat_warmup_is_constant() {
        let policy = TimeframePolicy::defaults_for(Timeframe::M1);
        let builder = SeriesBuilder::new(10_000);
        let obs = builder.flat_warmup(Timeframe::M1, 50.0, &policy, Utc::now(), &mut process(9));
        assert_eq!(obs.len(), policy.retained_points);
        assert!(obs.iter().all(|o| o.price == 50.0));
        assert!(obs.iter().all(|o| o.volume <= 10_000));
    }
}
