use crate::model::TimeframePolicy;
use crate::random::RandomSource;

/// Prices never go below this. Keeping the floor strictly positive means a
/// generated anchor can always serve as a %change denominator.
pub const PRICE_FLOOR: f64 = 0.01;

/// Random walk with mean reversion. Owns the randomness source so every
/// draw in a subscription comes from one injectable stream.
pub struct PriceProcess {
    rng: Box<dyn RandomSource>,
}

impl PriceProcess {
    pub fn new(rng: Box<dyn RandomSource>) -> Self {
        Self { rng }
    }

    /// Next price given the current price and the window's anchor.
    ///
    /// `delta` scales with the current price and the policy's volatility;
    /// `reversion` pulls back toward the anchor proportionally to the gap.
    /// Always finite, >= PRICE_FLOOR, rounded to cents.
    pub fn next(&mut self, current: f64, anchor: f64, policy: &TimeframePolicy) -> f64 {
        let delta = current * policy.volatility * self.rng.signed_unit();
        let reversion = (anchor - current) * policy.mean_reversion;
        round_cents((current + delta + reversion).max(PRICE_FLOOR))
    }

    /// Uniform random volume in [0, cap]. No trend correlation.
    pub fn volume(&mut self, cap: u64) -> u64 {
        self.rng.volume(cap)
    }
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
