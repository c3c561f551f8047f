use chrono::Utc;
use market_sim::model::{Timeframe, TimeframePolicy};
use market_sim::process::PriceProcess;
use market_sim::random::{RandomSource, SeededRandom};
use market_sim::series::{recompute_derived, SeriesBuilder, MA_WINDOW};

struct Pinned(f64);

impl RandomSource for Pinned {
    fn unit(&mut self) -> f64 {
        self.0
    }
}

fn seeded(seed: u64) -> PriceProcess {
    PriceProcess::new(Box::new(SeededRandom::new(seed)))
}

#[test]
fn every_timeframe_yields_exact_count_in_ascending_order() {
    let builder = SeriesBuilder::new(1_000_000);
    let reference = Utc::now();
    for tf in Timeframe::ALL {
        let policy = TimeframePolicy::defaults_for(tf);
        let obs = builder.build(tf, 100.0, &policy, reference, &mut seeded(11));
        assert_eq!(obs.len(), policy.retained_points, "{}", tf);
        assert!(
            obs.windows(2).all(|w| w[0].timestamp < w[1].timestamp),
            "{} timestamps not strictly increasing",
            tf
        );
        assert_eq!(obs.last().unwrap().timestamp, reference);
    }
}

#[test]
fn timestamps_are_spaced_at_the_sample_interval() {
    let builder = SeriesBuilder::new(1_000_000);
    let policy = TimeframePolicy::defaults_for(Timeframe::D1);
    let obs = builder.build(Timeframe::D1, 50.0, &policy, Utc::now(), &mut seeded(2));
    for w in obs.windows(2) {
        assert_eq!(w[1].timestamp - w[0].timestamp, chrono::Duration::hours(1));
    }
}

#[test]
fn walk_starts_from_the_anchor() {
    // Zero noise keeps every generated price at the anchor.
    let builder = SeriesBuilder::new(1_000_000);
    let policy = TimeframePolicy::defaults_for(Timeframe::W1);
    let obs = builder.build(
        Timeframe::W1,
        80.0,
        &policy,
        Utc::now(),
        &mut PriceProcess::new(Box::new(Pinned(0.5))),
    );
    assert!(obs.iter().all(|o| o.price == 80.0));
    assert!(obs.iter().all(|o| o.change == Some(0.0)));
}

#[test]
fn ma20_defined_only_after_warmup() {
    let builder = SeriesBuilder::new(1_000_000);
    let policy = TimeframePolicy::defaults_for(Timeframe::D1);
    let obs = builder.build(Timeframe::D1, 120.0, &policy, Utc::now(), &mut seeded(8));
    for (i, o) in obs.iter().enumerate() {
        if i + 1 < MA_WINDOW {
            assert!(o.ma20.is_none(), "point {} should lack ma20", i);
        } else {
            let want: f64 = obs[i + 1 - MA_WINDOW..=i].iter().map(|o| o.price).sum::<f64>()
                / MA_WINDOW as f64;
            assert!((o.ma20.unwrap() - want).abs() < 1e-9);
        }
    }
}

#[test]
fn short_windows_never_get_ma20() {
    let builder = SeriesBuilder::new(1_000_000);
    let policy = TimeframePolicy::defaults_for(Timeframe::W1);
    let obs = builder.build(Timeframe::W1, 120.0, &policy, Utc::now(), &mut seeded(8));
    assert!(obs.iter().all(|o| o.ma20.is_none()));
}

#[test]
fn recompute_derived_is_idempotent() {
    let builder = SeriesBuilder::new(1_000_000);
    let policy = TimeframePolicy::defaults_for(Timeframe::M1);
    let mut obs = builder.build(Timeframe::M1, 75.0, &policy, Utc::now(), &mut seeded(13));
    let first = obs.clone();
    recompute_derived(&mut obs, 75.0);
    assert_eq!(obs, first);
    recompute_derived(&mut obs, 75.0);
    assert_eq!(obs, first);
}

#[test]
fn volumes_respect_the_cap() {
    let builder = SeriesBuilder::new(500);
    let policy = TimeframePolicy::defaults_for(Timeframe::Y1);
    let obs = builder.build(Timeframe::Y1, 10.0, &policy, Utc::now(), &mut seeded(21));
    assert!(obs.iter().all(|o| o.volume <= 500));
}

#[test]
fn labels_match_the_timeframe_tier() {
    let builder = SeriesBuilder::new(1_000_000);
    let reference = Utc::now();

    let daily = builder.build(
        Timeframe::D1,
        10.0,
        &TimeframePolicy::defaults_for(Timeframe::D1),
        reference,
        &mut seeded(1),
    );
    assert!(daily.iter().all(|o| o.display_label.contains(':')));

    let five_year = builder.build(
        Timeframe::Y5,
        10.0,
        &TimeframePolicy::defaults_for(Timeframe::Y5),
        reference,
        &mut seeded(1),
    );
    assert!(five_year
        .iter()
        .all(|o| o.display_label.len() == 4 && o.display_label.parse::<i32>().is_ok()));
}

#[test]
fn flat_warmup_matches_window_shape() {
    let builder = SeriesBuilder::new(1_000_000);
    let policy = TimeframePolicy::defaults_for(Timeframe::M3);
    let obs = builder.flat_warmup(Timeframe::M3, 42.0, &policy, Utc::now(), &mut seeded(4));
    assert_eq!(obs.len(), policy.retained_points);
    assert!(obs.iter().all(|o| o.price == 42.0));
    assert!(obs.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
}
