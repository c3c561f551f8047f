use market_sim::alert::AlertRule;
use market_sim::model::AlertSeverity;

#[test]
fn six_percent_up_move_fires_info() {
    let rule = AlertRule::new(5.0);
    let alert = rule.evaluate(100.0, 106.0).expect("should fire");
    assert_eq!(alert.severity, AlertSeverity::Info);
    assert!(alert.message.contains("+6.00%"), "{}", alert.message);
}

#[test]
fn six_percent_down_move_fires_warning() {
    let rule = AlertRule::new(5.0);
    let alert = rule.evaluate(100.0, 94.0).expect("should fire");
    assert_eq!(alert.severity, AlertSeverity::Warning);
    assert!(alert.message.contains("-6.00%"), "{}", alert.message);
}

#[test]
fn three_percent_move_stays_quiet() {
    let rule = AlertRule::new(5.0);
    assert!(rule.evaluate(100.0, 103.0).is_none());
    assert!(rule.evaluate(100.0, 97.0).is_none());
}

#[test]
fn threshold_is_exclusive() {
    let rule = AlertRule::new(5.0);
    assert!(rule.evaluate(100.0, 105.0).is_none());
    assert!(rule.evaluate(100.0, 105.01).is_some());
}

#[test]
fn zero_anchor_never_fires() {
    let rule = AlertRule::new(5.0);
    assert!(rule.evaluate(0.0, 1_000.0).is_none());
}

#[test]
fn threshold_is_configurable() {
    let rule = AlertRule::new(2.0);
    let alert = rule.evaluate(100.0, 103.0).expect("should fire at 2%");
    assert_eq!(alert.severity, AlertSeverity::Info);
    assert!(alert.message.contains("+3.00%"));
}

#[should_panic(expected = "alert threshold must be > 0")]
#[test]
fn zero_threshold_is_rejected() {
    AlertRule::new(0.0);
}
