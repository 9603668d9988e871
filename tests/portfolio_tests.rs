use hybrid_signal::model::CombinedSignal;
use hybrid_signal::portfolio::WeightConstructor;

fn signal(values: &[(&str, f64)]) -> CombinedSignal {
    CombinedSignal::new(values.iter().map(|(a, v)| (a.to_string(), *v)).collect())
}

#[test]
fn top_and_bottom_three_get_equal_size() {
    let s = signal(&[
        ("A", 0.9),
        ("B", 0.5),
        ("C", 0.1),
        ("D", -0.1),
        ("E", -0.5),
        ("F", -0.9),
    ]);
    let weights = WeightConstructor::new(3).build(&s);

    for asset in ["A", "B", "C"] {
        assert!((weights.get(asset).unwrap() - 1.0 / 6.0).abs() < 1e-12);
    }
    for asset in ["D", "E", "F"] {
        assert!((weights.get(asset).unwrap() + 1.0 / 6.0).abs() < 1e-12);
    }
    assert!(weights.net_exposure().abs() < 1e-12);
    assert!((weights.gross_exposure() - 1.0).abs() < 1e-12);
}

#[test]
fn middle_assets_stay_flat() {
    let s = signal(&[
        ("SPY", 0.12),
        ("QQQ", -0.03),
        ("IWM", 0.0),
        ("GLD", 0.08),
        ("BTC-USD", -0.15),
        ("ETH-USD", 0.02),
        ("EURUSD=X", -0.07),
    ]);
    let weights = WeightConstructor::new(2).build(&s);

    assert_eq!(weights.get("SPY"), Some(0.25));
    assert_eq!(weights.get("GLD"), Some(0.25));
    assert_eq!(weights.get("BTC-USD"), Some(-0.25));
    assert_eq!(weights.get("EURUSD=X"), Some(-0.25));
    for asset in ["QQQ", "IWM", "ETH-USD"] {
        assert_eq!(weights.get(asset), Some(0.0));
    }
    assert_eq!(weights.max_abs(), 0.25);
}

#[test]
fn all_zero_signal_gives_no_positions() {
    let s = signal(&[("A", 0.0), ("B", 0.0), ("C", 0.0), ("D", 0.0)]);
    let weights = WeightConstructor::new(3).build(&s);
    assert!(weights.values().iter().all(|w| *w == 0.0));
    assert_eq!(weights.gross_exposure(), 0.0);
}

#[test]
fn ties_keep_signal_order() {
    let s = signal(&[("A", 0.5), ("B", 0.5), ("C", -0.5), ("D", -0.5)]);
    let weights = WeightConstructor::new(1).build(&s);
    assert_eq!(weights.values(), vec![0.5, 0.0, -0.5, 0.0]);
}

#[test]
fn overlapping_selection_ends_short_with_unit_gross() {
    let s = signal(&[("A", 0.4), ("B", 0.3), ("C", 0.2), ("D", 0.1)]);
    let weights = WeightConstructor::new(3).build(&s);
    assert_eq!(weights.values(), vec![0.25, -0.25, -0.25, -0.25]);
    assert!((weights.gross_exposure() - 1.0).abs() < 1e-12);
}

#[test]
fn empty_signal_gives_empty_weights() {
    let weights = WeightConstructor::new(3).build(&CombinedSignal::default());
    assert!(weights.values().is_empty());
}

#[test]
fn zero_top_n_is_treated_as_one() {
    let constructor = WeightConstructor::new(0);
    assert_eq!(constructor.top_n(), 1);
}
