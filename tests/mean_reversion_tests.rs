use chrono::{Duration, NaiveDate};
use hybrid_signal::model::PricePanel;
use hybrid_signal::strategy::mean_reversion::MeanReversionStrategy;
use hybrid_signal::strategy::SignalGenerator;

fn dates(n: usize) -> Vec<NaiveDate> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    (0..n).map(|i| start + Duration::days(i as i64)).collect()
}

fn panel(asset: &str, prices: Vec<f64>) -> PricePanel {
    PricePanel::new(
        dates(prices.len()),
        vec![(asset.to_string(), prices.into_iter().map(Some).collect())],
    )
    .unwrap()
}

#[test]
fn constant_growth_has_near_zero_zscore() {
    let prices: Vec<f64> = (0..40).map(|k| 100.0 * 1.01f64.powi(k)).collect();
    let p = panel("IWM", prices);
    let strategy = MeanReversionStrategy::new(15, 7, 1.0);

    let series = p.series("IWM").unwrap();
    for z in strategy.zscores(&series).into_iter().flatten() {
        assert!(z.abs() < 1e-6, "z={}", z);
    }
    let signals = strategy.generate(&p);
    assert!(signals
        .column("IWM")
        .unwrap()
        .iter()
        .all(|v| v.is_finite() && v.abs() < 1e-6));
}

#[test]
fn constant_price_is_neutral() {
    let p = panel("GLD", vec![190.0; 30]);
    let signals = MeanReversionStrategy::new(15, 7, 1.0).generate(&p);
    assert!(signals.column("GLD").unwrap().iter().all(|v| *v == 0.0));
}

#[test]
fn spike_up_scores_short_next_day() {
    let mut prices: Vec<f64> = (0..21)
        .map(|k| if k % 2 == 0 { 100.0 } else { 100.1 })
        .collect();
    let last = *prices.last().unwrap();
    prices.push(last * 1.10);
    prices.push(last * 1.10);
    let p = panel("IWM", prices);
    let signals = MeanReversionStrategy::new(15, 7, 1.0).generate(&p);
    let column = signals.column("IWM").unwrap();

    // the jump is observation 21, scored on day 22
    assert_eq!(column[22], -1.0);
    assert!(column[21].abs() < 1.0);
}

#[test]
fn spike_down_scores_long_next_day() {
    let mut prices: Vec<f64> = (0..21)
        .map(|k| if k % 2 == 0 { 100.0 } else { 100.1 })
        .collect();
    prices.push(90.0);
    prices.push(90.0);
    let p = panel("GLD", prices);
    let signals = MeanReversionStrategy::new(15, 7, 1.0).generate(&p);
    assert_eq!(signals.column("GLD").unwrap()[22], 1.0);
}

#[test]
fn short_history_is_neutral() {
    let prices: Vec<f64> = (0..20)
        .map(|k| 100.0 * (1.0 + 0.03 * (k as f64 * 1.1).sin()))
        .collect();
    let p = panel("IWM", prices);
    let signals = MeanReversionStrategy::new(15, 7, 1.0).generate(&p);
    let column = signals.column("IWM").unwrap();
    assert!(column[..8].iter().all(|v| *v == 0.0));
    assert!(column[8..].iter().any(|v| *v != 0.0));
}

#[test]
fn signals_are_bounded_and_ignore_future_prices() {
    let prices: Vec<f64> = (0..80)
        .map(|k| 50.0 * (1.0 + 0.2 * (k as f64 * 0.9).sin() + 0.1 * (k as f64 * 0.23).cos()))
        .collect();
    let strategy = MeanReversionStrategy::new(15, 7, 1.0);
    let base = strategy.generate(&panel("GLD", prices.clone()));
    let column = base.column("GLD").unwrap();
    assert!(column.iter().all(|v| v.is_finite() && v.abs() <= 1.0));

    let t = 55;
    let mut mutated = prices;
    for p in mutated.iter_mut().skip(t) {
        *p = 500.0;
    }
    let shifted = strategy.generate(&panel("GLD", mutated));
    assert_eq!(&column[..=t], &shifted.column("GLD").unwrap()[..=t]);
}
