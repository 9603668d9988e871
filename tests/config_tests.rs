use hybrid_signal::config::{CombinationMethod, Config};
use hybrid_signal::SignalError;

#[test]
fn parse_default_toml() {
    let config = Config::from_toml_str(include_str!("../config/default.toml")).unwrap();
    assert_eq!(config, Config::default());

    assert_eq!(config.universe.assets.len(), 7);
    assert_eq!(config.strategies.mean_reversion.universe, vec!["IWM", "GLD"]);
    assert_eq!(config.strategies.mean_reversion.effective_min_periods(), 7);
    assert_eq!(config.strategies.momentum.effective_min_periods(), 10);
    assert_eq!(config.strategies.stat_arb.pairs.len(), 2);
    assert_eq!(config.strategies.stat_arb.pairs[0].first, "BTC-USD");
    assert_eq!(config.strategies.stat_arb.pairs[1].min_correlation, 0.7);
    assert_eq!(config.strategies.fx_vol.volatility_period, 14);
    assert_eq!(
        config.manager.combination_method,
        CombinationMethod::VolatilityWeighted
    );
    assert_eq!(config.sectors.sector_of("ETH-USD"), Some("crypto"));
    assert_eq!(config.sectors.sector_of("TLT"), None);
    assert_eq!(config.portfolio.top_n, 3);
}

#[test]
fn partial_sections_keep_defaults() {
    let config = Config::from_toml_str(
        r#"
[manager]
combination_method = "equal_weight"
max_position_size = 0.2

[strategies.momentum]
lookback = 40
"#,
    )
    .unwrap();

    assert_eq!(config.manager.combination_method, CombinationMethod::EqualWeight);
    assert_eq!(config.manager.max_position_size, 0.2);
    assert_eq!(config.manager.max_sector_exposure, 0.40);
    assert_eq!(config.strategies.momentum.lookback, 40);
    assert_eq!(config.strategies.momentum.effective_min_periods(), 20);
    assert!(config.strategies.momentum.enabled);
    assert_eq!(config.strategies.fx_vol.lookback, 50);
}

#[test]
fn explicit_min_periods_wins() {
    let config = Config::from_toml_str(
        r#"
[strategies.mean_reversion]
min_periods = 3
"#,
    )
    .unwrap();
    assert_eq!(config.strategies.mean_reversion.effective_min_periods(), 3);
}

#[test]
fn custom_sectors_replace_reference_map() {
    let config = Config::from_toml_str(
        r#"
[sectors]
growth = ["QQQ", "BTC-USD"]
"#,
    )
    .unwrap();
    assert_eq!(config.sectors.sector_of("QQQ"), Some("growth"));
    assert_eq!(config.sectors.sector_of("SPY"), None);
}

#[test]
fn rejects_out_of_range_values() {
    let cases = [
        "[manager]\nmax_correlation = 1.5\n",
        "[manager]\nmax_position_size = 0.0\n",
        "[universe]\nassets = []\n",
        "[universe]\nassets = [\"SPY\", \"SPY\"]\n",
        "[strategies.fx_vol]\nvolatility_period = 1\n",
        "[[strategies.stat_arb.pairs]]\nfirst = \"SPY\"\nsecond = \"SPY\"\nmin_correlation = 0.5\n",
    ];
    for case in cases {
        assert!(Config::from_toml_str(case).is_err(), "accepted: {}", case);
    }
}

#[test]
fn combination_method_parses_from_str() {
    assert_eq!(
        "equal_weight".parse::<CombinationMethod>().unwrap(),
        CombinationMethod::EqualWeight
    );
    assert_eq!(
        "volatility_weighted".parse::<CombinationMethod>().unwrap(),
        CombinationMethod::VolatilityWeighted
    );
    assert!("inverse_vol".parse::<CombinationMethod>().is_err());
    assert_eq!(CombinationMethod::EqualWeight.to_string(), "equal_weight");
}

#[test]
fn unknown_method_in_file_reports_method_name() {
    let err = Config::from_toml_str("[manager]\ncombination_method = \"inverse_vol\"\n").unwrap_err();
    let expected = SignalError::UnknownCombinationMethod("inverse_vol".to_string()).to_string();
    assert!(format!("{:#}", err).contains(&expected), "got: {:#}", err);
}

#[test]
fn combination_method_serialises_as_snake_case() {
    let text = toml::to_string(&Config::default()).unwrap();
    assert!(text.contains("combination_method = \"volatility_weighted\""));
    let back = Config::from_toml_str(&text).unwrap();
    assert_eq!(back, Config::default());
}
