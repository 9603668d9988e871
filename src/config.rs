use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::SignalError;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
pub const CONFIG_PATH_ENV: &str = "HYBRID_SIGNAL_CONFIG";

/// Full run configuration. Every section is optional; missing sections fall
/// back to the reference setup.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub universe: UniverseConfig,
    pub strategies: StrategiesConfig,
    pub manager: ManagerConfig,
    pub sectors: SectorMap,
    pub portfolio: PortfolioConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniverseConfig {
    pub assets: Vec<String>,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            assets: strings(&["SPY", "QQQ", "IWM", "GLD", "BTC-USD", "ETH-USD", "EURUSD=X"]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategiesConfig {
    pub mean_reversion: MeanReversionConfig,
    pub momentum: MomentumConfig,
    pub stat_arb: StatArbConfig,
    pub fx_vol: FxVolConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumConfig {
    pub enabled: bool,
    pub universe: Vec<String>,
    pub lookback: usize,
    /// Defaults to `max(lookback / 2, 10)`.
    pub min_periods: Option<usize>,
    pub raw_clip: f64,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            universe: strings(&["SPY", "QQQ", "BTC-USD", "ETH-USD"]),
            lookback: 21,
            min_periods: None,
            raw_clip: 0.5,
        }
    }
}

impl MomentumConfig {
    pub fn effective_min_periods(&self) -> usize {
        self.min_periods.unwrap_or((self.lookback / 2).max(10))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeanReversionConfig {
    pub enabled: bool,
    pub universe: Vec<String>,
    pub lookback: usize,
    /// Defaults to `max(lookback / 2, 5)`.
    pub min_periods: Option<usize>,
    pub clip: f64,
}

impl Default for MeanReversionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            universe: strings(&["IWM", "GLD"]),
            lookback: 15,
            min_periods: None,
            clip: 1.0,
        }
    }
}

impl MeanReversionConfig {
    pub fn effective_min_periods(&self) -> usize {
        self.min_periods.unwrap_or((self.lookback / 2).max(5))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FxVolConfig {
    pub enabled: bool,
    pub universe: Vec<String>,
    pub lookback: usize,
    pub volatility_period: usize,
    pub intermediate_clip: f64,
}

impl Default for FxVolConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            universe: strings(&["EURUSD=X"]),
            lookback: 50,
            volatility_period: 14,
            intermediate_clip: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairConfig {
    pub first: String,
    pub second: String,
    pub min_correlation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatArbConfig {
    pub enabled: bool,
    pub lookback: usize,
    pub zscore_clip: f64,
    pub pairs: Vec<PairConfig>,
}

impl Default for StatArbConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            lookback: 20,
            zscore_clip: 2.0,
            pairs: vec![
                PairConfig {
                    first: "BTC-USD".to_string(),
                    second: "ETH-USD".to_string(),
                    min_correlation: 0.5,
                },
                PairConfig {
                    first: "SPY".to_string(),
                    second: "QQQ".to_string(),
                    min_correlation: 0.7,
                },
            ],
        }
    }
}

/// Parsed through [`FromStr`], so config files and CLI-style strings share
/// one error path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CombinationMethod {
    EqualWeight,
    #[default]
    VolatilityWeighted,
}

impl CombinationMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EqualWeight => "equal_weight",
            Self::VolatilityWeighted => "volatility_weighted",
        }
    }
}

impl fmt::Display for CombinationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CombinationMethod {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "equal_weight" => Ok(Self::EqualWeight),
            "volatility_weighted" => Ok(Self::VolatilityWeighted),
            other => Err(SignalError::UnknownCombinationMethod(other.to_string())),
        }
    }
}

impl TryFrom<String> for CombinationMethod {
    type Error = SignalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CombinationMethod> for String {
    fn from(method: CombinationMethod) -> Self {
        method.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    pub max_correlation: f64,
    pub max_position_size: f64,
    pub max_sector_exposure: f64,
    /// Minimum dated rows per side, and common dates, before two strategies
    /// are compared.
    pub min_overlap: usize,
    pub combination_method: CombinationMethod,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            max_correlation: 0.7,
            max_position_size: 0.15,
            max_sector_exposure: 0.40,
            min_overlap: 10,
            combination_method: CombinationMethod::VolatilityWeighted,
        }
    }
}

/// Sector name -> member assets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectorMap(pub BTreeMap<String, Vec<String>>);

impl Default for SectorMap {
    fn default() -> Self {
        let mut sectors = BTreeMap::new();
        sectors.insert("equity".to_string(), strings(&["SPY", "QQQ", "IWM"]));
        sectors.insert("crypto".to_string(), strings(&["BTC-USD", "ETH-USD"]));
        sectors.insert("commodity".to_string(), strings(&["GLD"]));
        sectors.insert("fx".to_string(), strings(&["EURUSD=X"]));
        Self(sectors)
    }
}

impl SectorMap {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn sector_of(&self, asset: &str) -> Option<&str> {
        self.iter()
            .find(|(_, members)| members.iter().any(|m| m == asset))
            .map(|(name, _)| name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioConfig {
    pub top_n: usize,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self { top_n: 3 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub model_version: String,
    pub target_vol: String,
    pub signal_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            model_version: "v4.0-enhanced-risk-managed".to_string(),
            target_vol: "0.10".to_string(),
            signal_dir: "signals".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Config {
    /// Load from `$HYBRID_SIGNAL_CONFIG` or `config/default.toml`. A missing
    /// default file yields the built-in configuration.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_path(Path::new(&path)),
            Err(_) => {
                let path = Path::new(DEFAULT_CONFIG_PATH);
                if path.exists() {
                    Self::from_path(path)
                } else {
                    let config = Self::default();
                    config.validate()?;
                    Ok(config)
                }
            }
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&config_str)
            .with_context(|| format!("failed to load {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).context("failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.universe.assets.is_empty() {
            bail!("universe.assets must not be empty");
        }
        let mut seen = HashSet::new();
        for asset in &self.universe.assets {
            if !seen.insert(asset) {
                bail!("universe.assets lists '{}' more than once", asset);
            }
        }

        let s = &self.strategies;
        if s.momentum.lookback == 0 {
            bail!("strategies.momentum.lookback must be > 0");
        }
        if s.momentum.effective_min_periods() == 0 {
            bail!("strategies.momentum.min_periods must be > 0");
        }
        check_positive("strategies.momentum.raw_clip", s.momentum.raw_clip)?;
        if s.mean_reversion.lookback < 2 {
            bail!("strategies.mean_reversion.lookback must be >= 2");
        }
        check_positive("strategies.mean_reversion.clip", s.mean_reversion.clip)?;
        if s.fx_vol.lookback == 0 {
            bail!("strategies.fx_vol.lookback must be > 0");
        }
        if s.fx_vol.volatility_period < 2 {
            bail!("strategies.fx_vol.volatility_period must be >= 2");
        }
        check_positive("strategies.fx_vol.intermediate_clip", s.fx_vol.intermediate_clip)?;
        if s.stat_arb.lookback < 2 {
            bail!("strategies.stat_arb.lookback must be >= 2");
        }
        check_positive("strategies.stat_arb.zscore_clip", s.stat_arb.zscore_clip)?;
        for pair in &s.stat_arb.pairs {
            if pair.first == pair.second {
                bail!("stat_arb pair '{}' must use two different assets", pair.first);
            }
            if !(-1.0..=1.0).contains(&pair.min_correlation) {
                bail!(
                    "stat_arb pair {}/{} min_correlation must lie in [-1, 1]",
                    pair.first,
                    pair.second
                );
            }
        }

        let m = &self.manager;
        if !(m.max_correlation > 0.0 && m.max_correlation <= 1.0) {
            bail!("manager.max_correlation must lie in (0, 1]");
        }
        check_positive("manager.max_position_size", m.max_position_size)?;
        check_positive("manager.max_sector_exposure", m.max_sector_exposure)?;
        if m.min_overlap < 2 {
            bail!("manager.min_overlap must be >= 2");
        }

        if self.portfolio.top_n == 0 {
            bail!("portfolio.top_n must be > 0");
        }
        Ok(())
    }
}

fn check_positive(name: &str, value: f64) -> Result<()> {
    if !(value.is_finite() && value > 0.0) {
        bail!("{} must be a positive number (got {})", name, value);
    }
    Ok(())
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
