use tracing::debug;

use crate::config::{PairConfig, StatArbConfig};
use crate::indicator::correlation::ExpandingCorrelation;
use crate::indicator::rolling::RollingWindow;
use crate::model::panel::PricePanel;
use crate::model::signal::SignalPanel;
use crate::strategy::{SignalGenerator, StrategyKind, VOL_EPSILON};

#[derive(Debug, Clone, PartialEq)]
pub struct TradingPair {
    pub first: String,
    pub second: String,
    pub min_correlation: f64,
}

impl From<&PairConfig> for TradingPair {
    fn from(cfg: &PairConfig) -> Self {
        Self {
            first: cfg.first.clone(),
            second: cfg.second.clone(),
            min_correlation: cfg.min_correlation,
        }
    }
}

/// Relative-value bets on the z-score of a price ratio.
///
/// A pair only trades on dates where the correlation of its legs over all
/// history seen so far exceeds the pair's threshold. The first leg gets the
/// pair signal, the second leg its negation.
#[derive(Debug, Clone)]
pub struct StatArbStrategy {
    lookback: usize,
    zscore_clip: f64,
    pairs: Vec<TradingPair>,
}

impl StatArbStrategy {
    pub fn new(lookback: usize, zscore_clip: f64, pairs: Vec<TradingPair>) -> Self {
        Self {
            lookback: lookback.max(2),
            zscore_clip: if zscore_clip > 0.0 { zscore_clip } else { 1.0 },
            pairs,
        }
    }

    pub fn from_config(cfg: &StatArbConfig) -> Self {
        Self::new(
            cfg.lookback,
            cfg.zscore_clip,
            cfg.pairs.iter().map(TradingPair::from).collect(),
        )
    }

    pub fn pairs(&self) -> &[TradingPair] {
        &self.pairs
    }

    /// Raw pair signal per panel date; `None` where the pair does not trade.
    fn pair_signal(
        &self,
        first: &[Option<f64>],
        second: &[Option<f64>],
        min_correlation: f64,
    ) -> Vec<Option<f64>> {
        let mut correlation = ExpandingCorrelation::new();
        let mut ratios = RollingWindow::new(self.lookback);
        let bound = self.zscore_clip;

        first
            .iter()
            .zip(second)
            .map(|(a, b)| {
                let (a, b) = ((*a)?, (*b)?);
                correlation.push(a, b);
                let ratio = a / b;
                ratios.push(ratio);

                if correlation.count() < self.lookback || !ratios.is_full() {
                    return None;
                }
                if !correlation.value().is_some_and(|c| c > min_correlation) {
                    return None;
                }
                let mean = ratios.mean()?;
                let std = ratios.std()?;
                let z = (ratio - mean) / (std + VOL_EPSILON);
                Some(-z.clamp(-bound, bound) / bound)
            })
            .collect()
    }
}

impl SignalGenerator for StatArbStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::StatArb
    }

    fn generate(&self, panel: &PricePanel) -> SignalPanel {
        let assets = panel.assets().to_vec();
        let mut raw: Vec<Vec<Option<f64>>> = vec![vec![None; panel.len()]; assets.len()];

        for pair in &self.pairs {
            let (Some(first), Some(second)) =
                (panel.column(&pair.first), panel.column(&pair.second))
            else {
                debug!(first = %pair.first, second = %pair.second, "Pair leg not in panel, skipping");
                continue;
            };
            let signal = self.pair_signal(first, second, pair.min_correlation);
            let traded = signal.iter().filter(|v| v.is_some()).count();
            debug!(
                first = %pair.first,
                second = %pair.second,
                min_correlation = pair.min_correlation,
                traded_days = traded,
                "Stat-arb pair evaluated"
            );

            let first_idx = assets.iter().position(|a| *a == pair.first);
            let second_idx = assets.iter().position(|a| *a == pair.second);
            let (Some(first_idx), Some(second_idx)) = (first_idx, second_idx) else {
                continue;
            };
            for (pos, value) in signal.into_iter().enumerate() {
                if let Some(v) = value {
                    raw[first_idx][pos] = Some(v);
                    raw[second_idx][pos] = Some(-v);
                }
            }
        }

        SignalPanel::from_lookback(panel.dates().to_vec(), assets, raw)
    }
}
