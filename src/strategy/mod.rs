//! Price-panel -> signal-panel generators.
//!
//! Every generator is stateless between runs and shares one contract:
//! the value at date `t` only uses prices through `t - 1`, and every value
//! is finite and within [-1, 1].

pub mod fx_vol_reversion;
pub mod mean_reversion;
pub mod momentum;
pub mod stat_arb;

use std::fmt;

use crate::model::panel::{PricePanel, PriceSeries};
use crate::model::signal::SignalPanel;

/// Guard added to volatility denominators.
pub const VOL_EPSILON: f64 = 1e-8;

pub trait SignalGenerator {
    fn kind(&self) -> StrategyKind;
    fn generate(&self, panel: &PricePanel) -> SignalPanel;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StrategyKind {
    MeanReversion,
    Momentum,
    StatArb,
    FxVol,
}

impl StrategyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MeanReversion => "mean_reversion",
            Self::Momentum => "momentum",
            Self::StatArb => "stat_arb",
            Self::FxVol => "fx_vol",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run `raw` over each asset's present observations, place the results back
/// on the panel's date axis, then shift and bound them.
pub(crate) fn per_asset<F>(panel: &PricePanel, raw: F) -> SignalPanel
where
    F: Fn(&PriceSeries) -> Vec<Option<f64>>,
{
    let columns = panel
        .assets()
        .iter()
        .map(|asset| {
            let mut column = vec![None; panel.len()];
            if let Some(series) = panel.series(asset) {
                for (pos, value) in series.positions.iter().zip(raw(&series)) {
                    column[*pos] = value;
                }
            }
            column
        })
        .collect();
    SignalPanel::from_lookback(panel.dates().to_vec(), panel.assets().to_vec(), columns)
}
