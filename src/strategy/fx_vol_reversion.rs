use crate::config::FxVolConfig;
use crate::indicator::rolling::RollingWindow;
use crate::model::panel::{PricePanel, PriceSeries};
use crate::model::signal::SignalPanel;
use crate::strategy::{per_asset, SignalGenerator, StrategyKind, VOL_EPSILON};

/// Distance from the simple moving average, measured in units of return
/// volatility, so assets with different volatility regimes are comparable.
#[derive(Debug, Clone)]
pub struct FxVolReversionStrategy {
    lookback: usize,
    volatility_period: usize,
    intermediate_clip: f64,
}

impl FxVolReversionStrategy {
    pub fn new(lookback: usize, volatility_period: usize, intermediate_clip: f64) -> Self {
        Self {
            lookback: lookback.max(1),
            volatility_period: volatility_period.max(2),
            intermediate_clip: if intermediate_clip > 0.0 {
                intermediate_clip
            } else {
                1.0
            },
        }
    }

    pub fn from_config(cfg: &FxVolConfig) -> Self {
        Self::new(cfg.lookback, cfg.volatility_period, cfg.intermediate_clip)
    }

    fn raw(&self, series: &PriceSeries) -> Vec<Option<f64>> {
        let mut prices = RollingWindow::new(self.lookback);
        let mut returns = RollingWindow::new(self.volatility_period);
        let bound = self.intermediate_clip;

        series
            .prices
            .iter()
            .zip(series.returns())
            .map(|(price, ret)| {
                prices.push(*price);
                if let Some(r) = ret {
                    returns.push(r);
                }
                if !prices.is_full() || !returns.is_full() {
                    return None;
                }
                let sma = prices.mean()?;
                let vol = returns.std()?;
                let raw = -(price - sma) / (vol + VOL_EPSILON);
                Some(raw.clamp(-bound, bound) / bound)
            })
            .collect()
    }
}

impl SignalGenerator for FxVolReversionStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::FxVol
    }

    fn generate(&self, panel: &PricePanel) -> SignalPanel {
        per_asset(panel, |series| self.raw(series))
    }
}
