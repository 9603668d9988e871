use crate::config::MomentumConfig;
use crate::indicator::rolling::RollingWindow;
use crate::model::panel::{PricePanel, PriceSeries};
use crate::model::signal::SignalPanel;
use crate::strategy::{per_asset, SignalGenerator, StrategyKind, VOL_EPSILON};

/// Rate of change over `lookback` observations.
#[derive(Debug, Clone)]
pub struct MomentumStrategy {
    lookback: usize,
    min_periods: usize,
    raw_clip: f64,
}

impl MomentumStrategy {
    pub fn new(lookback: usize, min_periods: usize, raw_clip: f64) -> Self {
        Self {
            lookback: lookback.max(1),
            min_periods: min_periods.max(2),
            raw_clip: raw_clip.abs(),
        }
    }

    pub fn from_config(cfg: &MomentumConfig) -> Self {
        Self::new(cfg.lookback, cfg.effective_min_periods(), cfg.raw_clip)
    }

    fn raw(&self, series: &PriceSeries) -> Vec<Option<f64>> {
        let mut window = RollingWindow::new(self.lookback + 1);
        let mut seen = 0usize;
        series
            .prices
            .iter()
            .map(|price| {
                window.push(*price);
                seen += 1;
                // warm-up counts the asset's history, not the window
                if seen < self.min_periods {
                    return None;
                }
                let base = window.oldest()?;
                if base.abs() < VOL_EPSILON {
                    return Some(0.0);
                }
                let roc = price / base - 1.0;
                Some(roc.clamp(-self.raw_clip, self.raw_clip))
            })
            .collect()
    }
}

impl SignalGenerator for MomentumStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Momentum
    }

    fn generate(&self, panel: &PricePanel) -> SignalPanel {
        per_asset(panel, |series| self.raw(series))
    }
}
