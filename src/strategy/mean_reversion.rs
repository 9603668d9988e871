use crate::config::MeanReversionConfig;
use crate::indicator::rolling::RollingWindow;
use crate::model::panel::{PricePanel, PriceSeries};
use crate::model::signal::SignalPanel;
use crate::strategy::{per_asset, SignalGenerator, StrategyKind, VOL_EPSILON};

/// Negated rolling z-score of period returns: a large up-move scores short.
#[derive(Debug, Clone)]
pub struct MeanReversionStrategy {
    lookback: usize,
    min_periods: usize,
    clip: f64,
}

impl MeanReversionStrategy {
    pub fn new(lookback: usize, min_periods: usize, clip: f64) -> Self {
        let lookback = lookback.max(2);
        Self {
            lookback,
            // the std needs two returns
            min_periods: min_periods.clamp(2, lookback),
            clip: clip.abs(),
        }
    }

    pub fn from_config(cfg: &MeanReversionConfig) -> Self {
        Self::new(cfg.lookback, cfg.effective_min_periods(), cfg.clip)
    }

    /// Rolling z-score of returns, 0 while the window is short.
    pub fn zscores(&self, series: &PriceSeries) -> Vec<Option<f64>> {
        let mut window = RollingWindow::new(self.lookback);
        series
            .returns()
            .into_iter()
            .map(|ret| {
                let r = ret?;
                window.push(r);
                if window.len() < self.min_periods {
                    return Some(0.0);
                }
                let mean = window.mean()?;
                let std = window.std()?;
                Some((r - mean) / (std + VOL_EPSILON))
            })
            .collect()
    }

    fn raw(&self, series: &PriceSeries) -> Vec<Option<f64>> {
        self.zscores(series)
            .into_iter()
            .map(|z| z.map(|z| -z.clamp(-self.clip, self.clip)))
            .collect()
    }
}

impl SignalGenerator for MeanReversionStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::MeanReversion
    }

    fn generate(&self, panel: &PricePanel) -> SignalPanel {
        per_asset(panel, |series| self.raw(series))
    }
}
