use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::model::panel::PricePanel;
use crate::model::signal::{CombinedSignal, SignalBundle};
use crate::portfolio::{PortfolioWeights, WeightConstructor};
use crate::report::{round4, OutputRecord, RiskMetrics};
use crate::signal_manager::{sector_exposure, Removal, SignalManager};
use crate::strategy::fx_vol_reversion::FxVolReversionStrategy;
use crate::strategy::mean_reversion::MeanReversionStrategy;
use crate::strategy::momentum::MomentumStrategy;
use crate::strategy::stat_arb::StatArbStrategy;
use crate::strategy::SignalGenerator;

/// A generator together with the assets it runs on.
pub struct StrategySlot {
    pub generator: Box<dyn SignalGenerator>,
    pub universe: Vec<String>,
}

/// Everything one run produced, intermediate stages included.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub bundle: SignalBundle,
    pub removals: Vec<Removal>,
    pub surviving: SignalBundle,
    pub combined: CombinedSignal,
    pub final_signal: CombinedSignal,
    pub weights: PortfolioWeights,
    pub record: OutputRecord,
}

/// price panel -> strategy signals -> decorrelate -> combine -> risk -> weights.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: Config,
    manager: SignalManager,
    constructor: WeightConstructor,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        let manager = SignalManager::new(config.manager.clone(), config.sectors.clone());
        let constructor = WeightConstructor::new(config.portfolio.top_n);
        Self {
            config,
            manager,
            constructor,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn manager(&self) -> &SignalManager {
        &self.manager
    }

    /// Enabled strategies in bundle order. An empty strategy universe means
    /// the whole configured universe.
    pub fn strategies(&self) -> Vec<StrategySlot> {
        let s = &self.config.strategies;
        let universe = &self.config.universe.assets;
        let pick = |assets: &[String]| {
            if assets.is_empty() {
                universe.clone()
            } else {
                assets.to_vec()
            }
        };

        let mut slots = Vec::new();
        if s.mean_reversion.enabled {
            slots.push(StrategySlot {
                generator: Box::new(MeanReversionStrategy::from_config(&s.mean_reversion)),
                universe: pick(&s.mean_reversion.universe),
            });
        }
        if s.momentum.enabled {
            slots.push(StrategySlot {
                generator: Box::new(MomentumStrategy::from_config(&s.momentum)),
                universe: pick(&s.momentum.universe),
            });
        }
        if s.stat_arb.enabled {
            slots.push(StrategySlot {
                generator: Box::new(StatArbStrategy::from_config(&s.stat_arb)),
                universe: universe.clone(),
            });
        }
        if s.fx_vol.enabled {
            slots.push(StrategySlot {
                generator: Box::new(FxVolReversionStrategy::from_config(&s.fx_vol)),
                universe: pick(&s.fx_vol.universe),
            });
        }
        slots
    }

    pub fn generate_bundle(&self, panel: &PricePanel) -> Result<SignalBundle> {
        let mut bundle = SignalBundle::new();
        for slot in self.strategies() {
            let sub_panel = panel.select(&slot.universe)?;
            let kind = slot.generator.kind();
            let signals = slot.generator.generate(&sub_panel);
            info!(
                strategy = %kind,
                assets = signals.assets().len(),
                scored = signals.scored_assets().len(),
                "Generated strategy signals"
            );
            bundle.insert(kind.as_str(), signals);
        }
        Ok(bundle)
    }

    /// Run once over `panel`. `generated_at` is stamped into the record and
    /// also gives the run date; nothing else depends on wall-clock time.
    pub fn run(&self, panel: &PricePanel, generated_at: DateTime<Utc>) -> Result<RunOutput> {
        let universe = &self.config.universe.assets;
        panel.require_universe(universe)?;
        let panel = panel.select(universe)?;
        info!(
            assets = universe.len(),
            dates = panel.len(),
            last_date = ?panel.last_date(),
            "Running signal pipeline"
        );

        let bundle = self.generate_bundle(&panel)?;

        let (surviving, removals) = self.manager.decorrelate(&bundle);
        info!(
            surviving = ?surviving.names(),
            removed = removals.len(),
            "Decorrelation complete"
        );

        let method = self.config.manager.combination_method;
        let combined = self.manager.combine(&surviving, method).reindexed(universe);
        let final_signal = self.manager.apply_risk(&combined);
        let weights = self.constructor.build(&final_signal);
        info!(
            method = %method,
            gross = weights.gross_exposure(),
            net = weights.net_exposure(),
            "Portfolio weights built"
        );

        let record = self.build_record(&surviving, &final_signal, &weights, generated_at);
        Ok(RunOutput {
            bundle,
            removals,
            surviving,
            combined,
            final_signal,
            weights,
            record,
        })
    }

    fn build_record(
        &self,
        surviving: &SignalBundle,
        final_signal: &CombinedSignal,
        weights: &PortfolioWeights,
        generated_at: DateTime<Utc>,
    ) -> OutputRecord {
        let universe = self.config.universe.assets.clone();
        let signal = universe
            .iter()
            .map(|a| round4(final_signal.get(a).unwrap_or(0.0)))
            .collect();
        let weight = universe
            .iter()
            .map(|a| round4(weights.get(a).unwrap_or(0.0)))
            .collect();

        let signal_breakdown = surviving
            .iter()
            .map(|(name, panel)| {
                let row: BTreeMap<String, f64> = panel
                    .last_row()
                    .into_iter()
                    .map(|(asset, v)| (asset, round4(v)))
                    .collect();
                (name.to_string(), row)
            })
            .collect();

        let risk_metrics = RiskMetrics {
            max_position_size: weights.max_abs(),
            sector_exposure: sector_exposure(&weights.as_signal(), &self.config.sectors),
        };

        OutputRecord {
            date: generated_at.date_naive(),
            generation_time_utc: generated_at,
            model_version: self.config.output.model_version.clone(),
            universe,
            signal,
            weight,
            signal_breakdown,
            risk_metrics,
            target_vol: self.config.output.target_vol.clone(),
        }
    }
}
