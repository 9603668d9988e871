use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{debug, info, warn};

use crate::config::{CombinationMethod, ManagerConfig, SectorMap};
use crate::indicator::correlation::pearson;
use crate::model::signal::{CombinedSignal, SignalBundle, SignalPanel};

/// A strategy dropped by [`SignalManager::decorrelate`].
#[derive(Debug, Clone, PartialEq)]
pub struct Removal {
    pub removed: String,
    pub kept: String,
    pub correlation: f64,
}

/// Redundancy removal, blending and risk limits over one run's strategy signals.
#[derive(Debug, Clone)]
pub struct SignalManager {
    config: ManagerConfig,
    sectors: SectorMap,
}

impl SignalManager {
    pub fn new(config: ManagerConfig, sectors: SectorMap) -> Self {
        Self { config, sectors }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn sectors(&self) -> &SectorMap {
        &self.sectors
    }

    /// Drop strategies that are redundant with another one on the assets
    /// both actually score. Returns the surviving bundle and what was removed.
    pub fn decorrelate(&self, bundle: &SignalBundle) -> (SignalBundle, Vec<Removal>) {
        let removals = self.find_removals(bundle);
        let names: BTreeSet<String> = removals.iter().map(|r| r.removed.clone()).collect();
        let mut cleaned = bundle.clone();
        cleaned.remove_all(&names);
        (cleaned, removals)
    }

    /// Pairwise comparison over a read-only view of `bundle`, in insertion
    /// order. A strategy marked for removal takes part in no later comparison.
    pub fn find_removals(&self, bundle: &SignalBundle) -> Vec<Removal> {
        let entries: Vec<(&str, &SignalPanel)> = bundle.iter().collect();
        let scored: Vec<Vec<String>> = entries.iter().map(|(_, p)| p.scored_assets()).collect();
        let mut removed: BTreeSet<&str> = BTreeSet::new();
        let mut removals = Vec::new();

        for i in 0..entries.len() {
            for j in (i + 1)..entries.len() {
                let (name_a, panel_a) = entries[i];
                let (name_b, panel_b) = entries[j];
                if removed.contains(name_a) {
                    break;
                }
                if removed.contains(name_b) {
                    continue;
                }

                let common: Vec<&str> = scored[i]
                    .iter()
                    .filter(|asset| scored[j].contains(*asset))
                    .map(String::as_str)
                    .collect();
                if common.is_empty() {
                    debug!(first = name_a, second = name_b, "No shared assets, skipping");
                    continue;
                }

                let Some(correlation) = self.shared_correlation(panel_a, panel_b, &common) else {
                    debug!(
                        first = name_a,
                        second = name_b,
                        "Not enough overlapping history, skipping"
                    );
                    continue;
                };
                if correlation.abs() <= self.config.max_correlation {
                    continue;
                }

                let strength_a = panel_a.mean_abs();
                let strength_b = panel_b.mean_abs();
                let (loser, winner) = if strength_a < strength_b {
                    (name_a, name_b)
                } else if strength_b < strength_a {
                    (name_b, name_a)
                } else {
                    debug!(
                        first = name_a,
                        second = name_b,
                        correlation,
                        "Correlated but equally strong, keeping both"
                    );
                    continue;
                };

                info!(
                    removed = loser,
                    kept = winner,
                    correlation,
                    "Removing strategy due to high correlation"
                );
                removed.insert(loser);
                removals.push(Removal {
                    removed: loser.to_string(),
                    kept: winner.to_string(),
                    correlation,
                });
                if loser == name_a {
                    break;
                }
            }
        }

        removals
    }

    /// Correlation of the two strategies' per-date means over `assets`,
    /// restricted to the dates both panels carry. `None` when either side or
    /// the intersection has fewer than `min_overlap` rows.
    fn shared_correlation(
        &self,
        a: &SignalPanel,
        b: &SignalPanel,
        assets: &[&str],
    ) -> Option<f64> {
        let min_overlap = self.config.min_overlap;
        if a.len() < min_overlap || b.len() < min_overlap {
            return None;
        }

        let means_a = row_means(a, assets)?;
        let means_b: HashMap<_, _> = b.dates().iter().copied().zip(row_means(b, assets)?).collect();

        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for (date, x) in a.dates().iter().zip(means_a) {
            if let Some(y) = means_b.get(date) {
                xs.push(x);
                ys.push(*y);
            }
        }
        if xs.len() < min_overlap {
            return None;
        }
        Some(pearson(&xs, &ys))
    }

    /// Blend the latest row of every strategy into one score per asset.
    pub fn combine(&self, bundle: &SignalBundle, method: CombinationMethod) -> CombinedSignal {
        if bundle.is_empty() {
            warn!("No strategies left to combine, signal is neutral");
            return CombinedSignal::default();
        }

        let mut assets: Vec<String> = Vec::new();
        for (_, panel) in bundle.iter() {
            for asset in panel.assets() {
                if !assets.contains(asset) {
                    assets.push(asset.clone());
                }
            }
        }

        let weights = strategy_weights(bundle, method);
        if weights.is_empty() {
            warn!(method = %method, "Every strategy has zero volatility, signal is neutral");
            return CombinedSignal::new(assets.into_iter().map(|a| (a, 0.0)).collect());
        }
        for (name, weight) in &weights {
            debug!(strategy = %name, weight, method = %method, "Strategy weight");
        }

        let latest: Vec<(f64, HashMap<String, f64>)> = weights
            .iter()
            .filter_map(|(name, w)| {
                let panel = bundle.get(name)?;
                Some((*w, panel.last_row().into_iter().collect()))
            })
            .collect();

        let entries = assets
            .into_iter()
            .map(|asset| {
                let mut num = 0.0;
                let mut den = 0.0;
                for (w, row) in &latest {
                    if let Some(v) = row.get(&asset) {
                        num += w * v;
                        den += w;
                    }
                }
                let value = if den > 0.0 { num / den } else { 0.0 };
                (asset, value)
            })
            .collect();
        CombinedSignal::new(entries)
    }

    /// Clip each position, then shrink any sector whose gross exposure is
    /// above the limit. Signs are preserved.
    pub fn apply_risk(&self, combined: &CombinedSignal) -> CombinedSignal {
        let cap = self.config.max_position_size;
        let mut controlled = CombinedSignal::new(
            combined
                .iter()
                .map(|(asset, v)| (asset.to_string(), v.clamp(-cap, cap)))
                .collect(),
        );

        let exposures = sector_exposure(&controlled, &self.sectors);
        for (sector, exposure) in exposures {
            if exposure <= self.config.max_sector_exposure {
                continue;
            }
            let scale = self.config.max_sector_exposure / exposure;
            info!(sector = %sector, exposure, scale, "Scaling down sector exposure");
            let members = self
                .sectors
                .iter()
                .find(|(name, _)| *name == sector)
                .map(|(_, members)| members.to_vec())
                .unwrap_or_default();
            for asset in members {
                if let Some(v) = controlled.get(&asset) {
                    controlled.set(&asset, v * scale);
                }
            }
        }
        controlled
    }
}

/// Gross exposure per sector over the assets present in `values`. Sectors
/// with no present member are omitted.
pub fn sector_exposure(values: &CombinedSignal, sectors: &SectorMap) -> BTreeMap<String, f64> {
    let mut out = BTreeMap::new();
    for (sector, members) in sectors.iter() {
        let present: Vec<f64> = members.iter().filter_map(|a| values.get(a)).collect();
        if present.is_empty() {
            continue;
        }
        out.insert(sector.to_string(), present.iter().map(|v| v.abs()).sum());
    }
    out
}

fn row_means(panel: &SignalPanel, assets: &[&str]) -> Option<Vec<f64>> {
    let columns: Vec<&[f64]> = assets
        .iter()
        .map(|a| panel.column(a))
        .collect::<Option<Vec<_>>>()?;
    let n = columns.len() as f64;
    Some(
        (0..panel.len())
            .map(|row| columns.iter().map(|c| c[row]).sum::<f64>() / n)
            .collect(),
    )
}

/// Normalised strategy weights. Strategies with zero signal volatility are
/// left out of the inverse-volatility scheme.
fn strategy_weights(bundle: &SignalBundle, method: CombinationMethod) -> Vec<(String, f64)> {
    let raw: Vec<(String, f64)> = match method {
        CombinationMethod::EqualWeight => bundle.iter().map(|(n, _)| (n.to_string(), 1.0)).collect(),
        CombinationMethod::VolatilityWeighted => bundle
            .iter()
            .filter_map(|(name, panel)| {
                let vol = panel.mean_asset_volatility();
                (vol > 0.0).then(|| (name.to_string(), 1.0 / vol))
            })
            .collect(),
    };
    let total: f64 = raw.iter().map(|(_, w)| w).sum();
    if total <= 0.0 || !total.is_finite() {
        return Vec::new();
    }
    raw.into_iter().map(|(n, w)| (n, w / total)).collect()
}
