use std::cmp::Ordering;

use crate::model::signal::CombinedSignal;

/// Asset -> portfolio weight, in signal order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortfolioWeights {
    entries: Vec<(String, f64)>,
}

impl PortfolioWeights {
    pub fn get(&self, asset: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(a, _)| a == asset)
            .map(|(_, w)| *w)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(a, w)| (a.as_str(), *w))
    }

    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|(_, w)| *w).collect()
    }

    pub fn gross_exposure(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w.abs()).sum()
    }

    pub fn net_exposure(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w).sum()
    }

    pub fn max_abs(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w.abs()).fold(0.0, f64::max)
    }

    /// The same weights viewed as a per-asset signal, for exposure reporting.
    pub fn as_signal(&self) -> CombinedSignal {
        CombinedSignal::new(self.entries.clone())
    }
}

/// Long the `top_n` highest scores, short the `top_n` lowest, equal size,
/// unit gross exposure.
#[derive(Debug, Clone)]
pub struct WeightConstructor {
    top_n: usize,
}

impl WeightConstructor {
    pub fn new(top_n: usize) -> Self {
        Self {
            top_n: top_n.max(1),
        }
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// Ties keep the signal's original order. An asset that lands in both
    /// the long and the short set ends up short. An all-zero selection
    /// leaves every weight at 0.
    pub fn build(&self, signal: &CombinedSignal) -> PortfolioWeights {
        let values: Vec<(String, f64)> = signal.iter().map(|(a, v)| (a.to_string(), v)).collect();
        let mut weights: Vec<(String, f64)> = values.iter().map(|(a, _)| (a.clone(), 0.0)).collect();

        let mut order: Vec<usize> = (0..values.len()).collect();
        order.sort_by(|&i, &j| {
            values[j].1.partial_cmp(&values[i].1).unwrap_or(Ordering::Equal)
        });
        let longs: Vec<usize> = order.iter().copied().take(self.top_n).collect();

        let mut order: Vec<usize> = (0..values.len()).collect();
        order.sort_by(|&i, &j| {
            values[i].1.partial_cmp(&values[j].1).unwrap_or(Ordering::Equal)
        });
        let shorts: Vec<usize> = order.iter().copied().take(self.top_n).collect();

        let degenerate = longs
            .iter()
            .chain(&shorts)
            .all(|&i| values[i].1 == 0.0);
        if degenerate {
            return PortfolioWeights { entries: weights };
        }

        for &i in &longs {
            weights[i].1 = 1.0;
        }
        for &i in &shorts {
            weights[i].1 = -1.0;
        }

        let gross: f64 = weights.iter().map(|(_, w)| w.abs()).sum();
        if gross > 0.0 {
            for (_, w) in weights.iter_mut() {
                *w /= gross;
            }
        }
        PortfolioWeights { entries: weights }
    }
}
