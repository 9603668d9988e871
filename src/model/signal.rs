use std::collections::BTreeSet;

use chrono::NaiveDate;

/// Per-date, per-asset scores in [-1, 1].
///
/// Built through [`SignalPanel::from_lookback`], which attributes a value
/// computed from data through date `t` to date `t + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalPanel {
    dates: Vec<NaiveDate>,
    assets: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl SignalPanel {
    pub fn zeros(dates: Vec<NaiveDate>, assets: Vec<String>) -> Self {
        let columns = vec![vec![0.0; dates.len()]; assets.len()];
        Self {
            dates,
            assets,
            columns,
        }
    }

    /// Shift each raw column one period forward, fill gaps and non-finite
    /// values with 0 and clip to [-1, 1].
    pub fn from_lookback(
        dates: Vec<NaiveDate>,
        assets: Vec<String>,
        raw: Vec<Vec<Option<f64>>>,
    ) -> Self {
        let columns = raw
            .into_iter()
            .map(|column| {
                let mut shifted = vec![0.0; dates.len()];
                for (pos, value) in column.into_iter().enumerate().take(dates.len()) {
                    if pos + 1 >= dates.len() {
                        break;
                    }
                    if let Some(v) = value.filter(|v| v.is_finite()) {
                        shifted[pos + 1] = v.clamp(-1.0, 1.0);
                    }
                }
                shifted
            })
            .collect();
        Self {
            dates,
            assets,
            columns,
        }
    }

    /// Build directly from already-attributed values. Values are still
    /// filled and clipped.
    pub fn from_columns(
        dates: Vec<NaiveDate>,
        columns: Vec<(String, Vec<f64>)>,
    ) -> Self {
        let (assets, columns): (Vec<String>, Vec<Vec<f64>>) = columns
            .into_iter()
            .map(|(asset, column)| {
                let column = column
                    .into_iter()
                    .map(|v| if v.is_finite() { v.clamp(-1.0, 1.0) } else { 0.0 })
                    .collect();
                (asset, column)
            })
            .unzip();
        Self {
            dates,
            assets,
            columns,
        }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn column(&self, asset: &str) -> Option<&[f64]> {
        let idx = self.assets.iter().position(|a| a == asset)?;
        Some(&self.columns[idx])
    }

    pub fn value(&self, date_index: usize, asset: &str) -> Option<f64> {
        self.column(asset)?.get(date_index).copied()
    }

    /// `(asset, value)` pairs for the most recent date.
    pub fn last_row(&self) -> Vec<(String, f64)> {
        let Some(last) = self.dates.len().checked_sub(1) else {
            return Vec::new();
        };
        self.assets
            .iter()
            .zip(&self.columns)
            .map(|(asset, column)| (asset.clone(), column[last]))
            .collect()
    }

    /// Assets with a non-zero value on at least one date.
    pub fn scored_assets(&self) -> Vec<String> {
        self.assets
            .iter()
            .zip(&self.columns)
            .filter(|(_, column)| column.iter().any(|v| *v != 0.0))
            .map(|(asset, _)| asset.clone())
            .collect()
    }

    /// Mean of |value| over every date and asset.
    pub fn mean_abs(&self) -> f64 {
        let count = self.columns.iter().map(Vec::len).sum::<usize>();
        if count == 0 {
            return 0.0;
        }
        let total: f64 = self.columns.iter().flatten().map(|v| v.abs()).sum();
        total / count as f64
    }

    /// Sample standard deviation of each asset's column, averaged across assets.
    pub fn mean_asset_volatility(&self) -> f64 {
        let stds: Vec<f64> = self
            .columns
            .iter()
            .filter_map(|column| crate::indicator::rolling::sample_std(column))
            .collect();
        if stds.is_empty() {
            return 0.0;
        }
        stds.iter().sum::<f64>() / stds.len() as f64
    }
}

/// Strategy name -> signal panel, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalBundle {
    entries: Vec<(String, SignalPanel)>,
}

impl SignalBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. A replaced entry keeps its original position.
    pub fn insert(&mut self, name: impl Into<String>, panel: SignalPanel) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = panel,
            None => self.entries.push((name, panel)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&SignalPanel> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, panel)| panel)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SignalPanel)> {
        self.entries.iter().map(|(n, p)| (n.as_str(), p))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every named strategy in one step.
    pub fn remove_all(&mut self, names: &BTreeSet<String>) {
        self.entries.retain(|(n, _)| !names.contains(n));
    }
}

/// Asset -> blended score for the most recent date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombinedSignal {
    entries: Vec<(String, f64)>,
}

impl CombinedSignal {
    pub fn new(entries: Vec<(String, f64)>) -> Self {
        Self { entries }
    }

    pub fn get(&self, asset: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(a, _)| a == asset)
            .map(|(_, v)| *v)
    }

    pub fn set(&mut self, asset: &str, value: f64) {
        if let Some(entry) = self.entries.iter_mut().find(|(a, _)| a == asset) {
            entry.1 = value;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(a, v)| (a.as_str(), *v))
    }

    pub fn assets(&self) -> Vec<String> {
        self.entries.iter().map(|(a, _)| a.clone()).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|(_, v)| *v).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Realign onto `universe`; assets absent here become 0.
    pub fn reindexed<S: AsRef<str>>(&self, universe: &[S]) -> Self {
        let entries = universe
            .iter()
            .map(|a| {
                let a = a.as_ref();
                (a.to_string(), self.get(a).unwrap_or(0.0))
            })
            .collect();
        Self { entries }
    }
}
