use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SignalError};

/// On-disk panel layout: one date axis, one nullable price column per asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelFile {
    pub dates: Vec<NaiveDate>,
    pub prices: BTreeMap<String, Vec<Option<f64>>>,
}

impl TryFrom<PanelFile> for PricePanel {
    type Error = SignalError;

    fn try_from(file: PanelFile) -> Result<Self> {
        PricePanel::new(file.dates, file.prices.into_iter().collect())
    }
}

/// Present observations of one asset, in date order.
///
/// `positions[i]` is the index on the owning panel's date axis of `prices[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    pub asset: String,
    pub positions: Vec<usize>,
    pub prices: Vec<f64>,
}

impl PriceSeries {
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Simple returns `p[k] / p[k-1] - 1`, aligned so `returns[k]` belongs to
    /// observation `k`. The first observation has no return.
    pub fn returns(&self) -> Vec<Option<f64>> {
        let mut out = Vec::with_capacity(self.prices.len());
        for (k, price) in self.prices.iter().enumerate() {
            if k == 0 {
                out.push(None);
                continue;
            }
            let prev = self.prices[k - 1];
            out.push(Some(price / prev - 1.0));
        }
        out
    }
}

/// Daily closes for a set of assets on a shared, strictly increasing date axis.
/// Gaps are `None`; present values are finite and positive.
#[derive(Debug, Clone, PartialEq)]
pub struct PricePanel {
    dates: Vec<NaiveDate>,
    assets: Vec<String>,
    columns: Vec<Vec<Option<f64>>>,
}

impl PricePanel {
    pub fn new(dates: Vec<NaiveDate>, columns: Vec<(String, Vec<Option<f64>>)>) -> Result<Self> {
        if dates.is_empty() {
            return Err(SignalError::EmptyPanel);
        }
        if let Some(index) = dates.windows(2).position(|w| w[1] <= w[0]) {
            return Err(SignalError::NonIncreasingDates { index: index + 1 });
        }

        let mut seen = HashSet::new();
        let mut assets = Vec::with_capacity(columns.len());
        let mut values = Vec::with_capacity(columns.len());
        for (asset, column) in columns {
            if !seen.insert(asset.clone()) {
                return Err(SignalError::DuplicateAsset { asset });
            }
            if column.len() != dates.len() {
                return Err(SignalError::LengthMismatch {
                    asset,
                    expected: dates.len(),
                    actual: column.len(),
                });
            }
            for (date, value) in dates.iter().zip(&column) {
                if let Some(v) = value {
                    if !v.is_finite() || *v <= 0.0 {
                        return Err(SignalError::InvalidPrice {
                            asset,
                            date: *date,
                            value: *v,
                        });
                    }
                }
            }
            assets.push(asset);
            values.push(column);
        }

        Ok(Self {
            dates,
            assets,
            columns: values,
        })
    }

    /// Outer-join per-asset `(date, price)` series onto one date axis.
    pub fn outer_join(series: Vec<(String, Vec<(NaiveDate, f64)>)>) -> Result<Self> {
        let axis: BTreeSet<NaiveDate> = series
            .iter()
            .flat_map(|(_, points)| points.iter().map(|(d, _)| *d))
            .collect();
        let dates: Vec<NaiveDate> = axis.into_iter().collect();

        let mut columns = Vec::with_capacity(series.len());
        for (asset, points) in series {
            let mut by_date = BTreeMap::new();
            for (date, price) in points {
                if by_date.insert(date, price).is_some() {
                    return Err(SignalError::NonIncreasingDates {
                        index: dates.binary_search(&date).unwrap_or(0),
                    });
                }
            }
            let column = dates.iter().map(|d| by_date.get(d).copied()).collect();
            columns.push((asset, column));
        }
        Self::new(dates, columns)
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

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn contains(&self, asset: &str) -> bool {
        self.assets.iter().any(|a| a == asset)
    }

    pub fn column(&self, asset: &str) -> Option<&[Option<f64>]> {
        let idx = self.assets.iter().position(|a| a == asset)?;
        Some(&self.columns[idx])
    }

    pub fn series(&self, asset: &str) -> Option<PriceSeries> {
        let column = self.column(asset)?;
        let mut positions = Vec::new();
        let mut prices = Vec::new();
        for (pos, value) in column.iter().enumerate() {
            if let Some(v) = value {
                positions.push(pos);
                prices.push(*v);
            }
        }
        Some(PriceSeries {
            asset: asset.to_string(),
            positions,
            prices,
        })
    }

    /// Sub-panel with the requested assets, in the requested order.
    pub fn select<S: AsRef<str>>(&self, assets: &[S]) -> Result<Self> {
        let mut columns = Vec::with_capacity(assets.len());
        for asset in assets {
            let asset = asset.as_ref();
            let column = self
                .column(asset)
                .ok_or_else(|| SignalError::MissingAsset {
                    asset: asset.to_string(),
                })?;
            columns.push((asset.to_string(), column.to_vec()));
        }
        Self::new(self.dates.clone(), columns)
    }

    /// Fail on the first configured asset the panel does not carry.
    pub fn require_universe<S: AsRef<str>>(&self, universe: &[S]) -> Result<()> {
        match universe.iter().find(|a| !self.contains(a.as_ref())) {
            Some(asset) => Err(SignalError::MissingAsset {
                asset: asset.as_ref().to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn rejects_non_increasing_dates() {
        let err = PricePanel::new(
            vec![day(1), day(3), day(2)],
            vec![("SPY".to_string(), vec![Some(1.0); 3])],
        )
        .unwrap_err();
        assert_eq!(err, SignalError::NonIncreasingDates { index: 2 });
    }

    #[test]
    fn rejects_nan_and_names_the_asset() {
        let err = PricePanel::new(
            vec![day(1), day(2)],
            vec![("GLD".to_string(), vec![Some(1.0), Some(f64::NAN)])],
        )
        .unwrap_err();
        match err {
            SignalError::InvalidPrice { asset, date, .. } => {
                assert_eq!(asset, "GLD");
                assert_eq!(date, day(2));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_short_column() {
        let err = PricePanel::new(
            vec![day(1), day(2)],
            vec![("QQQ".to_string(), vec![Some(1.0)])],
        )
        .unwrap_err();
        assert!(matches!(err, SignalError::LengthMismatch { .. }));
    }

    #[test]
    fn outer_join_leaves_gaps() {
        let panel = PricePanel::outer_join(vec![
            ("A".to_string(), vec![(day(1), 1.0), (day(3), 3.0)]),
            ("B".to_string(), vec![(day(2), 2.0)]),
        ])
        .unwrap();
        assert_eq!(panel.dates(), &[day(1), day(2), day(3)]);
        assert_eq!(panel.column("A").unwrap(), &[Some(1.0), None, Some(3.0)]);
        assert_eq!(panel.column("B").unwrap(), &[None, Some(2.0), None]);

        let series = panel.series("A").unwrap();
        assert_eq!(series.positions, vec![0, 2]);
        assert_eq!(series.prices, vec![1.0, 3.0]);
    }

    #[test]
    fn panel_file_round_trip_through_json() {
        let json = r#"{
            "dates": ["2024-01-01", "2024-01-02"],
            "prices": { "SPY": [470.5, null], "GLD": [190.1, 191.0] }
        }"#;
        let file: PanelFile = serde_json::from_str(json).unwrap();
        let panel = PricePanel::try_from(file).unwrap();
        assert_eq!(panel.assets(), &["GLD".to_string(), "SPY".to_string()]);
        assert_eq!(panel.column("SPY").unwrap(), &[Some(470.5), None]);
    }

    #[test]
    fn select_reports_missing_asset() {
        let panel = PricePanel::new(
            vec![day(1)],
            vec![("SPY".to_string(), vec![Some(1.0)])],
        )
        .unwrap();
        let err = panel.select(&["SPY", "IWM"]).unwrap_err();
        assert_eq!(
            err,
            SignalError::MissingAsset {
                asset: "IWM".to_string()
            }
        );
        assert!(panel.require_universe(&["SPY"]).is_ok());
    }
}
