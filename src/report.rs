use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// Largest absolute final weight.
    pub max_position_size: f64,
    /// Sector -> sum of absolute final weights.
    pub sector_exposure: BTreeMap<String, f64>,
}

/// The hand-off record for publishing. Field names and order are part of the
/// downstream contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub date: NaiveDate,
    pub generation_time_utc: DateTime<Utc>,
    pub model_version: String,
    pub universe: Vec<String>,
    pub signal: Vec<f64>,
    pub weight: Vec<f64>,
    /// Strategy -> asset -> latest-date signal, surviving strategies only.
    pub signal_breakdown: BTreeMap<String, BTreeMap<String, f64>>,
    pub risk_metrics: RiskMetrics,
    pub target_vol: String,
}

impl OutputRecord {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// SHA-256 of the pretty JSON, hex encoded.
    pub fn digest(&self) -> serde_json::Result<String> {
        let json = self.to_json_pretty()?;
        Ok(digest_bytes(json.as_bytes()))
    }

    pub fn file_stem(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

pub fn digest_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Round to 4 decimals for publishing; `-0.0` becomes `0.0`.
pub fn round4(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value * 10_000.0).round() / 10_000.0 + 0.0
}
