use chrono::NaiveDate;
use thiserror::Error;

/// Structural contract violations. Numeric edge cases never surface here;
/// they resolve to a neutral signal where they occur.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SignalError {
    #[error("price panel has no dates")]
    EmptyPanel,

    #[error("column '{asset}' has {actual} values, expected {expected}")]
    LengthMismatch {
        asset: String,
        expected: usize,
        actual: usize,
    },

    #[error("dates must be strictly increasing (violation at index {index})")]
    NonIncreasingDates { index: usize },

    #[error("asset '{asset}' is missing from the price panel")]
    MissingAsset { asset: String },

    #[error("asset '{asset}' appears more than once")]
    DuplicateAsset { asset: String },

    #[error("invalid price for '{asset}' on {date}: {value}")]
    InvalidPrice {
        asset: String,
        date: NaiveDate,
        value: f64,
    },

    #[error("unknown combination method '{0}', expected equal_weight or volatility_weighted")]
    UnknownCombinationMethod(String),
}

pub type Result<T> = std::result::Result<T, SignalError>;
