pub mod config;
pub mod error;
pub mod indicator;
pub mod model;
pub mod pipeline;
pub mod portfolio;
pub mod report;
pub mod signal_manager;
pub mod strategy;

pub use config::Config;
pub use error::SignalError;
pub use pipeline::{Pipeline, RunOutput};
