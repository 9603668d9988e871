pub mod correlation;
pub mod rolling;
