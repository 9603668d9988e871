pub mod panel;
pub mod signal;

pub use panel::{PanelFile, PricePanel, PriceSeries};
pub use signal::{CombinedSignal, SignalBundle, SignalPanel};
