pub mod bar;
pub mod quote;

// Re-export for convenient access (e.g. `use crate::market_data::BarSeries`).
pub use bar::{Bar, BarSeries};
pub use quote::Quote;
