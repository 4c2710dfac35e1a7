//! Core business logic abstractions

pub mod attributes;
pub mod cache;
pub mod conditions;
pub mod config;
pub mod currency;
pub mod entry;
pub mod instrument;
pub mod log;

// Re-export main types for cleaner imports
pub use currency::{ConversionResolution, CurrencyRateProvider};
pub use instrument::{InstrumentProvider, InstrumentType, SearchHit, StockInfo};
