//! Core business logic abstractions

pub mod asset;
pub mod cache;
pub mod config;
pub mod error;
pub mod log;
pub mod provider;
pub mod quote;

// Re-export main types for cleaner imports
pub use asset::AssetClass;
pub use cache::RateCache;
pub use error::{ConvertError, FailedAttempt, Hop, InvalidRequest, ProviderError};
pub use provider::RateSource;
pub use quote::{ConversionPath, ConversionRequest, ConversionResult, RateQuote};
