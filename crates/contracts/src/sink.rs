//! BundleSink trait - Dispatcher output interface
//!
//! Defines the abstract interface for sinks.

use crate::{ContractError, EpochBundle};

/// Data output trait
///
/// All sink implementations must implement this trait.
#[trait_variant::make(BundleSink: Send)]
pub trait LocalBundleSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write an epoch bundle
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, bundle: &EpochBundle) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
