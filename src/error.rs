//! Typed error handling for campaign sending.
//!
//! This module provides structured error types that distinguish between:
//! - Store failures (recipient/campaign/suppression backends unavailable)
//! - Provider failures (the outbound gateway could not take a batch at all)
//! - Configuration errors (unreadable or malformed configuration)
//!
//! Partial batch failures are *not* errors: the provider reports them as
//! counts inside a [`crate::SendReceipt`] and the run continues. An `Err`
//! from this module propagates to the job system driving the sender, which
//! owns retry and backoff policy.

use thiserror::Error;

/// Top-level error type for a campaign send run.
#[derive(Debug, Error)]
pub enum SendError {
    /// A backing store could not be queried or written.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The provider gateway failed at the transport level.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Errors raised by the campaign, recipient, and suppression stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A query failed or returned data the engine cannot use.
    #[error("Query failed: {0}")]
    Query(String),
}

/// Errors raised by a provider gateway transport.
///
/// These indicate the gateway itself failed (connection refused, malformed
/// response), not that individual messages were rejected. Per-message
/// rejections travel inside [`crate::SendReceipt`].
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The transport to the provider failed.
    #[error("Transport failure: {0}")]
    Transport(String),
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Unable to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file could not be parsed.
    #[error("Unable to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}
