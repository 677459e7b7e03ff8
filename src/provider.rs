//! Provider gateway capability.
//!
//! The gateway is the single seam between the engine and a concrete mail
//! transport (SMTP relay, HTTP email API, ...). The engine hands it bounded
//! batches and accumulates the counts it reports; it never retries
//! individual messages itself.

use std::{
    fmt,
    sync::{Arc, PoisonError, RwLock},
};

use ahash::AHashSet;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{error::ProviderError, message::OutboundMessage, normalize_email};

/// Why the engine excluded (or is reporting) an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressionReason {
    /// The subscriber opted out of all marketing mail.
    MarketingUnsubscribed,
    /// The subscription carries an explicit `marketing_opt_in = false`.
    MarketingOptOut,
    /// The address is on the global denylist.
    Suppressed,
}

impl SuppressionReason {
    /// Stable lower-case name, as logged.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MarketingUnsubscribed => "marketing_unsubscribed",
            Self::MarketingOptOut => "marketing_opt_out",
            Self::Suppressed => "suppressed",
        }
    }
}

impl fmt::Display for SuppressionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why addresses are being pushed onto the provider's own suppression list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncReason {
    /// The recipient opted out on our side.
    Unsubscribe,
    /// The address hard-bounced.
    Bounce,
    /// The recipient filed a spam complaint.
    Complaint,
}

impl SyncReason {
    /// Stable lower-case name, as sent to providers.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unsubscribe => "unsubscribe",
            Self::Bounce => "bounce",
            Self::Complaint => "complaint",
        }
    }
}

impl fmt::Display for SyncReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A per-message rejection reported by the provider.
#[derive(Debug, Clone)]
pub struct SendFailure {
    /// The rejected recipient address.
    pub email: String,
    /// Provider-supplied reason, carried opaque.
    pub reason: String,
}

/// The provider's verdict on one batch.
#[derive(Debug, Clone, Default)]
pub struct SendReceipt {
    /// Messages the provider will attempt to deliver.
    pub accepted: u64,
    /// Messages the provider rejected outright.
    pub failed: u64,
    /// Details of the rejections, not interpreted by the engine.
    pub details: Vec<SendFailure>,
}

/// Capability interface over a concrete mail transport.
#[async_trait]
pub trait ProviderGateway: Send + Sync {
    /// Hand a bounded batch of messages to the provider.
    ///
    /// Per-message rejections are data in the returned receipt. An `Err`
    /// means the transport itself failed and propagates to the job system.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot be reached at all.
    async fn send_batch(&self, messages: &[OutboundMessage]) -> Result<SendReceipt, ProviderError>;

    /// Push addresses onto the provider's own suppression list so both
    /// sides converge on who must not be mailed.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot be reached at all.
    async fn sync_suppressions(
        &self,
        emails: &[String],
        reason: SyncReason,
    ) -> Result<(), ProviderError>;
}

/// In-memory transport that records every batch it is handed.
///
/// Primarily intended for testing, but also usable for dry-run sends. A
/// rejection set (or blanket rejection) can be configured to exercise
/// partial and total provider failure paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    batches: Arc<RwLock<Vec<Vec<OutboundMessage>>>>,
    synced: Arc<RwLock<Vec<(Vec<String>, SyncReason)>>>,
    reject: AHashSet<String>,
    reject_all: bool,
}

impl MemoryProvider {
    /// Create a provider that accepts everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider that rejects every message it is handed.
    #[must_use]
    pub fn rejecting_all() -> Self {
        Self {
            reject_all: true,
            ..Self::default()
        }
    }

    /// Create a provider that rejects the given addresses.
    #[must_use]
    pub fn rejecting(emails: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        Self {
            reject: emails
                .into_iter()
                .map(|email| normalize_email(email.as_ref()))
                .collect(),
            ..Self::default()
        }
    }

    /// Every batch handed to the provider, in order.
    #[must_use]
    pub fn batches(&self) -> Vec<Vec<OutboundMessage>> {
        self.batches
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The size of each batch handed to the provider, in order.
    #[must_use]
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(Vec::len)
            .collect()
    }

    /// Every suppression sync call, in order.
    #[must_use]
    pub fn synced(&self) -> Vec<(Vec<String>, SyncReason)> {
        self.synced
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ProviderGateway for MemoryProvider {
    async fn send_batch(&self, messages: &[OutboundMessage]) -> Result<SendReceipt, ProviderError> {
        let mut receipt = SendReceipt::default();
        for message in messages {
            let rejected =
                self.reject_all || self.reject.contains(&normalize_email(&message.to_email));
            if rejected {
                receipt.failed += 1;
                receipt.details.push(SendFailure {
                    email: message.to_email.clone(),
                    reason: "rejected by test configuration".to_owned(),
                });
            } else {
                receipt.accepted += 1;
            }
        }

        self.batches
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(messages.to_vec());

        Ok(receipt)
    }

    async fn sync_suppressions(
        &self,
        emails: &[String],
        reason: SyncReason,
    ) -> Result<(), ProviderError> {
        self.synced
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((emails.to_vec(), reason));
        Ok(())
    }
}
