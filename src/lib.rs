//! Mass-email campaign sending engine
//!
//! Broadside turns a stored campaign definition into a deduplicated,
//! suppression-filtered, rendered, rate-limited stream of outbound
//! messages, while maintaining idempotent aggregate statistics and a small
//! lifecycle state machine. It only ever holds one page of recipients and
//! one batch of messages in memory at a time.
//!
//! The engine consumes narrow collaborator contracts:
//! - [`CampaignStore`], [`RecipientStore`], [`SuppressionIndex`] for the
//!   data layer (in-memory implementations in [`memory`])
//! - [`ProviderGateway`] for the concrete mail transport
//! - [`UnsubscribeLinker`] for signed unsubscribe links
//!
//! Entry point: [`CampaignSender::send`], invoked with a campaign id by an
//! at-least-once job system.

mod audience;
mod campaign;
mod config;
mod error;
mod footer;
pub mod memory;
mod message;
mod pacing;
mod provider;
mod render;
mod sender;
pub mod store;

// Re-export audience model
pub use audience::{
    EventId, EventSummary, List, ListId, ListType, Subscriber, SubscriberId, Subscription,
    SubscriptionId, SubscriptionMetadata, SubscriptionStatus, normalize_email,
};
// Re-export campaign model
pub use campaign::{Campaign, CampaignId, CampaignStatus, EmailType, RecipientStats};
// Re-export configuration
pub use config::SenderConfig;
// Re-export error types
pub use error::{ConfigError, ProviderError, SendError, StoreError};
// Re-export rendering and footer composition
pub use footer::{FooterComposer, UnsubscribeLinks};
// Re-export message types
pub use message::{Headers, MessageMetadata, OutboundMessage};
// Re-export pacing
pub use pacing::Pacing;
// Re-export provider gateway types
pub use provider::{
    MemoryProvider, ProviderGateway, SendFailure, SendReceipt, SuppressionReason, SyncReason,
};
// Re-export the render surface used by footer templates and tests
pub use render::render;
// Re-export the engine
pub use sender::{CampaignSender, SendOutcome, SkipReason};
// Re-export store contracts
pub use store::{
    CampaignStore, Cursor, RecipientPage, RecipientQuery, RecipientRow, RecipientStore,
    SuppressionIndex, UnsubscribeLinker,
};
