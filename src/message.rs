//! Ephemeral outbound message representation.
//!
//! An [`OutboundMessage`] is built per eligible recipient, handed to the
//! provider gateway in a batch, and discarded. Nothing here is persisted.

use crate::{
    audience::{EventId, ListId},
    campaign::{CampaignId, EmailType},
};

/// Header naming the campaign's email type.
pub const HEADER_EMAIL_TYPE: &str = "X-Broadside-Email-Type";
/// Header naming the originating campaign.
pub const HEADER_CAMPAIGN_ID: &str = "X-Broadside-Campaign-Id";
/// Header naming the list membership that produced the message.
pub const HEADER_LIST_ID: &str = "X-Broadside-List-Id";
/// Header naming the event an event-scoped list belongs to.
pub const HEADER_EVENT_ID: &str = "X-Broadside-Event-Id";
/// Standard one-click unsubscribe header (marketing mail only).
pub const HEADER_LIST_UNSUBSCRIBE: &str = "List-Unsubscribe";

/// Ordered collection of message headers.
#[derive(Debug, Clone, Default)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    /// Append a header.
    pub fn push(&mut self, name: &str, value: impl Into<String>) {
        self.0.push((name.to_owned(), value.into()));
    }

    /// Look up the first header with the given name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate over headers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no headers have been set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Routing metadata carried alongside a message for provider bookkeeping.
#[derive(Debug, Clone)]
pub struct MessageMetadata {
    /// Originating campaign.
    pub campaign_id: CampaignId,
    /// List membership that produced the message.
    pub list_id: ListId,
    /// Owning event for event-scoped lists.
    pub event_id: Option<EventId>,
    /// Campaign email type.
    pub email_type: EmailType,
}

/// A fully rendered message ready for the provider gateway.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    /// Recipient address, as stored on the subscriber record.
    pub to_email: String,
    /// Recipient display name, when a name is on record.
    pub to_name: Option<String>,
    /// Rendered subject line.
    pub subject: String,
    /// Envelope sender address.
    pub from_email: String,
    /// Sender display name.
    pub from_name: Option<String>,
    /// Reply-To address.
    pub reply_to: Option<String>,
    /// Rendered HTML body, if the campaign has one.
    pub html: Option<String>,
    /// Rendered plain-text body, if the campaign has one.
    pub text: Option<String>,
    /// Per-message headers.
    pub headers: Headers,
    /// Routing metadata.
    pub metadata: MessageMetadata,
}
