//! Audience model: lists, subscribers, and subscriptions.
//!
//! All of these types are read-only to the sending engine; they are written
//! by the upstream subscription-management flows.

use std::fmt;

use ahash::AHashMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque list identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListId(pub u64);

/// Opaque subscriber identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriberId(pub u64);

/// Opaque subscription identifier.
///
/// Subscription ids are the stable ascending key recipient pages are
/// ordered by, which makes dedup winner selection deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

/// Opaque event identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub u64);

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The scope of an audience list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListType {
    /// A site-wide audience, addressed by a stable key.
    Global,
    /// An audience tied to a single event.
    Event,
}

/// Display details of the event an event-scoped list belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSummary {
    /// Event identifier.
    pub id: EventId,
    /// Display name, used as the `{{eventName}}` merge field.
    pub name: String,
    /// Start time, used as the `{{eventDate}}` merge field.
    pub starts_at: Option<DateTime<Utc>>,
}

/// A named audience that subscriptions attach to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct List {
    /// List identifier.
    pub id: ListId,
    /// Whether the list is global or event-scoped.
    pub list_type: ListType,
    /// Display name.
    pub name: String,
    /// Stable lookup key; global lists only.
    pub key: Option<String>,
    /// Back-reference to the owning event; event lists only.
    pub event: Option<EventSummary>,
}

/// A unique email address with optional profile and a global marketing
/// opt-out flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscriber {
    /// Subscriber identifier.
    pub id: SubscriberId,
    /// Email address as stored. Normalize with [`normalize_email`] before
    /// comparing.
    pub email: String,
    /// First name, if known.
    pub first_name: Option<String>,
    /// Last name, if known.
    pub last_name: Option<String>,
    /// When set, the subscriber opted out of *all* marketing mail,
    /// regardless of per-list subscription status.
    pub marketing_unsubscribed_at: Option<DateTime<Utc>>,
    /// Provenance of the record.
    pub source: Option<String>,
}

/// A subscriber's standing on one list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Signed up but not confirmed. Receives nothing.
    Pending,
    /// Confirmed. Receives everything the list's campaigns send.
    Subscribed,
    /// Opted out of the list. Still receives notification-type mail; this
    /// asymmetry is intentional.
    Unsubscribed,
}

/// Free-form per-subscription metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscriptionMetadata {
    /// Explicit marketing consent flag. Absent means consent: only a
    /// recorded `false` excludes the subscription from marketing mail.
    #[serde(default)]
    pub marketing_opt_in: Option<bool>,

    /// Anything else upstream flows attach.
    #[serde(default)]
    pub extra: AHashMap<String, String>,
}

impl SubscriptionMetadata {
    /// Whether this subscription may receive marketing mail on the basis of
    /// its own metadata.
    #[must_use]
    pub fn marketing_opted_in(&self) -> bool {
        self.marketing_opt_in != Some(false)
    }
}

/// A subscriber's relationship to one list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    /// Subscription identifier and page-ordering key.
    pub id: SubscriptionId,
    /// Owning subscriber.
    pub subscriber_id: SubscriberId,
    /// List subscribed to.
    pub list_id: ListId,
    /// Current standing.
    pub status: SubscriptionStatus,
    /// When the status last changed.
    pub status_updated_at: Option<DateTime<Utc>>,
    /// Who or what changed the status.
    pub status_updated_by: Option<String>,
    /// Provenance of the record.
    pub source: Option<String>,
    /// Free-form metadata, notably the marketing consent flag.
    pub metadata: SubscriptionMetadata,
}

/// Normalize an email address for dedup and suppression comparison.
#[must_use]
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}
