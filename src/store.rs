//! Collaborator contracts for the data layer.
//!
//! The sender only ever consumes these narrow interfaces; the concrete
//! backing (SQL, HTTP, in-memory) is a deployment concern. In-memory
//! implementations suitable for tests and embedding live in
//! [`crate::memory`].

use ahash::AHashSet;
use async_trait::async_trait;

use crate::{
    audience::{List, ListId, Subscriber, SubscriberId, Subscription, SubscriptionId},
    campaign::{Campaign, CampaignId, CampaignStatus, EmailType, RecipientStats},
    error::StoreError,
    normalize_email,
};

/// Paging cursor over the recipient store: the last subscription id of the
/// previous page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor(pub SubscriptionId);

/// The recipient selection for one campaign run.
///
/// The store applies the type-specific status pre-filter at the query
/// level: marketing campaigns see only `subscribed` rows, notification
/// campaigns see everything except `pending`.
#[derive(Debug, Clone)]
pub struct RecipientQuery {
    /// Lists the campaign targets.
    pub list_ids: Vec<ListId>,
    /// Campaign type, driving the status pre-filter.
    pub email_type: EmailType,
    /// Maximum rows per page.
    pub page_size: usize,
}

/// One subscription row joined to its subscriber and list.
#[derive(Debug, Clone)]
pub struct RecipientRow {
    /// The subscription record.
    pub subscription: Subscription,
    /// The owning subscriber.
    pub subscriber: Subscriber,
    /// The list subscribed to, with event details for event-scoped lists.
    pub list: List,
}

impl RecipientRow {
    /// The subscriber's normalized email, or `None` when no usable address
    /// is on record.
    #[must_use]
    pub fn normalized_email(&self) -> Option<String> {
        let email = normalize_email(&self.subscriber.email);
        if email.is_empty() { None } else { Some(email) }
    }
}

/// One page of recipient rows in stable ascending subscription-id order.
#[derive(Debug, Clone, Default)]
pub struct RecipientPage {
    /// Rows in page order.
    pub rows: Vec<RecipientRow>,
    /// Cursor for the next page, or `None` when the selection is exhausted.
    pub next: Option<Cursor>,
}

/// Read-only paged access to subscription rows joined to subscriber and
/// list data.
#[async_trait]
pub trait RecipientStore: Send + Sync {
    /// Fetch the page following `cursor` (or the first page for `None`).
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    async fn page(
        &self,
        query: &RecipientQuery,
        cursor: Option<Cursor>,
    ) -> Result<RecipientPage, StoreError>;
}

/// The global send denylist.
#[async_trait]
pub trait SuppressionIndex: Send + Sync {
    /// Return the subset of `emails` present on the denylist.
    ///
    /// Callers pass only the distinct normalized addresses of the page in
    /// hand, keeping the query bounded.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be queried.
    async fn suppressed(&self, emails: &AHashSet<String>) -> Result<AHashSet<String>, StoreError>;
}

/// Persistence for campaign status and aggregate run statistics.
#[async_trait]
pub trait CampaignStore: Send + Sync {
    /// Load a campaign with its associated list ids.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    async fn find(&self, id: CampaignId) -> Result<Option<Campaign>, StoreError>;

    /// Persist a status transition.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    async fn update_status(&self, id: CampaignId, status: CampaignStatus)
    -> Result<(), StoreError>;

    /// Upsert the campaign's stats row, overwriting any counters left by an
    /// earlier partial run. Delivered/bounced counters on the same row are
    /// owned by the webhook consumer and must not be touched.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    async fn upsert_stats(
        &self,
        id: CampaignId,
        stats: &RecipientStats,
    ) -> Result<(), StoreError>;
}

/// Builds signed, time-limited unsubscribe links.
///
/// The signing algorithm is a collaborator concern; the sender only embeds
/// the returned URLs in merge fields, footers, and `List-Unsubscribe`
/// headers.
pub trait UnsubscribeLinker: Send + Sync {
    /// URL that unsubscribes `subscriber` from `list` only.
    fn unsubscribe_url(&self, subscriber: SubscriberId, list: ListId) -> String;

    /// URL that unsubscribes `subscriber` from all marketing mail.
    fn unsubscribe_all_url(&self, subscriber: SubscriberId) -> String;
}
