//! In-memory implementations of the store contracts.
//!
//! These mirror what a SQL-backed deployment would provide and are
//! primarily intended for testing, though they also work for small
//! embedded setups where the audience fits in memory.
//!
//! # Concurrency
//!
//! Interior mutability uses `RwLock`; poisoned locks are recovered by
//! taking the inner value, since every write here is a plain insert.

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use ahash::AHashSet;
use async_trait::async_trait;

use crate::{
    audience::{ListId, SubscriberId, SubscriptionStatus},
    campaign::{Campaign, CampaignId, CampaignStatus, EmailType, RecipientStats},
    error::StoreError,
    normalize_email,
    store::{
        CampaignStore, Cursor, RecipientPage, RecipientQuery, RecipientRow, RecipientStore,
        SuppressionIndex, UnsubscribeLinker,
    },
};

/// In-memory campaign persistence.
#[derive(Debug, Clone, Default)]
pub struct MemoryCampaignStore {
    campaigns: Arc<RwLock<HashMap<CampaignId, Campaign>>>,
    stats: Arc<RwLock<HashMap<CampaignId, RecipientStats>>>,
}

impl MemoryCampaignStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a campaign.
    pub fn insert(&self, campaign: Campaign) {
        self.campaigns
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(campaign.id, campaign);
    }

    /// Read a campaign back, including status changes made by the sender.
    #[must_use]
    pub fn campaign(&self, id: CampaignId) -> Option<Campaign> {
        self.campaigns
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    /// Read the persisted stats row, if one was ever written.
    #[must_use]
    pub fn stats(&self, id: CampaignId) -> Option<RecipientStats> {
        self.stats
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .copied()
    }
}

#[async_trait]
impl CampaignStore for MemoryCampaignStore {
    async fn find(&self, id: CampaignId) -> Result<Option<Campaign>, StoreError> {
        Ok(self.campaign(id))
    }

    async fn update_status(
        &self,
        id: CampaignId,
        status: CampaignStatus,
    ) -> Result<(), StoreError> {
        let mut campaigns = self
            .campaigns
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let campaign = campaigns
            .get_mut(&id)
            .ok_or_else(|| StoreError::Query(format!("unknown campaign {id}")))?;
        campaign.status = status;
        Ok(())
    }

    async fn upsert_stats(
        &self,
        id: CampaignId,
        stats: &RecipientStats,
    ) -> Result<(), StoreError> {
        self.stats
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, *stats);
        Ok(())
    }
}

/// In-memory recipient store over a flat set of subscription rows.
///
/// `page` applies the same selection a SQL store would: list membership,
/// the type-specific status pre-filter, and stable ascending
/// subscription-id ordering with keyset pagination.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecipientStore {
    rows: Arc<RwLock<Vec<RecipientRow>>>,
}

impl MemoryRecipientStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscription row.
    pub fn push(&self, row: RecipientRow) {
        self.rows
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(row);
    }

    fn matches(query: &RecipientQuery, row: &RecipientRow) -> bool {
        if !query.list_ids.contains(&row.subscription.list_id) {
            return false;
        }

        match query.email_type {
            EmailType::Marketing => row.subscription.status == SubscriptionStatus::Subscribed,
            // Unsubscribed stays eligible for notification mail; only
            // unconfirmed subscriptions are excluded.
            EmailType::Notification => row.subscription.status != SubscriptionStatus::Pending,
        }
    }
}

#[async_trait]
impl RecipientStore for MemoryRecipientStore {
    async fn page(
        &self,
        query: &RecipientQuery,
        cursor: Option<Cursor>,
    ) -> Result<RecipientPage, StoreError> {
        let page_size = query.page_size.max(1);
        let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);

        let mut selected: Vec<RecipientRow> = rows
            .iter()
            .filter(|row| Self::matches(query, row))
            .filter(|row| cursor.is_none_or(|Cursor(after)| row.subscription.id > after))
            .cloned()
            .collect();
        selected.sort_by_key(|row| row.subscription.id);

        let exhausted = selected.len() <= page_size;
        selected.truncate(page_size);
        let next = if exhausted && selected.len() < page_size {
            None
        } else {
            // A full page may be the end of the selection; the next call
            // comes back empty and closes the cursor.
            selected.last().map(|row| Cursor(row.subscription.id))
        };

        Ok(RecipientPage {
            rows: selected,
            next,
        })
    }
}

/// In-memory global denylist.
#[derive(Debug, Clone, Default)]
pub struct MemorySuppressionIndex {
    emails: Arc<RwLock<AHashSet<String>>>,
}

impl MemorySuppressionIndex {
    /// Create an empty denylist.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an address to the denylist. Normalized on insert.
    pub fn insert(&self, email: &str) {
        self.emails
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(normalize_email(email));
    }
}

#[async_trait]
impl SuppressionIndex for MemorySuppressionIndex {
    async fn suppressed(&self, emails: &AHashSet<String>) -> Result<AHashSet<String>, StoreError> {
        let denylist = self.emails.read().unwrap_or_else(PoisonError::into_inner);
        Ok(emails.intersection(&denylist).cloned().collect())
    }
}

/// Linker producing deterministic unsigned URLs under a fixed base.
///
/// Stands in for the signed-link collaborator in tests and local runs.
#[derive(Debug, Clone)]
pub struct StaticLinker {
    base: String,
}

impl StaticLinker {
    /// Create a linker rooted at `base` (no trailing slash).
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }
}

impl UnsubscribeLinker for StaticLinker {
    fn unsubscribe_url(&self, subscriber: SubscriberId, list: ListId) -> String {
        format!(
            "{}/unsubscribe?subscriber={subscriber}&list={list}&scope=list",
            self.base
        )
    }

    fn unsubscribe_all_url(&self, subscriber: SubscriberId) -> String {
        format!("{}/unsubscribe?subscriber={subscriber}&scope=all", self.base)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::audience::{
        List, ListType, Subscriber, Subscription, SubscriptionId, SubscriptionMetadata,
    };

    fn row(subscription_id: u64, list_id: u64, email: &str, status: SubscriptionStatus) -> RecipientRow {
        RecipientRow {
            subscription: Subscription {
                id: SubscriptionId(subscription_id),
                subscriber_id: SubscriberId(subscription_id),
                list_id: ListId(list_id),
                status,
                status_updated_at: None,
                status_updated_by: None,
                source: None,
                metadata: SubscriptionMetadata::default(),
            },
            subscriber: Subscriber {
                id: SubscriberId(subscription_id),
                email: email.to_owned(),
                first_name: None,
                last_name: None,
                marketing_unsubscribed_at: None,
                source: None,
            },
            list: List {
                id: ListId(list_id),
                list_type: ListType::Global,
                name: "Updates".to_owned(),
                key: Some("GLOBAL_UPDATES".to_owned()),
                event: None,
            },
        }
    }

    fn query(email_type: EmailType, page_size: usize) -> RecipientQuery {
        RecipientQuery {
            list_ids: vec![ListId(1)],
            email_type,
            page_size,
        }
    }

    #[tokio::test]
    async fn pages_follow_ascending_subscription_order() {
        let store = MemoryRecipientStore::new();
        // Inserted out of order on purpose.
        store.push(row(3, 1, "c@example.com", SubscriptionStatus::Subscribed));
        store.push(row(1, 1, "a@example.com", SubscriptionStatus::Subscribed));
        store.push(row(2, 1, "b@example.com", SubscriptionStatus::Subscribed));

        let query = query(EmailType::Marketing, 2);
        let first = store.page(&query, None).await.unwrap();
        assert_eq!(first.rows.len(), 2);
        assert_eq!(first.rows[0].subscription.id, SubscriptionId(1));
        assert_eq!(first.rows[1].subscription.id, SubscriptionId(2));

        let second = store.page(&query, first.next).await.unwrap();
        assert_eq!(second.rows.len(), 1);
        assert_eq!(second.rows[0].subscription.id, SubscriptionId(3));
        assert!(second.next.is_none() || {
            let tail = store.page(&query, second.next).await.unwrap();
            tail.rows.is_empty() && tail.next.is_none()
        });
    }

    #[tokio::test]
    async fn marketing_query_sees_only_subscribed_rows() {
        let store = MemoryRecipientStore::new();
        store.push(row(1, 1, "a@example.com", SubscriptionStatus::Subscribed));
        store.push(row(2, 1, "b@example.com", SubscriptionStatus::Pending));
        store.push(row(3, 1, "c@example.com", SubscriptionStatus::Unsubscribed));

        let page = store
            .page(&query(EmailType::Marketing, 10), None)
            .await
            .unwrap();
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0].subscriber.email, "a@example.com");
    }

    #[tokio::test]
    async fn notification_query_excludes_only_pending_rows() {
        let store = MemoryRecipientStore::new();
        store.push(row(1, 1, "a@example.com", SubscriptionStatus::Subscribed));
        store.push(row(2, 1, "b@example.com", SubscriptionStatus::Pending));
        store.push(row(3, 1, "c@example.com", SubscriptionStatus::Unsubscribed));

        let page = store
            .page(&query(EmailType::Notification, 10), None)
            .await
            .unwrap();
        let emails: Vec<_> = page
            .rows
            .iter()
            .map(|r| r.subscriber.email.as_str())
            .collect();
        assert_eq!(emails, vec!["a@example.com", "c@example.com"]);
    }

    #[tokio::test]
    async fn suppression_lookup_returns_the_present_subset() {
        let index = MemorySuppressionIndex::new();
        index.insert("Blocked@Example.com");

        let asked: AHashSet<String> = ["blocked@example.com", "fine@example.com"]
            .into_iter()
            .map(str::to_owned)
            .collect();
        let hit = index.suppressed(&asked).await.unwrap();

        assert_eq!(hit.len(), 1);
        assert!(hit.contains("blocked@example.com"));
    }

    #[test]
    fn static_linker_urls_are_deterministic() {
        let linker = StaticLinker::new("https://example.com");
        assert_eq!(
            linker.unsubscribe_url(SubscriberId(4), ListId(9)),
            "https://example.com/unsubscribe?subscriber=4&list=9&scope=list"
        );
        assert_eq!(
            linker.unsubscribe_all_url(SubscriberId(4)),
            "https://example.com/unsubscribe?subscriber=4&scope=all"
        );
    }
}
