//! Shared fixtures for campaign flow tests.

use std::sync::Arc;

use broadside::{
    Campaign, CampaignId, CampaignSender, CampaignStatus, EmailType, EventId, EventSummary, List,
    ListId, ListType, MemoryProvider, SenderConfig, Subscriber, SubscriberId, Subscription,
    SubscriptionId, SubscriptionMetadata, SubscriptionStatus,
    memory::{MemoryCampaignStore, MemoryRecipientStore, MemorySuppressionIndex, StaticLinker},
    store::RecipientRow,
};
use chrono::{DateTime, Duration, Utc};

/// Base URL the static test linker roots unsubscribe links under.
pub const LINK_BASE: &str = "https://lists.example.com";

/// A fully wired sender over in-memory collaborators.
pub struct Harness {
    pub campaigns: Arc<MemoryCampaignStore>,
    pub recipients: Arc<MemoryRecipientStore>,
    pub suppressions: Arc<MemorySuppressionIndex>,
    pub provider: Arc<MemoryProvider>,
    pub sender: CampaignSender,
}

impl Harness {
    pub fn new(config: SenderConfig) -> Self {
        Self::with_provider(config, MemoryProvider::new())
    }

    pub fn with_provider(config: SenderConfig, provider: MemoryProvider) -> Self {
        let campaigns = Arc::new(MemoryCampaignStore::new());
        let recipients = Arc::new(MemoryRecipientStore::new());
        let suppressions = Arc::new(MemorySuppressionIndex::new());
        let provider = Arc::new(provider);

        let sender = CampaignSender::new(
            config,
            Arc::clone(&campaigns) as _,
            Arc::clone(&recipients) as _,
            Arc::clone(&suppressions) as _,
            Arc::clone(&provider) as _,
            Arc::new(StaticLinker::new(LINK_BASE)),
        );

        Self {
            campaigns,
            recipients,
            suppressions,
            provider,
            sender,
        }
    }
}

/// A small test configuration: tight batches, a rate limit high enough that
/// pacing pauses stay in the low milliseconds.
pub fn fast_config(batch_size: usize) -> SenderConfig {
    SenderConfig {
        batch_size,
        rate_limit_per_minute: 600_000,
        ..SenderConfig::default()
    }
}

pub fn marketing_campaign(id: u64, list_ids: &[u64]) -> Campaign {
    Campaign {
        id: CampaignId(id),
        email_type: EmailType::Marketing,
        subject: "Hi {{firstName}}".to_owned(),
        from_email: "news@example.com".to_owned(),
        from_name: Some("Example News".to_owned()),
        reply_to: None,
        content_html: Some("<html><body>Hello {{firstName}}</body></html>".to_owned()),
        content_text: Some("Hello {{firstName}}".to_owned()),
        content_markdown: None,
        status: CampaignStatus::Scheduled,
        scheduled_at: None,
        list_ids: list_ids.iter().copied().map(ListId).collect(),
    }
}

pub fn notification_campaign(id: u64, list_ids: &[u64]) -> Campaign {
    Campaign {
        email_type: EmailType::Notification,
        subject: "Update for {{eventName}}".to_owned(),
        content_html: None,
        content_text: Some("Hi {{firstName}}, {{eventName}} starts {{eventDate}}.".to_owned()),
        ..marketing_campaign(id, list_ids)
    }
}

/// Builder over a subscription row joined to its subscriber and list.
pub struct RowBuilder {
    subscription: Subscription,
    subscriber: Subscriber,
    list: List,
}

pub fn row(subscription_id: u64, list_id: u64, email: &str) -> RowBuilder {
    RowBuilder {
        subscription: Subscription {
            id: SubscriptionId(subscription_id),
            subscriber_id: SubscriberId(subscription_id),
            list_id: ListId(list_id),
            status: SubscriptionStatus::Subscribed,
            status_updated_at: None,
            status_updated_by: None,
            source: Some("test".to_owned()),
            metadata: SubscriptionMetadata::default(),
        },
        subscriber: Subscriber {
            id: SubscriberId(subscription_id),
            email: email.to_owned(),
            first_name: None,
            last_name: None,
            marketing_unsubscribed_at: None,
            source: Some("test".to_owned()),
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

impl RowBuilder {
    pub fn subscriber_id(mut self, id: u64) -> Self {
        self.subscription.subscriber_id = SubscriberId(id);
        self.subscriber.id = SubscriberId(id);
        self
    }

    pub fn status(mut self, status: SubscriptionStatus) -> Self {
        self.subscription.status = status;
        self
    }

    pub fn first_name(mut self, name: &str) -> Self {
        self.subscriber.first_name = Some(name.to_owned());
        self
    }

    pub fn last_name(mut self, name: &str) -> Self {
        self.subscriber.last_name = Some(name.to_owned());
        self
    }

    pub fn marketing_unsubscribed(mut self) -> Self {
        self.subscriber.marketing_unsubscribed_at = Some(Utc::now() - Duration::days(1));
        self
    }

    pub fn opt_in(mut self, value: bool) -> Self {
        self.subscription.metadata.marketing_opt_in = Some(value);
        self
    }

    pub fn event_list(mut self, event_id: u64, name: &str, starts_at: DateTime<Utc>) -> Self {
        self.list.list_type = ListType::Event;
        self.list.key = None;
        self.list.name = name.to_owned();
        self.list.event = Some(EventSummary {
            id: EventId(event_id),
            name: name.to_owned(),
            starts_at: Some(starts_at),
        });
        self
    }

    pub fn build(self) -> RecipientRow {
        RecipientRow {
            subscription: self.subscription,
            subscriber: self.subscriber,
            list: self.list,
        }
    }
}
