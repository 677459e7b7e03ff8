//! Campaign lifecycle types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::audience::ListId;

/// Opaque campaign identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CampaignId(pub u64);

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle status of a campaign.
///
/// Transitions owned by the sender: `scheduled → sending → {sent | failed}`.
/// `draft` campaigns are created and promoted by an external authoring flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    /// Being authored; never picked up by the sender.
    Draft,
    /// Ready to send, possibly at a future `scheduled_at`.
    Scheduled,
    /// A send run is (or was, if the run died) in progress.
    Sending,
    /// The run completed and the provider accepted at least part of it,
    /// or there was nobody to send to.
    Sent,
    /// The campaign had no lists, or the provider accepted nothing despite
    /// targeted recipients.
    Failed,
}

impl CampaignStatus {
    /// Whether a send trigger for a campaign in this status should proceed.
    ///
    /// `Sending` is sendable so that an at-least-once trigger redelivered
    /// after a crashed run restarts the send.
    #[must_use]
    pub const fn is_sendable(self) -> bool {
        matches!(self, Self::Scheduled | Self::Sending)
    }

    /// Stable lower-case name, as stored and logged.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Scheduled => "scheduled",
            Self::Sending => "sending",
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of mail a campaign carries, which determines eligibility rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailType {
    /// Promotional mail; full opt-out and suppression rules apply.
    Marketing,
    /// Transactional/informational mail; reaches everyone except
    /// unconfirmed (`pending`) subscriptions.
    Notification,
}

impl EmailType {
    /// Whether marketing-only exclusions and footers apply.
    #[must_use]
    pub const fn is_marketing(self) -> bool {
        matches!(self, Self::Marketing)
    }

    /// Stable lower-case name, as used in message headers.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Marketing => "marketing",
            Self::Notification => "notification",
        }
    }
}

impl fmt::Display for EmailType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One mass-email send definition and its lifecycle state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    /// Campaign identifier.
    pub id: CampaignId,
    /// Kind of mail, driving eligibility rules.
    pub email_type: EmailType,
    /// Subject template (`{{key}}` merge fields allowed).
    pub subject: String,
    /// Envelope sender address.
    pub from_email: String,
    /// Display name for the sender.
    pub from_name: Option<String>,
    /// Reply-To address, if different from the sender.
    pub reply_to: Option<String>,
    /// HTML body template.
    pub content_html: Option<String>,
    /// Plain-text body template.
    pub content_text: Option<String>,
    /// Markdown source the HTML was rendered from upstream. Carried opaque;
    /// never rendered by the sender.
    pub content_markdown: Option<String>,
    /// Current lifecycle status.
    pub status: CampaignStatus,
    /// Earliest time the campaign may go out, if deferred.
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Audience lists this campaign targets.
    pub list_ids: Vec<ListId>,
}

/// Aggregate counters for one campaign run.
///
/// Computed fully in memory during the run and written once at
/// finalization, overwriting any counters left by an earlier partial run.
/// Delivered/bounced counters live on the same persisted row but are owned
/// by the webhook consumer; the sender never touches them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientStats {
    /// Distinct recipients considered, before exclusions.
    pub targeted: u64,
    /// Targeted recipients excluded by opt-out or suppression rules.
    pub suppressed: u64,
    /// Messages the provider confirmed it would attempt to deliver.
    pub provider_accepted: u64,
}
