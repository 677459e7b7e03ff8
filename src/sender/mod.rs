//! Campaign sender orchestration.
//!
//! One [`CampaignSender::send`] invocation processes exactly one campaign,
//! single-threaded and sequential. The caller (typically a job system
//! delivering triggers at-least-once) owns retry, backoff, and the
//! guarantee that at most one invocation is active per campaign at a time;
//! the entry guards here make redelivered triggers safe no-ops.

mod run;

use std::{fmt, sync::Arc, time::Duration};

use chrono::Utc;
use tracing::{debug, warn};

use crate::{
    campaign::{CampaignId, CampaignStatus, RecipientStats},
    config::SenderConfig,
    error::SendError,
    footer::FooterComposer,
    provider::ProviderGateway,
    store::{CampaignStore, RecipientStore, SuppressionIndex, UnsubscribeLinker},
};

/// How a send invocation concluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The trigger was a no-op: nothing was sent, nothing changed.
    Skipped(SkipReason),

    /// The campaign is scheduled for the future. Re-deliver the trigger
    /// after `retry_after`; no state was changed.
    Deferred {
        /// Time until `scheduled_at` is reached.
        retry_after: Duration,
    },

    /// The campaign has no associated lists. It was marked `failed` and
    /// nothing was sent.
    MissingLists,

    /// The run went to completion; status and stats are persisted.
    Completed {
        /// Final status: `sent`, or `failed` when recipients were targeted
        /// but the provider accepted none.
        status: CampaignStatus,
        /// The aggregate counters as persisted.
        stats: RecipientStats,
    },
}

/// Why a trigger was a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No campaign exists under the triggered id (it may have been
    /// deleted after scheduling).
    NotFound,
    /// The campaign is not in a sendable status.
    NotSendable(CampaignStatus),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => f.write_str("campaign not found"),
            Self::NotSendable(status) => write!(f, "campaign status is {status}"),
        }
    }
}

/// The mass-email campaign sending engine.
///
/// Resolves eligible recipients in bounded-memory pages, deduplicates
/// across the run, applies suppression and type-specific eligibility rules,
/// renders content per recipient, flushes bounded batches through the
/// provider gateway with rate-limit pacing, and finalizes campaign status
/// and statistics in a single write.
pub struct CampaignSender {
    pub(crate) config: SenderConfig,
    pub(crate) footer: FooterComposer,
    pub(crate) campaigns: Arc<dyn CampaignStore>,
    pub(crate) recipients: Arc<dyn RecipientStore>,
    pub(crate) suppressions: Arc<dyn SuppressionIndex>,
    pub(crate) provider: Arc<dyn ProviderGateway>,
    pub(crate) linker: Arc<dyn UnsubscribeLinker>,
}

impl CampaignSender {
    /// Assemble a sender from its configuration and collaborators.
    #[must_use]
    pub fn new(
        config: SenderConfig,
        campaigns: Arc<dyn CampaignStore>,
        recipients: Arc<dyn RecipientStore>,
        suppressions: Arc<dyn SuppressionIndex>,
        provider: Arc<dyn ProviderGateway>,
        linker: Arc<dyn UnsubscribeLinker>,
    ) -> Self {
        let footer = FooterComposer::from_config(&config);
        Self {
            config,
            footer,
            campaigns,
            recipients,
            suppressions,
            provider,
            linker,
        }
    }

    /// Process one send trigger for `id`.
    ///
    /// Safe against at-least-once redelivery: triggers for missing,
    /// already-sent, failed, or draft campaigns are no-ops, and a rerun
    /// after a crashed `sending` run overwrites its counters wholesale.
    ///
    /// # Errors
    ///
    /// Returns an error when a store or the provider transport fails
    /// unexpectedly; the campaign is then left in `sending` for the job
    /// system to retry.
    pub async fn send(&self, id: CampaignId) -> Result<SendOutcome, SendError> {
        let Some(campaign) = self.campaigns.find(id).await? else {
            debug!(campaign_id = %id, "no such campaign, skipping trigger");
            return Ok(SendOutcome::Skipped(SkipReason::NotFound));
        };

        if !campaign.status.is_sendable() {
            debug!(
                campaign_id = %id,
                status = %campaign.status,
                "campaign not in a sendable status, skipping trigger"
            );
            return Ok(SendOutcome::Skipped(SkipReason::NotSendable(
                campaign.status,
            )));
        }

        if let Some(scheduled_at) = campaign.scheduled_at {
            let now = Utc::now();
            if scheduled_at > now {
                let retry_after = (scheduled_at - now).to_std().unwrap_or_default();
                debug!(
                    campaign_id = %id,
                    retry_after_secs = retry_after.as_secs(),
                    "campaign scheduled in the future, deferring"
                );
                return Ok(SendOutcome::Deferred { retry_after });
            }
        }

        if campaign.list_ids.is_empty() {
            self.campaigns
                .update_status(id, CampaignStatus::Failed)
                .await?;
            warn!(campaign_id = %id, "campaign has no recipient lists, marking failed");
            return Ok(SendOutcome::MissingLists);
        }

        self.campaigns
            .update_status(id, CampaignStatus::Sending)
            .await?;

        run::run(self, &campaign).await
    }
}
