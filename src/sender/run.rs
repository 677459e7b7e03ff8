//! The page loop: dedup, eligibility, rendering, batching, finalization.

use ahash::AHashSet;
use tracing::{debug, info, warn};

use crate::{
    campaign::{Campaign, CampaignStatus, RecipientStats},
    error::SendError,
    footer::UnsubscribeLinks,
    message::{
        self, Headers, MessageMetadata, OutboundMessage,
    },
    pacing::Pacing,
    provider::{SuppressionReason, SyncReason},
    render::{self, MergeValues},
    sender::{CampaignSender, SendOutcome},
    store::{RecipientQuery, RecipientRow},
};

/// Format used for the `{{eventDate}}` merge field.
const EVENT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub(super) async fn run(
    sender: &CampaignSender,
    campaign: &Campaign,
) -> Result<SendOutcome, SendError> {
    let batch_size = sender.config.batch_size.max(1);
    let pacing = Pacing::from_limits(batch_size, sender.config.rate_limit_per_minute);
    let query = RecipientQuery {
        list_ids: campaign.list_ids.clone(),
        email_type: campaign.email_type,
        page_size: batch_size,
    };

    info!(
        campaign_id = %campaign.id,
        email_type = %campaign.email_type,
        lists = query.list_ids.len(),
        batch_size,
        "starting campaign run"
    );

    let mut stats = RecipientStats::default();
    // Grows with the total recipients of the run; accepted scaling bound
    // at the volumes the batch/rate configuration implies.
    let mut seen: AHashSet<String> = AHashSet::new();
    let mut outbound: Vec<OutboundMessage> = Vec::with_capacity(batch_size);
    let mut cursor = None;

    loop {
        let page = sender.recipients.page(&query, cursor).await?;
        if page.rows.is_empty() {
            break;
        }

        let page_emails: AHashSet<String> = page
            .rows
            .iter()
            .filter_map(RecipientRow::normalized_email)
            .collect();
        let denylisted = sender.suppressions.suppressed(&page_emails).await?;
        debug!(
            campaign_id = %campaign.id,
            rows = page.rows.len(),
            denylisted = denylisted.len(),
            "processing recipient page"
        );

        let mut provider_unsubscribes: AHashSet<String> = AHashSet::new();

        for row in &page.rows {
            let Some(email) = row.normalized_email() else {
                continue;
            };

            // First occurrence in page order wins; later duplicates from
            // other list memberships are dropped, not merged.
            if !seen.insert(email.clone()) {
                continue;
            }
            stats.targeted += 1;

            if campaign.email_type.is_marketing() {
                if let Some(reason) = exclusion_reason(row, &denylisted, &email) {
                    stats.suppressed += 1;
                    debug!(
                        campaign_id = %campaign.id,
                        subscriber_id = %row.subscriber.id,
                        reason = %reason,
                        "recipient excluded"
                    );
                    if matches!(
                        reason,
                        SuppressionReason::MarketingUnsubscribed
                            | SuppressionReason::MarketingOptOut
                    ) {
                        provider_unsubscribes.insert(email);
                    }
                    continue;
                }
            }

            outbound.push(build_message(sender, campaign, row));

            if outbound.len() >= batch_size {
                flush(sender, campaign, &mut outbound, &mut stats).await?;
                pacing.pause().await;
            }
        }

        if !provider_unsubscribes.is_empty() {
            let emails: Vec<String> = provider_unsubscribes.into_iter().collect();
            sender
                .provider
                .sync_suppressions(&emails, SyncReason::Unsubscribe)
                .await?;
        }

        cursor = page.next;
        if cursor.is_none() {
            break;
        }
    }

    // Final partial batch; no pacing pause required after it.
    if !outbound.is_empty() {
        flush(sender, campaign, &mut outbound, &mut stats).await?;
    }

    sender.campaigns.upsert_stats(campaign.id, &stats).await?;

    let status = if stats.targeted > 0 && stats.provider_accepted == 0 {
        CampaignStatus::Failed
    } else {
        CampaignStatus::Sent
    };
    sender.campaigns.update_status(campaign.id, status).await?;

    info!(
        campaign_id = %campaign.id,
        targeted = stats.targeted,
        suppressed = stats.suppressed,
        accepted = stats.provider_accepted,
        status = %status,
        "campaign run complete"
    );

    Ok(SendOutcome::Completed { status, stats })
}

/// Marketing-only exclusion rules, checked in order: global marketing
/// opt-out, explicit per-subscription opt-out, global denylist.
fn exclusion_reason(
    row: &RecipientRow,
    denylisted: &AHashSet<String>,
    email: &str,
) -> Option<SuppressionReason> {
    if row.subscriber.marketing_unsubscribed_at.is_some() {
        return Some(SuppressionReason::MarketingUnsubscribed);
    }
    if !row.subscription.metadata.marketing_opted_in() {
        return Some(SuppressionReason::MarketingOptOut);
    }
    if denylisted.contains(email) {
        return Some(SuppressionReason::Suppressed);
    }
    None
}

fn build_message(
    sender: &CampaignSender,
    campaign: &Campaign,
    row: &RecipientRow,
) -> OutboundMessage {
    let subscriber = &row.subscriber;
    let event = row.list.event.as_ref();

    let links = if campaign.email_type.is_marketing() {
        UnsubscribeLinks {
            unsubscribe_url: sender
                .linker
                .unsubscribe_url(subscriber.id, row.subscription.list_id),
            unsubscribe_all_url: sender.linker.unsubscribe_all_url(subscriber.id),
        }
    } else {
        UnsubscribeLinks::default()
    };

    let mut values = MergeValues::default();
    values.insert(
        render::FIRST_NAME.to_owned(),
        subscriber
            .first_name
            .clone()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| sender.config.first_name_fallback.clone()),
    );
    values.insert(
        render::LAST_NAME.to_owned(),
        subscriber.last_name.clone().unwrap_or_default(),
    );
    values.insert(render::EMAIL.to_owned(), subscriber.email.clone());
    values.insert(
        render::EVENT_NAME.to_owned(),
        event.map(|e| e.name.clone()).unwrap_or_default(),
    );
    values.insert(
        render::EVENT_DATE.to_owned(),
        event
            .and_then(|e| e.starts_at)
            .map(|at| at.format(EVENT_DATE_FORMAT).to_string())
            .unwrap_or_default(),
    );
    values.insert(
        render::UNSUBSCRIBE_URL.to_owned(),
        links.unsubscribe_url.clone(),
    );
    values.insert(
        render::UNSUBSCRIBE_ALL_URL.to_owned(),
        links.unsubscribe_all_url.clone(),
    );

    let subject = render::render(&campaign.subject, &values);
    let mut html = campaign
        .content_html
        .as_deref()
        .map(|template| render::render(template, &values));
    let mut text = campaign
        .content_text
        .as_deref()
        .map(|template| render::render(template, &values));

    if campaign.email_type.is_marketing() {
        html = html.map(|content| sender.footer.compose_html(&content, &links));
        text = text.map(|content| sender.footer.compose_text(&content, &links));
    }

    let mut headers = Headers::default();
    headers.push(message::HEADER_EMAIL_TYPE, campaign.email_type.as_str());
    headers.push(message::HEADER_CAMPAIGN_ID, campaign.id.to_string());
    headers.push(
        message::HEADER_LIST_ID,
        row.subscription.list_id.to_string(),
    );
    if let Some(event) = event {
        headers.push(message::HEADER_EVENT_ID, event.id.to_string());
    }
    if campaign.email_type.is_marketing() && !links.unsubscribe_url.is_empty() {
        let mut value = format!("<{}>", links.unsubscribe_url);
        if !links.unsubscribe_all_url.is_empty() {
            value.push_str(", <");
            value.push_str(&links.unsubscribe_all_url);
            value.push('>');
        }
        headers.push(message::HEADER_LIST_UNSUBSCRIBE, value);
    }

    let to_name = match (&subscriber.first_name, &subscriber.last_name) {
        (None, None) => None,
        (first, last) => {
            let name = format!(
                "{} {}",
                first.as_deref().unwrap_or_default(),
                last.as_deref().unwrap_or_default()
            );
            let name = name.trim();
            if name.is_empty() {
                None
            } else {
                Some(name.to_owned())
            }
        }
    };

    OutboundMessage {
        to_email: subscriber.email.clone(),
        to_name,
        subject,
        from_email: campaign.from_email.clone(),
        from_name: campaign.from_name.clone(),
        reply_to: campaign.reply_to.clone(),
        html: html.filter(|content| !content.is_empty()),
        text: text.filter(|content| !content.is_empty()),
        headers,
        metadata: MessageMetadata {
            campaign_id: campaign.id,
            list_id: row.subscription.list_id,
            event_id: event.map(|e| e.id),
            email_type: campaign.email_type,
        },
    }
}

async fn flush(
    sender: &CampaignSender,
    campaign: &Campaign,
    outbound: &mut Vec<OutboundMessage>,
    stats: &mut RecipientStats,
) -> Result<(), SendError> {
    if outbound.is_empty() {
        return Ok(());
    }

    let receipt = sender.provider.send_batch(outbound).await?;
    debug!(
        campaign_id = %campaign.id,
        batch = outbound.len(),
        accepted = receipt.accepted,
        failed = receipt.failed,
        "batch flushed to provider"
    );
    if receipt.failed > 0 {
        warn!(
            campaign_id = %campaign.id,
            failed = receipt.failed,
            "provider rejected messages in batch"
        );
    }

    stats.provider_accepted += receipt.accepted;
    outbound.clear();
    Ok(())
}
