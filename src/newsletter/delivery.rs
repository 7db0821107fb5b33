use anyhow::Context;
use sqlx::PgPool;

use super::Campaign;
use crate::domain::{DeliveryReport, SubscriberEmail};
use crate::email_client::{EmailClient, EmailTag};

/// Emails of every subscriber eligible for campaigns.
#[tracing::instrument(name = "Get active recipients", skip(pool))]
pub async fn get_active_recipients(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT email FROM subscribers
        WHERE status = 'ACTIVE' AND active = true
        ORDER BY created_at
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Send `campaign` once to every recipient and persist the outcome.
///
/// The campaign must already be in the SENDING state. Failures of individual
/// recipients are counted, never retried. The stats row and the final
/// SENT/FAILED status are written in one transaction.
#[tracing::instrument(
    name = "Deliver campaign",
    skip(pool, email_client, campaign, recipients),
    fields(campaign_id = %campaign.id, recipients = recipients.len())
)]
pub async fn deliver_campaign(
    pool: &PgPool,
    email_client: &EmailClient,
    campaign: &Campaign,
    recipients: &[String],
) -> Result<DeliveryReport, anyhow::Error> {
    let tags = [EmailTag::new("campaign_id", campaign.id)];
    let mut report = DeliveryReport::default();

    for recipient in recipients {
        let email = match SubscriberEmail::parse(recipient.clone()) {
            Ok(email) => email,
            Err(e) => {
                tracing::warn!(
                    error.message = %e,
                    "Skipping a subscriber. Their stored contact details are invalid",
                );
                report.record_failed();
                continue;
            }
        };
        match email_client
            .send_email(&email, &campaign.subject, &campaign.content, None, &tags)
            .await
        {
            Ok(()) => report.record_delivered(),
            Err(e) => {
                tracing::error!(
                    error.cause_chain = ?e,
                    error.message = %e,
                    "Failed to deliver campaign to a subscriber",
                );
                report.record_failed();
            }
        }
    }

    let mut transaction = pool
        .begin()
        .await
        .context("Failed to acquire a Postgres connection from the pool.")?;
    sqlx::query(
        r#"
        INSERT INTO campaign_stats (campaign_id, sent, delivered, failed)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (campaign_id) DO UPDATE
        SET sent = EXCLUDED.sent, delivered = EXCLUDED.delivered, failed = EXCLUDED.failed
        "#,
    )
    .bind(campaign.id)
    .bind(report.total)
    .bind(report.delivered)
    .bind(report.failed)
    .execute(&mut *transaction)
    .await
    .context("Failed to store campaign stats.")?;
    sqlx::query(
        r#"
        UPDATE campaigns
        SET status = $2, sent_at = now(), updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(campaign.id)
    .bind(report.final_status().as_str())
    .execute(&mut *transaction)
    .await
    .context("Failed to update the campaign status.")?;
    transaction
        .commit()
        .await
        .context("Failed to commit the campaign outcome.")?;

    Ok(report)
}
