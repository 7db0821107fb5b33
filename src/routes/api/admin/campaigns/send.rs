use actix_web::{HttpResponse, web};
use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::SubscriberEmail;
use crate::email_client::{EmailClient, EmailTag};
use crate::newsletter::{
    Campaign, deliver_campaign, find_campaign, get_active_recipients, mark_campaign_failed,
};
use crate::routes::helpers::ApiError;

/// Flip a DRAFT campaign to SENDING. `false` when another request got there
/// first.
#[tracing::instrument(name = "Claim campaign for sending", skip(pool))]
async fn claim_draft(pool: &PgPool, campaign_id: Uuid) -> Result<bool, sqlx::Error> {
    let claimed = sqlx::query(
        r#"
        UPDATE campaigns
        SET status = 'SENDING', updated_at = now()
        WHERE id = $1 AND status = 'DRAFT'
        "#,
    )
    .bind(campaign_id)
    .execute(pool)
    .await?
    .rows_affected();
    Ok(claimed == 1)
}

#[tracing::instrument(
    name = "Send a campaign to all active subscribers",
    skip(pool, email_client),
    fields(campaign_id = %*campaign_id)
)]
pub async fn send_campaign(
    campaign_id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
    email_client: web::Data<EmailClient>,
) -> Result<HttpResponse, ApiError> {
    let campaign = find_campaign(&pool, *campaign_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Campaign not found".into()))?;
    let status = campaign
        .status()
        .map_err(|e| anyhow::anyhow!(e).context("Stored campaign status is invalid."))?;
    if !status.is_manually_sendable() {
        return Err(ApiError::BadRequest(format!(
            "Campaign cannot be sent because it is in {status} status"
        )));
    }

    let recipients = get_active_recipients(&pool).await?;
    if recipients.is_empty() {
        return Err(ApiError::BadRequest("No active subscribers found".into()));
    }
    if !claim_draft(&pool, campaign.id).await? {
        return Err(ApiError::BadRequest(
            "Campaign is already being sent".into(),
        ));
    }

    match deliver(&pool, &email_client, &campaign, &recipients).await {
        Ok(response) => Ok(response),
        Err(e) => {
            if let Err(mark_error) = mark_campaign_failed(&pool, campaign.id).await {
                tracing::error!(
                    error.cause_chain = ?mark_error,
                    error.message = %mark_error,
                    "Failed to mark the campaign as failed",
                );
            }
            Err(ApiError::UnexpectedError(e))
        }
    }
}

async fn deliver(
    pool: &PgPool,
    email_client: &EmailClient,
    campaign: &Campaign,
    recipients: &[String],
) -> Result<HttpResponse, anyhow::Error> {
    let report = deliver_campaign(pool, email_client, campaign, recipients).await?;
    tracing::info!(
        total = report.total,
        delivered = report.delivered,
        failed = report.failed,
        "Campaign sent"
    );
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "stats": {
            "total": report.total,
            "sent": report.delivered,
            "failed": report.failed,
        },
    })))
}

#[derive(Debug, serde::Deserialize)]
pub struct TestEmailRequest {
    email: String,
}

#[tracing::instrument(
    name = "Send a test email for a campaign",
    skip(body, pool, email_client),
    fields(campaign_id = %*campaign_id)
)]
pub async fn send_test_campaign(
    campaign_id: web::Path<Uuid>,
    body: web::Json<TestEmailRequest>,
    pool: web::Data<PgPool>,
    email_client: web::Data<EmailClient>,
) -> Result<HttpResponse, ApiError> {
    let recipient =
        SubscriberEmail::parse(body.into_inner().email).map_err(ApiError::BadRequest)?;
    let campaign = find_campaign(&pool, *campaign_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Campaign not found".into()))?;

    let subject = format!("[Test] {}", campaign.subject);
    email_client
        .send_email(
            &recipient,
            &subject,
            &campaign.content,
            None,
            &[EmailTag::new("type", "test")],
        )
        .await
        .context("Failed to send the test email.")?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": format!("Test email sent to {recipient}"),
    })))
}
