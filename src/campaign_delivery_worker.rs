use std::time::Duration;

use anyhow::Context;
use sqlx::PgPool;
use tracing::{Span, field::display};
use uuid::Uuid;

use crate::configuration::Settings;
use crate::email_client::EmailClient;
use crate::newsletter::{deliver_campaign, find_campaign, get_active_recipients, mark_campaign_failed};
use crate::startup::get_connection_pool;

pub enum ExecutionOutcome {
    TaskCompleted,
    EmptyQueue,
}

#[tracing::instrument(skip_all, fields(campaign_id = tracing::field::Empty), err)]
pub async fn try_execute_task(
    pool: &PgPool,
    email_client: &EmailClient,
) -> Result<ExecutionOutcome, anyhow::Error> {
    let Some(campaign_id) = claim_due_campaign(pool).await? else {
        return Ok(ExecutionOutcome::EmptyQueue);
    };
    Span::current().record("campaign_id", display(campaign_id));

    if let Err(e) = deliver(pool, email_client, campaign_id).await {
        mark_campaign_failed(pool, campaign_id)
            .await
            .context("Failed to mark the campaign as failed.")?;
        return Err(e);
    }
    Ok(ExecutionOutcome::TaskCompleted)
}

async fn deliver(
    pool: &PgPool,
    email_client: &EmailClient,
    campaign_id: Uuid,
) -> Result<(), anyhow::Error> {
    let campaign = find_campaign(pool, campaign_id)
        .await?
        .context("The claimed campaign disappeared.")?;
    let recipients = get_active_recipients(pool).await?;
    let report = deliver_campaign(pool, email_client, &campaign, &recipients).await?;
    tracing::info!(
        total = report.total,
        delivered = report.delivered,
        failed = report.failed,
        "Scheduled campaign delivered"
    );
    Ok(())
}

/// Flip the oldest due SCHEDULED campaign to SENDING and return its id.
#[tracing::instrument(skip_all)]
async fn claim_due_campaign(pool: &PgPool) -> Result<Option<Uuid>, anyhow::Error> {
    let mut transaction = pool.begin().await?;
    let campaign_id: Option<Uuid> = sqlx::query_scalar(
        r#"
        SELECT id
        FROM campaigns
        WHERE status = 'SCHEDULED' AND scheduled_at <= now()
        ORDER BY scheduled_at
        FOR UPDATE
        SKIP LOCKED
        LIMIT 1
        "#,
    )
    .fetch_optional(&mut *transaction)
    .await?;

    let Some(campaign_id) = campaign_id else {
        return Ok(None);
    };
    sqlx::query("UPDATE campaigns SET status = 'SENDING', updated_at = now() WHERE id = $1")
        .bind(campaign_id)
        .execute(&mut *transaction)
        .await?;
    transaction.commit().await?;
    Ok(Some(campaign_id))
}

pub async fn run_worker_until_stopped(config: Settings) -> Result<(), anyhow::Error> {
    let pool = get_connection_pool(&config.database);
    let poll_interval = config.campaign_worker.poll_interval();
    let email_client = config.email_client.client()?;
    worker_loop(&pool, &email_client, poll_interval).await
}

async fn worker_loop(
    pool: &PgPool,
    email_client: &EmailClient,
    poll_interval: Duration,
) -> Result<(), anyhow::Error> {
    loop {
        match try_execute_task(pool, email_client).await {
            Ok(ExecutionOutcome::TaskCompleted) => {}
            Ok(ExecutionOutcome::EmptyQueue) => tokio::time::sleep(poll_interval).await,
            Err(_) => tokio::time::sleep(Duration::from_secs(1)).await,
        }
    }
}
