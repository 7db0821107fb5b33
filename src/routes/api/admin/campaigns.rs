mod send;

use actix_web::{HttpResponse, web};
use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{nullable, required};
use crate::domain::{CampaignStatus, Pagination};
use crate::newsletter::{Campaign, find_campaign, find_template, list_campaigns};
use crate::routes::helpers::ApiError;

pub use send::{send_campaign, send_test_campaign};

#[derive(Debug, serde::Deserialize)]
pub struct CampaignsQuery {
    page: Option<i64>,
    limit: Option<i64>,
    status: Option<String>,
}

#[tracing::instrument(name = "List campaigns", skip(pool))]
pub async fn get_campaigns(
    query: web::Query<CampaignsQuery>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let CampaignsQuery {
        page,
        limit,
        status,
    } = query.into_inner();
    let status = status
        .filter(|s| !s.trim().is_empty())
        .map(CampaignStatus::try_from)
        .transpose()
        .map_err(ApiError::BadRequest)?;
    let pagination = Pagination::new(page, limit);
    let (campaigns, total) = list_campaigns(&pool, status, pagination).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "campaigns": campaigns,
        "total": total,
        "page": pagination.page(),
        "total_pages": pagination.page_count(total),
    })))
}

pub async fn get_campaign(
    id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let campaign = find_campaign(&pool, *id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Campaign not found".into()))?;
    Ok(HttpResponse::Ok().json(campaign))
}

#[derive(Debug, serde::Deserialize)]
pub struct CampaignPayload {
    name: String,
    subject: String,
    content: String,
    template_id: Option<Uuid>,
    scheduled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, serde::Deserialize)]
pub struct CampaignPatch {
    name: Option<String>,
    subject: Option<String>,
    content: Option<String>,
    template_id: Option<Uuid>,
    /// `null` unschedules the campaign and turns it back into a draft.
    #[serde(default, deserialize_with = "nullable")]
    scheduled_at: Option<Option<DateTime<Utc>>>,
}

/// A campaign with a send date waits for the delivery worker.
fn initial_status(scheduled_at: Option<DateTime<Utc>>) -> CampaignStatus {
    match scheduled_at {
        Some(_) => CampaignStatus::Scheduled,
        None => CampaignStatus::Draft,
    }
}

async fn ensure_template_exists(pool: &PgPool, template_id: Option<Uuid>) -> Result<(), ApiError> {
    if let Some(template_id) = template_id {
        if find_template(pool, template_id).await?.is_none() {
            return Err(ApiError::ValidationError("Unknown email template.".into()));
        }
    }
    Ok(())
}

#[tracing::instrument(name = "Create campaign", skip(body, pool), fields(name = %body.name))]
pub async fn create_campaign(
    body: web::Json<CampaignPayload>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let CampaignPayload {
        name,
        subject,
        content,
        template_id,
        scheduled_at,
    } = body.into_inner();
    let name = required("name", name)?;
    let subject = required("subject", subject)?;
    let content = required("content", content)?;
    ensure_template_exists(&pool, template_id).await?;

    let id = Uuid::new_v4();
    let mut transaction = pool
        .begin()
        .await
        .context("Failed to acquire a Postgres connection from the pool.")?;
    sqlx::query(
        r#"
        INSERT INTO campaigns (id, name, subject, content, template_id, status, scheduled_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(id)
    .bind(&name)
    .bind(&subject)
    .bind(&content)
    .bind(template_id)
    .bind(initial_status(scheduled_at).as_str())
    .bind(scheduled_at)
    .execute(&mut *transaction)
    .await?;
    sqlx::query("INSERT INTO campaign_stats (campaign_id) VALUES ($1)")
        .bind(id)
        .execute(&mut *transaction)
        .await?;
    transaction
        .commit()
        .await
        .context("Failed to commit SQL transaction to store a new campaign.")?;

    let campaign = find_campaign(&pool, id)
        .await?
        .context("The campaign disappeared right after being created.")?;
    Ok(HttpResponse::Created().json(campaign))
}

#[tracing::instrument(name = "Update campaign", skip(body, pool))]
pub async fn update_campaign(
    id: web::Path<Uuid>,
    body: web::Json<CampaignPatch>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let existing = find_campaign(&pool, *id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Campaign not found".into()))?;
    let status = existing
        .status()
        .map_err(|e| anyhow::anyhow!(e).context("Stored campaign status is invalid."))?;
    if !matches!(status, CampaignStatus::Draft | CampaignStatus::Scheduled) {
        return Err(ApiError::BadRequest(format!(
            "Campaign cannot be edited because it is in {status} status"
        )));
    }

    let patch = body.into_inner();
    let Campaign {
        name,
        subject,
        content,
        template_id,
        scheduled_at,
        ..
    } = existing;
    let name = match patch.name {
        Some(name) => required("name", name)?,
        None => name,
    };
    let subject = match patch.subject {
        Some(subject) => required("subject", subject)?,
        None => subject,
    };
    let content = match patch.content {
        Some(content) => required("content", content)?,
        None => content,
    };
    let template_id = match patch.template_id {
        Some(template_id) => {
            ensure_template_exists(&pool, Some(template_id)).await?;
            Some(template_id)
        }
        None => template_id,
    };
    let scheduled_at = patch.scheduled_at.unwrap_or(scheduled_at);

    let updated = sqlx::query(
        r#"
        UPDATE campaigns
        SET name = $2, subject = $3, content = $4, template_id = $5, status = $6,
            scheduled_at = $7, updated_at = now()
        WHERE id = $1 AND status IN ('DRAFT', 'SCHEDULED')
        "#,
    )
    .bind(*id)
    .bind(&name)
    .bind(&subject)
    .bind(&content)
    .bind(template_id)
    .bind(initial_status(scheduled_at).as_str())
    .bind(scheduled_at)
    .execute(pool.get_ref())
    .await?
    .rows_affected();
    // A send claimed the campaign after the status check above.
    if updated == 0 {
        return Err(ApiError::BadRequest(
            "Campaign cannot be edited because it is already being sent".into(),
        ));
    }

    let campaign = find_campaign(&pool, *id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Campaign not found".into()))?;
    Ok(HttpResponse::Ok().json(campaign))
}

#[tracing::instrument(name = "Delete campaign", skip(pool))]
pub async fn delete_campaign(
    id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let deleted = sqlx::query("DELETE FROM campaigns WHERE id = $1")
        .bind(*id)
        .execute(pool.get_ref())
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(ApiError::NotFound("Campaign not found".into()));
    }
    Ok(HttpResponse::NoContent().finish())
}
