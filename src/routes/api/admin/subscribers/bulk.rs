use actix_web::{HttpResponse, web};
use anyhow::Context;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::domain::{SubscriberStatus, merge_tags, normalize_tags, remove_tags};
use crate::routes::helpers::ApiError;

#[derive(Debug, serde::Deserialize)]
pub struct BulkRequest {
    action: String,
    #[serde(default)]
    subscriber_ids: Vec<Uuid>,
    #[serde(default)]
    data: BulkData,
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct BulkData {
    status: Option<SubscriberStatus>,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug)]
enum BulkAction {
    Delete,
    UpdateStatus(SubscriberStatus),
    AddTags(Vec<String>),
    RemoveTags(Vec<String>),
}

impl BulkAction {
    fn parse(action: &str, data: BulkData) -> Result<Self, String> {
        match action {
            "delete" => Ok(BulkAction::Delete),
            "update_status" | "updateStatus" => data
                .status
                .map(BulkAction::UpdateStatus)
                .ok_or_else(|| "A status is required to update subscribers.".to_string()),
            "add_tags" | "addTags" => Ok(BulkAction::AddTags(normalize_tags(data.tags))),
            "remove_tags" | "removeTags" => Ok(BulkAction::RemoveTags(normalize_tags(data.tags))),
            other => Err(format!("Unknown bulk action: {other}")),
        }
    }

    fn done(&self) -> &'static str {
        match self {
            BulkAction::Delete => "Subscribers deleted",
            BulkAction::UpdateStatus(_) => "Subscriber status updated",
            BulkAction::AddTags(_) => "Tags added",
            BulkAction::RemoveTags(_) => "Tags removed",
        }
    }
}

#[tracing::instrument(
    name = "Bulk update subscribers",
    skip(body, pool),
    fields(action = %body.action, count = body.subscriber_ids.len())
)]
pub async fn bulk_update_subscribers(
    body: web::Json<BulkRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let BulkRequest {
        action,
        subscriber_ids,
        data,
    } = body.into_inner();
    let action = BulkAction::parse(&action, data).map_err(ApiError::BadRequest)?;
    if subscriber_ids.is_empty() {
        return Err(ApiError::BadRequest("No subscribers selected".into()));
    }

    let mut transaction = pool
        .begin()
        .await
        .context("Failed to acquire a Postgres connection from the pool.")?;
    let affected = match &action {
        BulkAction::Delete => {
            sqlx::query("DELETE FROM subscribers WHERE id = ANY($1)")
                .bind(&subscriber_ids)
                .execute(&mut *transaction)
                .await?
                .rows_affected()
        }
        BulkAction::UpdateStatus(status) => {
            sqlx::query(
                "UPDATE subscribers SET status = $2, updated_at = now() WHERE id = ANY($1)",
            )
            .bind(&subscriber_ids)
            .bind(status.as_str())
            .execute(&mut *transaction)
            .await?
            .rows_affected()
        }
        BulkAction::AddTags(tags) => {
            rewrite_tags(&mut transaction, &subscriber_ids, |existing| {
                merge_tags(existing, tags)
            })
            .await?
        }
        BulkAction::RemoveTags(tags) => {
            rewrite_tags(&mut transaction, &subscriber_ids, |existing| {
                remove_tags(existing, tags)
            })
            .await?
        }
    };
    transaction
        .commit()
        .await
        .context("Failed to commit SQL transaction for a bulk subscriber update.")?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": action.done(),
        "affected": affected,
    })))
}

/// Tag edits are computed per subscriber so that existing tag order survives.
async fn rewrite_tags<F>(
    connection: &mut PgConnection,
    ids: &[Uuid],
    edit: F,
) -> Result<u64, sqlx::Error>
where
    F: Fn(&[String]) -> Vec<String>,
{
    let rows: Vec<(Uuid, Vec<String>)> =
        sqlx::query_as("SELECT id, tags FROM subscribers WHERE id = ANY($1) FOR UPDATE")
            .bind(ids)
            .fetch_all(&mut *connection)
            .await?;

    let mut affected = 0;
    for (id, tags) in rows {
        let updated = edit(&tags);
        if updated == tags {
            continue;
        }
        sqlx::query("UPDATE subscribers SET tags = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(&updated)
            .execute(&mut *connection)
            .await?;
        affected += 1;
    }
    Ok(affected)
}
