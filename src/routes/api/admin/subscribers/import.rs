use actix_web::{HttpResponse, web};
use anyhow::Context;
use sqlx::PgPool;

use crate::domain::{ImportRow, ImportRowError, parse_subscriber_import, parse_tag_list};
use crate::newsletter::insert_subscriber;
use crate::routes::helpers::ApiError;

#[derive(Debug, serde::Deserialize)]
pub struct ImportQuery {
    tags: Option<String>,
}

/// Import subscribers from a CSV body. Rows whose email is already known are
/// reported back as errors instead of aborting the import. An import that adds
/// nobody is rejected.
#[tracing::instrument(name = "Import subscribers", skip(body, pool))]
pub async fn import_subscribers(
    query: web::Query<ImportQuery>,
    body: String,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    if body.trim().is_empty() {
        return Err(ApiError::BadRequest("No file provided".into()));
    }
    let tags = query
        .into_inner()
        .tags
        .map(|raw| parse_tag_list(&raw))
        .unwrap_or_default();
    let batch = parse_subscriber_import(&body, &tags)
        .map_err(|e| ApiError::BadRequest(format!("Failed to parse the CSV file: {e}")))?;
    if batch.subscribers.is_empty() {
        return Err(ApiError::BadRequest("No valid subscribers found in file".into()));
    }

    let emails: Vec<&str> = batch
        .subscribers
        .iter()
        .map(|r| r.subscriber.email.as_ref())
        .collect();
    let existing: Vec<String> =
        sqlx::query_scalar("SELECT email FROM subscribers WHERE email = ANY($1)")
            .bind(&emails)
            .fetch_all(pool.get_ref())
            .await?;

    let mut errors = batch.errors;
    let mut transaction = pool
        .begin()
        .await
        .context("Failed to acquire a Postgres connection from the pool.")?;
    let mut imported = 0;
    for ImportRow { row, subscriber } in &batch.subscribers {
        if existing.iter().any(|e| e == subscriber.email.as_ref()) {
            errors.push(ImportRowError {
                row: *row,
                reason: format!("{} is already subscribed.", subscriber.email),
            });
            continue;
        }
        insert_subscriber(&mut transaction, subscriber).await?;
        imported += 1;
    }
    if imported == 0 {
        return Err(ApiError::BadRequest("No valid subscribers found in file".into()));
    }
    transaction
        .commit()
        .await
        .context("Failed to commit SQL transaction to import subscribers.")?;
    errors.sort_by_key(|e| e.row);

    tracing::info!(imported, skipped = errors.len(), "Subscriber import finished");
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "imported": imported,
        "errors": errors,
    })))
}
