mod bulk;
mod import;

use std::collections::BTreeMap;

use actix_web::{HttpResponse, web};
use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{
    NewSubscriber, Pagination, SubscriberEmail, SubscriberName, SubscriberStatus, normalize_tags,
};
use crate::newsletter::{SubscriberFilter, find_subscriber, insert_subscriber, list_subscribers};
use crate::routes::helpers::ApiError;

pub use bulk::bulk_update_subscribers;
pub use import::import_subscribers;

#[derive(Debug, serde::Deserialize)]
pub struct SubscribersQuery {
    page: Option<i64>,
    limit: Option<i64>,
    search: Option<String>,
    status: Option<String>,
    tag: Option<String>,
}

#[tracing::instrument(name = "List subscribers", skip(pool))]
pub async fn get_subscribers(
    query: web::Query<SubscribersQuery>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let SubscribersQuery {
        page,
        limit,
        search,
        status,
        tag,
    } = query.into_inner();
    let status = status
        .filter(|s| !s.trim().is_empty())
        .map(SubscriberStatus::try_from)
        .transpose()
        .map_err(ApiError::BadRequest)?;
    let pagination = Pagination::new(page, limit);
    let filter = SubscriberFilter {
        search,
        status,
        tag,
    };
    let (subscribers, total) = list_subscribers(&pool, &filter, pagination).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "subscribers": subscribers,
        "total": total,
        "page_count": pagination.page_count(total),
    })))
}

#[derive(Debug, serde::Deserialize)]
pub struct CreateSubscriberRequest {
    email: String,
    first_name: Option<String>,
    last_name: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
}

#[tracing::instrument(
    name = "Admin adding a subscriber",
    skip(body, pool),
    fields(subscriber_email = %body.email)
)]
pub async fn create_subscriber(
    body: web::Json<CreateSubscriberRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let CreateSubscriberRequest {
        email,
        first_name,
        last_name,
        tags,
        metadata,
    } = body.into_inner();
    let new_subscriber = NewSubscriber::parse(email, first_name, last_name, tags, metadata)
        .map_err(ApiError::BadRequest)?;

    if email_taken(&pool, &new_subscriber.email, None).await? {
        return Err(ApiError::BadRequest("Email already subscribed".into()));
    }
    let mut connection = pool
        .acquire()
        .await
        .context("Failed to acquire a Postgres connection from the pool.")?;
    let id = insert_subscriber(&mut connection, &new_subscriber).await?;

    let subscriber = find_subscriber(&pool, id)
        .await?
        .context("The subscriber disappeared right after being created.")?;
    Ok(HttpResponse::Created().json(subscriber))
}

pub async fn get_subscriber(
    id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let subscriber = find_subscriber(&pool, *id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Subscriber not found".into()))?;
    Ok(HttpResponse::Ok().json(subscriber))
}

#[derive(Debug, serde::Deserialize)]
pub struct UpdateSubscriberRequest {
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    status: Option<SubscriberStatus>,
    tags: Option<Vec<String>>,
    metadata: Option<BTreeMap<String, String>>,
}

#[tracing::instrument(name = "Update subscriber", skip(body, pool))]
pub async fn update_subscriber(
    id: web::Path<Uuid>,
    body: web::Json<UpdateSubscriberRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let existing = find_subscriber(&pool, *id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Subscriber not found".into()))?;
    let patch = body.into_inner();

    let email = match patch.email {
        Some(email) => {
            let email = SubscriberEmail::parse(email).map_err(ApiError::BadRequest)?;
            if email_taken(&pool, &email, Some(existing.id)).await? {
                return Err(ApiError::BadRequest("Email already subscribed".into()));
            }
            email.to_string()
        }
        None => existing.email,
    };
    let first_name = match patch.first_name {
        Some(name) => SubscriberName::parse_optional(Some(name))
            .map_err(ApiError::BadRequest)?
            .map(|n| n.as_ref().to_string()),
        None => existing.first_name,
    };
    let last_name = match patch.last_name {
        Some(name) => SubscriberName::parse_optional(Some(name))
            .map_err(ApiError::BadRequest)?
            .map(|n| n.as_ref().to_string()),
        None => existing.last_name,
    };
    let status = patch
        .status
        .map_or(existing.status, |s| s.as_str().to_string());
    let tags = patch.tags.map_or(existing.tags, normalize_tags);
    let metadata = match patch.metadata {
        Some(metadata) => serde_json::to_value(metadata)
            .context("Failed to serialize the subscriber metadata.")?,
        None => existing.metadata,
    };

    sqlx::query(
        r#"
        UPDATE subscribers
        SET email = $2, first_name = $3, last_name = $4, status = $5, tags = $6, metadata = $7,
            updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(existing.id)
    .bind(&email)
    .bind(&first_name)
    .bind(&last_name)
    .bind(&status)
    .bind(&tags)
    .bind(&metadata)
    .execute(pool.get_ref())
    .await?;

    let subscriber = find_subscriber(&pool, existing.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Subscriber not found".into()))?;
    Ok(HttpResponse::Ok().json(subscriber))
}

#[tracing::instrument(name = "Delete subscriber", skip(pool))]
pub async fn delete_subscriber(
    id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let deleted = sqlx::query("DELETE FROM subscribers WHERE id = $1")
        .bind(*id)
        .execute(pool.get_ref())
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(ApiError::NotFound("Subscriber not found".into()));
    }
    Ok(HttpResponse::NoContent().finish())
}

async fn email_taken(
    pool: &PgPool,
    email: &SubscriberEmail,
    except: Option<Uuid>,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM subscribers WHERE email = $1 AND ($2::uuid IS NULL OR id <> $2))",
    )
    .bind(email.as_ref())
    .bind(except)
    .fetch_one(pool)
    .await
}
