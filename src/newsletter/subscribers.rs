use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::content::like_pattern;
use crate::domain::{NewSubscriber, Pagination, SubscriberStatus};

#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct Subscriber {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub status: String,
    pub tags: Vec<String>,
    pub metadata: serde_json::Value,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Clone)]
pub struct SubscriberFilter {
    /// Matched against email and names.
    pub search: Option<String>,
    pub status: Option<SubscriberStatus>,
    pub tag: Option<String>,
}

const FILTER_SUBSCRIBERS: &str = r#"
    WHERE ($1::text IS NULL OR email ILIKE $1 OR first_name ILIKE $1 OR last_name ILIKE $1)
      AND ($2::text IS NULL OR status = $2)
      AND ($3::text IS NULL OR $3 = ANY(tags))
"#;

#[tracing::instrument(name = "List subscribers", skip(pool))]
pub async fn list_subscribers(
    pool: &PgPool,
    filter: &SubscriberFilter,
    pagination: Pagination,
) -> Result<(Vec<Subscriber>, i64), sqlx::Error> {
    let search = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(like_pattern);
    let status = filter.status.map(|s| s.as_str());
    let tag = filter
        .tag
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let list_sql = format!(
        r#"
        SELECT id, email, first_name, last_name, status, tags, metadata, active,
               created_at, updated_at
        FROM subscribers
        {FILTER_SUBSCRIBERS}
        ORDER BY created_at DESC
        LIMIT $4 OFFSET $5
        "#
    );
    let subscribers = sqlx::query_as::<_, Subscriber>(&list_sql)
        .bind(search.as_deref())
        .bind(status)
        .bind(tag)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(pool)
        .await?;

    let count_sql = format!("SELECT COUNT(*) FROM subscribers {FILTER_SUBSCRIBERS}");
    let total: i64 = sqlx::query_scalar(&count_sql)
        .bind(search.as_deref())
        .bind(status)
        .bind(tag)
        .fetch_one(pool)
        .await?;

    Ok((subscribers, total))
}

#[tracing::instrument(name = "Find subscriber", skip(pool))]
pub async fn find_subscriber(pool: &PgPool, id: Uuid) -> Result<Option<Subscriber>, sqlx::Error> {
    sqlx::query_as::<_, Subscriber>(
        r#"
        SELECT id, email, first_name, last_name, status, tags, metadata, active,
               created_at, updated_at
        FROM subscribers
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Store an already confirmed subscriber (admin creation and CSV import).
#[tracing::instrument(
    name = "Saving new subscriber details in the database",
    skip(new_subscriber, connection),
    fields(subscriber_email = %new_subscriber.email)
)]
pub async fn insert_subscriber(
    connection: &mut PgConnection,
    new_subscriber: &NewSubscriber,
) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();
    let metadata = serde_json::to_value(&new_subscriber.metadata)
        .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
    sqlx::query(
        r#"
        INSERT INTO subscribers (id, email, first_name, last_name, status, tags, metadata, active)
        VALUES ($1, $2, $3, $4, 'ACTIVE', $5, $6, true)
        "#,
    )
    .bind(id)
    .bind(new_subscriber.email.as_ref())
    .bind(new_subscriber.first_name())
    .bind(new_subscriber.last_name())
    .bind(&new_subscriber.tags)
    .bind(metadata)
    .execute(connection)
    .await?;
    Ok(id)
}
