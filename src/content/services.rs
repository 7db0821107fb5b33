use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct Service {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub icon: String,
    pub features: Vec<String>,
    pub benefits: Vec<String>,
    pub category: String,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[tracing::instrument(name = "List services", skip(pool))]
pub async fn list_services(pool: &PgPool) -> Result<Vec<Service>, sqlx::Error> {
    sqlx::query_as::<_, Service>(
        r#"
        SELECT id, title, slug, description, icon, features, benefits, category,
               sort_order, created_at, updated_at
        FROM services
        ORDER BY sort_order, title
        "#,
    )
    .fetch_all(pool)
    .await
}

#[tracing::instrument(name = "Find service by slug", skip(pool))]
pub async fn find_service_by_slug(
    pool: &PgPool,
    slug: &str,
) -> Result<Option<Service>, sqlx::Error> {
    sqlx::query_as::<_, Service>(
        r#"
        SELECT id, title, slug, description, icon, features, benefits, category,
               sort_order, created_at, updated_at
        FROM services
        WHERE slug = $1
        "#,
    )
    .bind(slug)
    .fetch_optional(pool)
    .await
}
