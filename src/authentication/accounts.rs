use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// A user as exposed over the API. Never carries password data.
#[derive(Debug, serde::Serialize, sqlx::FromRow)]
pub struct Account {
    pub user_id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[tracing::instrument(name = "Find account", skip(pool))]
pub async fn find_account(pool: &PgPool, user_id: Uuid) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT user_id, email, name, role, created_at, updated_at
        FROM users
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}
