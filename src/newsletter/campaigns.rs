use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{CampaignStatus, Pagination};

#[derive(Debug, Clone, Default, serde::Serialize, sqlx::FromRow)]
pub struct CampaignStats {
    pub sent: i32,
    pub delivered: i32,
    pub opened: i32,
    pub clicked: i32,
    pub failed: i32,
}

#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct Campaign {
    pub id: Uuid,
    pub name: String,
    pub subject: String,
    pub content: String,
    pub template_id: Option<Uuid>,
    pub status: String,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(flatten)]
    pub stats: CampaignStats,
}

impl Campaign {
    pub fn status(&self) -> Result<CampaignStatus, String> {
        CampaignStatus::try_from(self.status.clone())
    }
}

#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct EmailTemplate {
    pub id: Uuid,
    pub name: String,
    pub subject: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const SELECT_CAMPAIGNS: &str = r#"
    SELECT
        c.id, c.name, c.subject, c.content, c.template_id, c.status,
        c.scheduled_at, c.sent_at, c.created_at, c.updated_at,
        COALESCE(s.sent, 0) AS sent,
        COALESCE(s.delivered, 0) AS delivered,
        COALESCE(s.opened, 0) AS opened,
        COALESCE(s.clicked, 0) AS clicked,
        COALESCE(s.failed, 0) AS failed
    FROM campaigns c
    LEFT JOIN campaign_stats s ON s.campaign_id = c.id
"#;

#[tracing::instrument(name = "List campaigns", skip(pool))]
pub async fn list_campaigns(
    pool: &PgPool,
    status: Option<CampaignStatus>,
    pagination: Pagination,
) -> Result<(Vec<Campaign>, i64), sqlx::Error> {
    let status = status.map(|s| s.as_str());
    let sql = format!(
        "{SELECT_CAMPAIGNS} \
         WHERE ($1::text IS NULL OR c.status = $1) \
         ORDER BY c.created_at DESC \
         LIMIT $2 OFFSET $3"
    );
    let campaigns = sqlx::query_as::<_, Campaign>(&sql)
        .bind(status)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(pool)
        .await?;

    let total: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM campaigns WHERE ($1::text IS NULL OR status = $1)")
            .bind(status)
            .fetch_one(pool)
            .await?;

    Ok((campaigns, total))
}

#[tracing::instrument(name = "Find campaign", skip(pool))]
pub async fn find_campaign(pool: &PgPool, id: Uuid) -> Result<Option<Campaign>, sqlx::Error> {
    let sql = format!("{SELECT_CAMPAIGNS} WHERE c.id = $1");
    sqlx::query_as::<_, Campaign>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
}

#[tracing::instrument(name = "Mark campaign as failed", skip(pool))]
pub async fn mark_campaign_failed(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE campaigns SET status = 'FAILED', updated_at = now() WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

#[tracing::instrument(name = "List email templates", skip(pool))]
pub async fn list_templates(pool: &PgPool) -> Result<Vec<EmailTemplate>, sqlx::Error> {
    sqlx::query_as::<_, EmailTemplate>(
        r#"
        SELECT id, name, subject, content, created_at, updated_at
        FROM email_templates
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await
}

#[tracing::instrument(name = "Find email template", skip(pool))]
pub async fn find_template(pool: &PgPool, id: Uuid) -> Result<Option<EmailTemplate>, sqlx::Error> {
    sqlx::query_as::<_, EmailTemplate>(
        r#"
        SELECT id, name, subject, content, created_at, updated_at
        FROM email_templates
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}
