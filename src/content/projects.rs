use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{like_pattern, non_blank};
use crate::domain::{Pagination, PublishStatus};

#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub content: String,
    pub image: Option<String>,
    pub demo_url: Option<String>,
    pub github_url: Option<String>,
    pub category: String,
    pub author_id: Uuid,
    pub status: String,
    pub featured: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tags: Vec<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ProjectFilter {
    pub status: Option<PublishStatus>,
    pub category: Option<String>,
    /// Tag slug.
    pub tag: Option<String>,
    pub search: Option<String>,
    pub featured: Option<bool>,
}

impl ProjectFilter {
    pub fn published() -> Self {
        Self {
            status: Some(PublishStatus::Published),
            ..Self::default()
        }
    }
}

const SELECT_PROJECTS: &str = r#"
    SELECT
        p.id, p.title, p.slug, p.description, p.content, p.image,
        p.demo_url, p.github_url, p.category, p.author_id, p.status,
        p.featured, p.published_at, p.created_at, p.updated_at,
        COALESCE(
            (SELECT array_agg(t.name ORDER BY t.name)
             FROM project_tags pt JOIN tags t ON t.id = pt.tag_id
             WHERE pt.project_id = p.id),
            '{}'
        ) AS tags
    FROM projects p
"#;

const FILTER_PROJECTS: &str = r#"
    WHERE ($1::text IS NULL OR p.status = $1)
      AND ($2::text IS NULL OR p.category = $2)
      AND ($3::text IS NULL OR EXISTS (
            SELECT 1 FROM project_tags pt JOIN tags t ON t.id = pt.tag_id
            WHERE pt.project_id = p.id AND t.slug = $3))
      AND ($4::text IS NULL OR p.title ILIKE $4 OR p.description ILIKE $4)
      AND ($5::bool IS NULL OR p.featured = $5)
"#;

#[tracing::instrument(name = "List projects", skip(pool))]
pub async fn list_projects(
    pool: &PgPool,
    filter: &ProjectFilter,
    pagination: Pagination,
) -> Result<(Vec<Project>, i64), sqlx::Error> {
    let status = filter.status.map(|s| s.as_str());
    let category = non_blank(filter.category.as_deref());
    let tag = non_blank(filter.tag.as_deref());
    let search = non_blank(filter.search.as_deref()).map(like_pattern);

    let list_sql = format!(
        "{SELECT_PROJECTS} {FILTER_PROJECTS} \
         ORDER BY p.featured DESC, p.published_at DESC NULLS LAST, p.created_at DESC \
         LIMIT $6 OFFSET $7"
    );
    let projects = sqlx::query_as::<_, Project>(&list_sql)
        .bind(status)
        .bind(category)
        .bind(tag)
        .bind(search.as_deref())
        .bind(filter.featured)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(pool)
        .await?;

    let count_sql = format!("SELECT COUNT(*) FROM projects p {FILTER_PROJECTS}");
    let total: i64 = sqlx::query_scalar(&count_sql)
        .bind(status)
        .bind(category)
        .bind(tag)
        .bind(search.as_deref())
        .bind(filter.featured)
        .fetch_one(pool)
        .await?;

    Ok((projects, total))
}

#[tracing::instrument(name = "Find project by id", skip(pool))]
pub async fn find_project_by_id(
    pool: &PgPool,
    id: Uuid,
    published_only: bool,
) -> Result<Option<Project>, sqlx::Error> {
    let sql =
        format!("{SELECT_PROJECTS} WHERE p.id = $1 AND (NOT $2 OR p.status = 'PUBLISHED')");
    sqlx::query_as::<_, Project>(&sql)
        .bind(id)
        .bind(published_only)
        .fetch_optional(pool)
        .await
}

#[tracing::instrument(name = "Find published project by slug", skip(pool))]
pub async fn find_published_project_by_slug(
    pool: &PgPool,
    slug: &str,
) -> Result<Option<Project>, sqlx::Error> {
    let sql = format!("{SELECT_PROJECTS} WHERE p.slug = $1 AND p.status = 'PUBLISHED'");
    sqlx::query_as::<_, Project>(&sql)
        .bind(slug)
        .fetch_optional(pool)
        .await
}
