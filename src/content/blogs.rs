use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{like_pattern, non_blank};
use crate::domain::{Pagination, PublishStatus};

#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct Blog {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub image: Option<String>,
    pub category_id: Uuid,
    pub category_name: String,
    pub category_slug: String,
    pub author_id: Uuid,
    pub author_name: Option<String>,
    pub status: String,
    pub featured: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub seo_title: Option<String>,
    pub seo_desc: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Clone)]
pub struct BlogFilter {
    pub status: Option<PublishStatus>,
    /// Category slug.
    pub category: Option<String>,
    pub search: Option<String>,
    pub featured: Option<bool>,
}

impl BlogFilter {
    pub fn published() -> Self {
        Self {
            status: Some(PublishStatus::Published),
            ..Self::default()
        }
    }
}

const SELECT_BLOGS: &str = r#"
    SELECT
        b.id, b.title, b.slug, b.excerpt, b.content, b.image, b.category_id,
        c.name AS category_name, c.slug AS category_slug,
        b.author_id, u.name AS author_name,
        b.status, b.featured, b.published_at, b.seo_title, b.seo_desc,
        b.created_at, b.updated_at
    FROM blogs b
    JOIN categories c ON c.id = b.category_id
    JOIN users u ON u.user_id = b.author_id
"#;

const FILTER_BLOGS: &str = r#"
    WHERE ($1::text IS NULL OR b.status = $1)
      AND ($2::text IS NULL OR c.slug = $2)
      AND ($3::text IS NULL OR b.title ILIKE $3 OR b.excerpt ILIKE $3 OR b.content ILIKE $3)
      AND ($4::bool IS NULL OR b.featured = $4)
"#;

/// A page of blog posts, newest first, plus the total number of matches.
#[tracing::instrument(name = "List blogs", skip(pool))]
pub async fn list_blogs(
    pool: &PgPool,
    filter: &BlogFilter,
    pagination: Pagination,
) -> Result<(Vec<Blog>, i64), sqlx::Error> {
    let status = filter.status.map(|s| s.as_str());
    let category = non_blank(filter.category.as_deref());
    let search = non_blank(filter.search.as_deref()).map(like_pattern);

    let list_sql = format!(
        "{SELECT_BLOGS} {FILTER_BLOGS} \
         ORDER BY b.published_at DESC NULLS LAST, b.created_at DESC \
         LIMIT $5 OFFSET $6"
    );
    let blogs = sqlx::query_as::<_, Blog>(&list_sql)
        .bind(status)
        .bind(category)
        .bind(search.as_deref())
        .bind(filter.featured)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(pool)
        .await?;

    let count_sql = format!(
        "SELECT COUNT(*) FROM blogs b JOIN categories c ON c.id = b.category_id {FILTER_BLOGS}"
    );
    let total: i64 = sqlx::query_scalar(&count_sql)
        .bind(status)
        .bind(category)
        .bind(search.as_deref())
        .bind(filter.featured)
        .fetch_one(pool)
        .await?;

    Ok((blogs, total))
}

#[tracing::instrument(name = "Find blog by id", skip(pool))]
pub async fn find_blog_by_id(
    pool: &PgPool,
    id: Uuid,
    published_only: bool,
) -> Result<Option<Blog>, sqlx::Error> {
    let sql = format!("{SELECT_BLOGS} WHERE b.id = $1 AND (NOT $2 OR b.status = 'PUBLISHED')");
    sqlx::query_as::<_, Blog>(&sql)
        .bind(id)
        .bind(published_only)
        .fetch_optional(pool)
        .await
}

#[tracing::instrument(name = "Find published blog by slug", skip(pool))]
pub async fn find_published_blog_by_slug(
    pool: &PgPool,
    slug: &str,
) -> Result<Option<Blog>, sqlx::Error> {
    let sql = format!("{SELECT_BLOGS} WHERE b.slug = $1 AND b.status = 'PUBLISHED'");
    sqlx::query_as::<_, Blog>(&sql)
        .bind(slug)
        .fetch_optional(pool)
        .await
}

/// Other published posts of the same category, newest first.
#[tracing::instrument(name = "Find similar blogs", skip(pool, blog), fields(blog_id = %blog.id))]
pub async fn similar_blogs(
    pool: &PgPool,
    blog: &Blog,
    limit: i64,
) -> Result<Vec<Blog>, sqlx::Error> {
    let sql = format!(
        "{SELECT_BLOGS} \
         WHERE b.category_id = $1 AND b.id <> $2 AND b.status = 'PUBLISHED' \
         ORDER BY b.published_at DESC NULLS LAST \
         LIMIT $3"
    );
    sqlx::query_as::<_, Blog>(&sql)
        .bind(blog.category_id)
        .bind(blog.id)
        .bind(limit)
        .fetch_all(pool)
        .await
}
