use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub seo_title: Option<String>,
    pub seo_desc: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct CategoryWithCount {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub category: Category,
    /// Published posts only.
    pub blog_count: i64,
}

#[tracing::instrument(name = "List categories", skip(pool))]
pub async fn list_categories(pool: &PgPool) -> Result<Vec<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(
        r#"
        SELECT id, name, slug, description, image, seo_title, seo_desc, created_at, updated_at
        FROM categories
        ORDER BY name
        "#,
    )
    .fetch_all(pool)
    .await
}

#[tracing::instrument(name = "List categories with blog counts", skip(pool))]
pub async fn list_categories_with_counts(
    pool: &PgPool,
) -> Result<Vec<CategoryWithCount>, sqlx::Error> {
    sqlx::query_as::<_, CategoryWithCount>(
        r#"
        SELECT
            c.id, c.name, c.slug, c.description, c.image, c.seo_title, c.seo_desc,
            c.created_at, c.updated_at,
            COUNT(b.id) AS blog_count
        FROM categories c
        LEFT JOIN blogs b ON b.category_id = c.id AND b.status = 'PUBLISHED'
        GROUP BY c.id
        ORDER BY c.name
        "#,
    )
    .fetch_all(pool)
    .await
}

#[tracing::instrument(name = "Find category by id", skip(pool))]
pub async fn find_category_by_id(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(
        r#"
        SELECT id, name, slug, description, image, seo_title, seo_desc, created_at, updated_at
        FROM categories
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}
