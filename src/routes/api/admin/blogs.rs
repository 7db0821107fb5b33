use actix_web::{HttpResponse, web};
use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{optional, publication_date, required, slug_from};
use crate::authentication::UserId;
use crate::content::{BlogFilter, find_blog_by_id, find_category_by_id, list_blogs};
use crate::domain::{Pagination, PublishStatus};
use crate::routes::helpers::ApiError;
use crate::storage_client::StorageClient;

#[derive(Debug, serde::Deserialize)]
pub struct AdminBlogsQuery {
    page: Option<i64>,
    limit: Option<i64>,
    status: Option<String>,
    category: Option<String>,
    search: Option<String>,
}

#[tracing::instrument(name = "Admin list blogs", skip(pool))]
pub async fn admin_list_blogs(
    query: web::Query<AdminBlogsQuery>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let AdminBlogsQuery {
        page,
        limit,
        status,
        category,
        search,
    } = query.into_inner();
    let status = optional(status)
        .map(PublishStatus::try_from)
        .transpose()
        .map_err(ApiError::BadRequest)?;
    let pagination = Pagination::new(page, limit);
    let filter = BlogFilter {
        status,
        category,
        search,
        featured: None,
    };
    let (blogs, total) = list_blogs(&pool, &filter, pagination).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "blogs": blogs,
        "total": total,
        "page_count": pagination.page_count(total),
        "current_page": pagination.page(),
        "has_more": pagination.has_more(total),
    })))
}

pub async fn admin_get_blog(
    id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let blog = find_blog_by_id(&pool, *id, false)
        .await?
        .ok_or_else(|| ApiError::NotFound("Blog not found".into()))?;
    Ok(HttpResponse::Ok().json(blog))
}

#[derive(Debug, serde::Deserialize)]
pub struct BlogPayload {
    title: String,
    excerpt: String,
    content: String,
    image: Option<String>,
    category_id: Uuid,
    status: Option<PublishStatus>,
    #[serde(default)]
    featured: bool,
    published_at: Option<DateTime<Utc>>,
    seo_title: Option<String>,
    seo_desc: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
pub struct BlogPatch {
    title: Option<String>,
    excerpt: Option<String>,
    content: Option<String>,
    image: Option<String>,
    category_id: Option<Uuid>,
    status: Option<PublishStatus>,
    featured: Option<bool>,
    published_at: Option<DateTime<Utc>>,
    seo_title: Option<String>,
    seo_desc: Option<String>,
}

/// Blog fields after validation, as they are written to the database.
struct BlogRecord {
    title: String,
    slug: String,
    excerpt: String,
    content: String,
    image: Option<String>,
    category_id: Uuid,
    status: PublishStatus,
    featured: bool,
    published_at: Option<DateTime<Utc>>,
    seo_title: Option<String>,
    seo_desc: Option<String>,
}

async fn ensure_category_exists(pool: &PgPool, category_id: Uuid) -> Result<(), ApiError> {
    if find_category_by_id(pool, category_id).await?.is_none() {
        return Err(ApiError::ValidationError("Unknown category.".into()));
    }
    Ok(())
}

#[tracing::instrument(
    name = "Create blog",
    skip(body, pool, user_id),
    fields(author_id = %&*user_id)
)]
pub async fn create_blog(
    body: web::Json<BlogPayload>,
    pool: web::Data<PgPool>,
    user_id: web::ReqData<UserId>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let title = required("title", body.title)?;
    let status = body.status.unwrap_or(PublishStatus::Draft);
    let record = BlogRecord {
        slug: slug_from(&title)?.into(),
        title,
        excerpt: required("excerpt", body.excerpt)?,
        content: required("content", body.content)?,
        image: optional(body.image),
        category_id: body.category_id,
        status,
        featured: body.featured,
        published_at: publication_date(status, body.published_at),
        seo_title: optional(body.seo_title),
        seo_desc: optional(body.seo_desc),
    };
    ensure_category_exists(&pool, record.category_id).await?;

    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO blogs (
            id, title, slug, excerpt, content, image, category_id, author_id,
            status, featured, published_at, seo_title, seo_desc
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        "#,
    )
    .bind(id)
    .bind(&record.title)
    .bind(&record.slug)
    .bind(&record.excerpt)
    .bind(&record.content)
    .bind(&record.image)
    .bind(record.category_id)
    .bind(**user_id)
    .bind(record.status.as_str())
    .bind(record.featured)
    .bind(record.published_at)
    .bind(&record.seo_title)
    .bind(&record.seo_desc)
    .execute(pool.get_ref())
    .await?;

    let blog = find_blog_by_id(&pool, id, false)
        .await?
        .context("The blog disappeared right after being created.")?;
    Ok(HttpResponse::Created().json(blog))
}

#[tracing::instrument(name = "Update blog", skip(body, pool, storage))]
pub async fn update_blog(
    id: web::Path<Uuid>,
    body: web::Json<BlogPatch>,
    pool: web::Data<PgPool>,
    storage: web::Data<StorageClient>,
) -> Result<HttpResponse, ApiError> {
    let existing = find_blog_by_id(&pool, *id, false)
        .await?
        .ok_or_else(|| ApiError::NotFound("Blog not found".into()))?;
    let patch = body.into_inner();

    // The slug only follows the title when the title actually changes.
    let (title, slug) = match patch.title {
        Some(title) => {
            let title = required("title", title)?;
            if title == existing.title {
                (title, existing.slug.clone())
            } else {
                let slug = slug_from(&title)?.into();
                (title, slug)
            }
        }
        None => (existing.title.clone(), existing.slug.clone()),
    };
    let status = match patch.status {
        Some(status) => status,
        None => PublishStatus::try_from(existing.status.clone())
            .map_err(|e| anyhow::anyhow!(e).context("Stored blog status is invalid."))?,
    };
    let record = BlogRecord {
        title,
        slug,
        excerpt: match patch.excerpt {
            Some(excerpt) => required("excerpt", excerpt)?,
            None => existing.excerpt.clone(),
        },
        content: match patch.content {
            Some(content) => required("content", content)?,
            None => existing.content.clone(),
        },
        image: match patch.image {
            Some(image) => optional(Some(image)),
            None => existing.image.clone(),
        },
        category_id: patch.category_id.unwrap_or(existing.category_id),
        status,
        featured: patch.featured.unwrap_or(existing.featured),
        published_at: publication_date(status, patch.published_at.or(existing.published_at)),
        seo_title: patch
            .seo_title
            .map_or(existing.seo_title.clone(), |t| optional(Some(t))),
        seo_desc: patch
            .seo_desc
            .map_or(existing.seo_desc.clone(), |d| optional(Some(d))),
    };
    if record.category_id != existing.category_id {
        ensure_category_exists(&pool, record.category_id).await?;
    }

    sqlx::query(
        r#"
        UPDATE blogs
        SET title = $2, slug = $3, excerpt = $4, content = $5, image = $6, category_id = $7,
            status = $8, featured = $9, published_at = $10, seo_title = $11, seo_desc = $12,
            updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(existing.id)
    .bind(&record.title)
    .bind(&record.slug)
    .bind(&record.excerpt)
    .bind(&record.content)
    .bind(&record.image)
    .bind(record.category_id)
    .bind(record.status.as_str())
    .bind(record.featured)
    .bind(record.published_at)
    .bind(&record.seo_title)
    .bind(&record.seo_desc)
    .execute(pool.get_ref())
    .await?;

    if existing.image.is_some() && existing.image != record.image {
        storage.delete_quietly(existing.image.as_deref()).await;
    }
    let blog = find_blog_by_id(&pool, existing.id, false)
        .await?
        .ok_or_else(|| ApiError::NotFound("Blog not found".into()))?;
    Ok(HttpResponse::Ok().json(blog))
}

#[tracing::instrument(name = "Delete blog", skip(pool, storage))]
pub async fn delete_blog(
    id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
    storage: web::Data<StorageClient>,
) -> Result<HttpResponse, ApiError> {
    let image: Option<Option<String>> =
        sqlx::query_scalar("DELETE FROM blogs WHERE id = $1 RETURNING image")
            .bind(*id)
            .fetch_optional(pool.get_ref())
            .await?;
    let Some(image) = image else {
        return Err(ApiError::NotFound("Blog not found".into()));
    };
    storage.delete_quietly(image.as_deref()).await;
    Ok(HttpResponse::NoContent().finish())
}
