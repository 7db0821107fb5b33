use actix_web::{HttpResponse, web};
use sqlx::PgPool;
use uuid::Uuid;

use super::{optional, required, slug_from};
use crate::content::{Category, find_category_by_id};
use crate::routes::helpers::ApiError;
use crate::storage_client::StorageClient;

#[derive(Debug, serde::Deserialize)]
pub struct CategoryPayload {
    name: String,
    description: Option<String>,
    image: Option<String>,
    seo_title: Option<String>,
    seo_desc: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
pub struct CategoryPatch {
    name: Option<String>,
    description: Option<String>,
    image: Option<String>,
    seo_title: Option<String>,
    seo_desc: Option<String>,
}

const RETURNING_CATEGORY: &str =
    "RETURNING id, name, slug, description, image, seo_title, seo_desc, created_at, updated_at";

#[tracing::instrument(name = "Create category", skip(body, pool))]
pub async fn create_category(
    body: web::Json<CategoryPayload>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let name = required("name", body.name)?;
    let slug = slug_from(&name)?;

    let sql = format!(
        r#"
        INSERT INTO categories (id, name, slug, description, image, seo_title, seo_desc)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        {RETURNING_CATEGORY}
        "#
    );
    let category = sqlx::query_as::<_, Category>(&sql)
        .bind(Uuid::new_v4())
        .bind(&name)
        .bind(slug.as_ref())
        .bind(optional(body.description))
        .bind(optional(body.image))
        .bind(optional(body.seo_title))
        .bind(optional(body.seo_desc))
        .fetch_one(pool.get_ref())
        .await?;

    Ok(HttpResponse::Created().json(category))
}

#[tracing::instrument(name = "Update category", skip(body, pool, storage))]
pub async fn update_category(
    id: web::Path<Uuid>,
    body: web::Json<CategoryPatch>,
    pool: web::Data<PgPool>,
    storage: web::Data<StorageClient>,
) -> Result<HttpResponse, ApiError> {
    let existing = find_category_by_id(&pool, *id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Category not found".into()))?;
    let patch = body.into_inner();

    let (name, slug) = match patch.name {
        Some(name) => {
            let name = required("name", name)?;
            let slug = slug_from(&name)?.into();
            (name, slug)
        }
        None => (existing.name.clone(), existing.slug.clone()),
    };
    let image = match patch.image {
        Some(image) => optional(Some(image)),
        None => existing.image.clone(),
    };
    let description = patch.description.map_or(existing.description, |d| optional(Some(d)));
    let seo_title = patch.seo_title.map_or(existing.seo_title, |t| optional(Some(t)));
    let seo_desc = patch.seo_desc.map_or(existing.seo_desc, |d| optional(Some(d)));

    let sql = format!(
        r#"
        UPDATE categories
        SET name = $2, slug = $3, description = $4, image = $5, seo_title = $6, seo_desc = $7,
            updated_at = now()
        WHERE id = $1
        {RETURNING_CATEGORY}
        "#
    );
    let category = sqlx::query_as::<_, Category>(&sql)
        .bind(existing.id)
        .bind(&name)
        .bind(&slug)
        .bind(description)
        .bind(&image)
        .bind(seo_title)
        .bind(seo_desc)
        .fetch_one(pool.get_ref())
        .await?;

    if existing.image.is_some() && existing.image != image {
        storage.delete_quietly(existing.image.as_deref()).await;
    }
    Ok(HttpResponse::Ok().json(category))
}

#[tracing::instrument(name = "Delete category", skip(pool, storage))]
pub async fn delete_category(
    id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
    storage: web::Data<StorageClient>,
) -> Result<HttpResponse, ApiError> {
    let category = find_category_by_id(&pool, *id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Category not found".into()))?;

    let blog_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM blogs WHERE category_id = $1")
        .bind(category.id)
        .fetch_one(pool.get_ref())
        .await?;
    if blog_count > 0 {
        return Err(ApiError::BadRequest(
            "Cannot delete a category that still has blogs".into(),
        ));
    }

    sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(category.id)
        .execute(pool.get_ref())
        .await?;
    storage.delete_quietly(category.image.as_deref()).await;

    Ok(HttpResponse::NoContent().finish())
}
