use actix_web::{HttpResponse, web};
use sqlx::PgPool;
use uuid::Uuid;

use super::{optional, required, slug_from};
use crate::content::Service;
use crate::routes::helpers::ApiError;

#[derive(Debug, serde::Deserialize)]
pub struct ServicePayload {
    title: String,
    description: String,
    icon: Option<String>,
    #[serde(default)]
    features: Vec<String>,
    #[serde(default)]
    benefits: Vec<String>,
    category: String,
    #[serde(default)]
    sort_order: i32,
}

#[derive(Debug, serde::Deserialize)]
pub struct ServicePatch {
    title: Option<String>,
    description: Option<String>,
    icon: Option<String>,
    features: Option<Vec<String>>,
    benefits: Option<Vec<String>>,
    category: Option<String>,
    sort_order: Option<i32>,
}

const SERVICE_COLUMNS: &str = "id, title, slug, description, icon, features, benefits, category, \
                               sort_order, created_at, updated_at";

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

async fn find_service(pool: &PgPool, id: Uuid) -> Result<Service, ApiError> {
    let sql = format!("SELECT {SERVICE_COLUMNS} FROM services WHERE id = $1");
    sqlx::query_as::<_, Service>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Service not found".into()))
}

#[tracing::instrument(name = "Create service", skip(body, pool))]
pub async fn create_service(
    body: web::Json<ServicePayload>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let title = required("title", body.title)?;
    let slug = slug_from(&title)?;

    let sql = format!(
        r#"
        INSERT INTO services (id, title, slug, description, icon, features, benefits, category, sort_order)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {SERVICE_COLUMNS}
        "#
    );
    let service = sqlx::query_as::<_, Service>(&sql)
        .bind(Uuid::new_v4())
        .bind(&title)
        .bind(slug.as_ref())
        .bind(required("description", body.description)?)
        .bind(optional(body.icon).unwrap_or_default())
        .bind(clean_list(body.features))
        .bind(clean_list(body.benefits))
        .bind(required("category", body.category)?)
        .bind(body.sort_order)
        .fetch_one(pool.get_ref())
        .await?;

    Ok(HttpResponse::Created().json(service))
}

#[tracing::instrument(name = "Update service", skip(body, pool))]
pub async fn update_service(
    id: web::Path<Uuid>,
    body: web::Json<ServicePatch>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let existing = find_service(&pool, *id).await?;
    let patch = body.into_inner();

    let (title, slug) = match patch.title {
        Some(title) if title.trim() != existing.title => {
            let title = required("title", title)?;
            let slug: String = slug_from(&title)?.into();
            (title, slug)
        }
        _ => (existing.title, existing.slug),
    };
    let description = match patch.description {
        Some(description) => required("description", description)?,
        None => existing.description,
    };
    let category = match patch.category {
        Some(category) => required("category", category)?,
        None => existing.category,
    };

    let sql = format!(
        r#"
        UPDATE services
        SET title = $2, slug = $3, description = $4, icon = $5, features = $6, benefits = $7,
            category = $8, sort_order = $9, updated_at = now()
        WHERE id = $1
        RETURNING {SERVICE_COLUMNS}
        "#
    );
    let service = sqlx::query_as::<_, Service>(&sql)
        .bind(existing.id)
        .bind(&title)
        .bind(&slug)
        .bind(&description)
        .bind(patch.icon.map_or(existing.icon, |icon| icon.trim().to_string()))
        .bind(patch.features.map_or(existing.features, clean_list))
        .bind(patch.benefits.map_or(existing.benefits, clean_list))
        .bind(&category)
        .bind(patch.sort_order.unwrap_or(existing.sort_order))
        .fetch_one(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(service))
}

#[tracing::instrument(name = "Delete service", skip(pool))]
pub async fn delete_service(
    id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let deleted = sqlx::query("DELETE FROM services WHERE id = $1")
        .bind(*id)
        .execute(pool.get_ref())
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(ApiError::NotFound("Service not found".into()));
    }
    Ok(HttpResponse::NoContent().finish())
}
