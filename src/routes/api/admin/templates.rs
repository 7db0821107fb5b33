use actix_web::{HttpResponse, web};
use sqlx::PgPool;
use uuid::Uuid;

use super::required;
use crate::newsletter::{EmailTemplate, find_template, list_templates};
use crate::routes::helpers::ApiError;

#[derive(Debug, serde::Deserialize)]
pub struct TemplatePayload {
    name: String,
    subject: String,
    content: String,
}

#[derive(Debug, serde::Deserialize)]
pub struct TemplatePatch {
    name: Option<String>,
    subject: Option<String>,
    content: Option<String>,
}

const RETURNING_TEMPLATE: &str = "RETURNING id, name, subject, content, created_at, updated_at";

pub async fn get_templates(pool: web::Data<PgPool>) -> Result<HttpResponse, ApiError> {
    let templates = list_templates(&pool).await?;
    Ok(HttpResponse::Ok().json(templates))
}

pub async fn get_template(
    id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let template = find_template(&pool, *id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Template not found".into()))?;
    Ok(HttpResponse::Ok().json(template))
}

#[tracing::instrument(name = "Create email template", skip(body, pool), fields(name = %body.name))]
pub async fn create_template(
    body: web::Json<TemplatePayload>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let TemplatePayload {
        name,
        subject,
        content,
    } = body.into_inner();
    let sql = format!(
        r#"
        INSERT INTO email_templates (id, name, subject, content)
        VALUES ($1, $2, $3, $4)
        {RETURNING_TEMPLATE}
        "#
    );
    let template = sqlx::query_as::<_, EmailTemplate>(&sql)
        .bind(Uuid::new_v4())
        .bind(required("name", name)?)
        .bind(required("subject", subject)?)
        .bind(required("content", content)?)
        .fetch_one(pool.get_ref())
        .await?;
    Ok(HttpResponse::Created().json(template))
}

#[tracing::instrument(name = "Update email template", skip(body, pool))]
pub async fn update_template(
    id: web::Path<Uuid>,
    body: web::Json<TemplatePatch>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let existing = find_template(&pool, *id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Template not found".into()))?;
    let patch = body.into_inner();
    let name = match patch.name {
        Some(name) => required("name", name)?,
        None => existing.name,
    };
    let subject = match patch.subject {
        Some(subject) => required("subject", subject)?,
        None => existing.subject,
    };
    let content = match patch.content {
        Some(content) => required("content", content)?,
        None => existing.content,
    };

    let sql = format!(
        r#"
        UPDATE email_templates
        SET name = $2, subject = $3, content = $4, updated_at = now()
        WHERE id = $1
        {RETURNING_TEMPLATE}
        "#
    );
    let template = sqlx::query_as::<_, EmailTemplate>(&sql)
        .bind(existing.id)
        .bind(name)
        .bind(subject)
        .bind(content)
        .fetch_one(pool.get_ref())
        .await?;
    Ok(HttpResponse::Ok().json(template))
}

#[tracing::instrument(name = "Delete email template", skip(pool))]
pub async fn delete_template(
    id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let deleted = sqlx::query("DELETE FROM email_templates WHERE id = $1")
        .bind(*id)
        .execute(pool.get_ref())
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(ApiError::NotFound("Template not found".into()));
    }
    Ok(HttpResponse::NoContent().finish())
}
