use actix_web::{HttpResponse, web};
use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::{optional, optional_url, publication_date, required, slug_from};
use crate::authentication::UserId;
use crate::content::find_project_by_id;
use crate::domain::{PublishStatus, Slug, normalize_tags};
use crate::routes::helpers::ApiError;
use crate::storage_client::StorageClient;

#[derive(Debug, serde::Deserialize)]
pub struct ProjectPayload {
    title: String,
    description: String,
    content: String,
    image: Option<String>,
    demo_url: Option<String>,
    github_url: Option<String>,
    category: String,
    #[serde(default)]
    tags: Vec<String>,
    status: Option<PublishStatus>,
    #[serde(default)]
    featured: bool,
    published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, serde::Deserialize)]
pub struct ProjectPatch {
    title: Option<String>,
    description: Option<String>,
    content: Option<String>,
    image: Option<String>,
    demo_url: Option<String>,
    github_url: Option<String>,
    category: Option<String>,
    tags: Option<Vec<String>>,
    status: Option<PublishStatus>,
    featured: Option<bool>,
    published_at: Option<DateTime<Utc>>,
}

struct ProjectRecord {
    title: String,
    slug: String,
    description: String,
    content: String,
    image: Option<String>,
    demo_url: Option<String>,
    github_url: Option<String>,
    category: String,
    status: PublishStatus,
    featured: bool,
    published_at: Option<DateTime<Utc>>,
}

/// Attach `tags` to the project, creating the missing ones. Names that do
/// not produce a slug are ignored.
#[tracing::instrument(name = "Upsert project tags", skip(connection))]
async fn attach_tags(
    connection: &mut PgConnection,
    project_id: Uuid,
    tags: &[String],
) -> Result<(), sqlx::Error> {
    for name in normalize_tags(tags) {
        let Ok(slug) = Slug::from_title(&name) else {
            continue;
        };
        let tag_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO tags (id, name, slug)
            VALUES ($1, $2, $3)
            ON CONFLICT (slug) DO UPDATE SET name = tags.name
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&name)
        .bind(slug.as_ref())
        .fetch_one(&mut *connection)
        .await?;

        sqlx::query(
            "INSERT INTO project_tags (project_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(project_id)
        .bind(tag_id)
        .execute(&mut *connection)
        .await?;
    }
    Ok(())
}

#[tracing::instrument(
    name = "Create project",
    skip(body, pool, user_id),
    fields(author_id = %&*user_id)
)]
pub async fn create_project(
    body: web::Json<ProjectPayload>,
    pool: web::Data<PgPool>,
    user_id: web::ReqData<UserId>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let title = required("title", body.title)?;
    let status = body.status.unwrap_or(PublishStatus::Draft);
    let record = ProjectRecord {
        slug: slug_from(&title)?.into(),
        title,
        description: required("description", body.description)?,
        content: required("content", body.content)?,
        image: optional(body.image),
        demo_url: optional_url("demo_url", body.demo_url)?,
        github_url: optional_url("github_url", body.github_url)?,
        category: required("category", body.category)?,
        status,
        featured: body.featured,
        published_at: publication_date(status, body.published_at),
    };

    let mut transaction = pool
        .begin()
        .await
        .context("Failed to acquire a Postgres connection from the pool.")?;
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO projects (
            id, title, slug, description, content, image, demo_url, github_url,
            category, author_id, status, featured, published_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        "#,
    )
    .bind(id)
    .bind(&record.title)
    .bind(&record.slug)
    .bind(&record.description)
    .bind(&record.content)
    .bind(&record.image)
    .bind(&record.demo_url)
    .bind(&record.github_url)
    .bind(&record.category)
    .bind(**user_id)
    .bind(record.status.as_str())
    .bind(record.featured)
    .bind(record.published_at)
    .execute(&mut *transaction)
    .await?;
    attach_tags(&mut transaction, id, &body.tags).await?;
    transaction
        .commit()
        .await
        .context("Failed to commit SQL transaction to store a new project.")?;

    let project = find_project_by_id(&pool, id, false)
        .await?
        .context("The project disappeared right after being created.")?;
    Ok(HttpResponse::Created().json(project))
}

#[tracing::instrument(name = "Update project", skip(body, pool, storage))]
pub async fn update_project(
    id: web::Path<Uuid>,
    body: web::Json<ProjectPatch>,
    pool: web::Data<PgPool>,
    storage: web::Data<StorageClient>,
) -> Result<HttpResponse, ApiError> {
    let existing = find_project_by_id(&pool, *id, false)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".into()))?;
    let patch = body.into_inner();

    let (title, slug) = match patch.title {
        Some(title) if title.trim() != existing.title => {
            let title = required("title", title)?;
            let slug = slug_from(&title)?.into();
            (title, slug)
        }
        _ => (existing.title.clone(), existing.slug.clone()),
    };
    let status = match patch.status {
        Some(status) => status,
        None => PublishStatus::try_from(existing.status.clone())
            .map_err(|e| anyhow::anyhow!(e).context("Stored project status is invalid."))?,
    };
    let record = ProjectRecord {
        title,
        slug,
        description: match patch.description {
            Some(description) => required("description", description)?,
            None => existing.description.clone(),
        },
        content: match patch.content {
            Some(content) => required("content", content)?,
            None => existing.content.clone(),
        },
        image: match patch.image {
            Some(image) => optional(Some(image)),
            None => existing.image.clone(),
        },
        demo_url: match patch.demo_url {
            Some(url) => optional_url("demo_url", Some(url))?,
            None => existing.demo_url.clone(),
        },
        github_url: match patch.github_url {
            Some(url) => optional_url("github_url", Some(url))?,
            None => existing.github_url.clone(),
        },
        category: match patch.category {
            Some(category) => required("category", category)?,
            None => existing.category.clone(),
        },
        status,
        featured: patch.featured.unwrap_or(existing.featured),
        published_at: publication_date(status, patch.published_at.or(existing.published_at)),
    };

    let mut transaction = pool
        .begin()
        .await
        .context("Failed to acquire a Postgres connection from the pool.")?;
    sqlx::query(
        r#"
        UPDATE projects
        SET title = $2, slug = $3, description = $4, content = $5, image = $6,
            demo_url = $7, github_url = $8, category = $9, status = $10, featured = $11,
            published_at = $12, updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(existing.id)
    .bind(&record.title)
    .bind(&record.slug)
    .bind(&record.description)
    .bind(&record.content)
    .bind(&record.image)
    .bind(&record.demo_url)
    .bind(&record.github_url)
    .bind(&record.category)
    .bind(record.status.as_str())
    .bind(record.featured)
    .bind(record.published_at)
    .execute(&mut *transaction)
    .await?;
    if let Some(tags) = &patch.tags {
        sqlx::query("DELETE FROM project_tags WHERE project_id = $1")
            .bind(existing.id)
            .execute(&mut *transaction)
            .await?;
        attach_tags(&mut transaction, existing.id, tags).await?;
    }
    transaction
        .commit()
        .await
        .context("Failed to commit SQL transaction to update a project.")?;

    if existing.image.is_some() && existing.image != record.image {
        storage.delete_quietly(existing.image.as_deref()).await;
    }
    let project = find_project_by_id(&pool, existing.id, false)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".into()))?;
    Ok(HttpResponse::Ok().json(project))
}

#[tracing::instrument(name = "Delete project", skip(pool, storage))]
pub async fn delete_project(
    id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
    storage: web::Data<StorageClient>,
) -> Result<HttpResponse, ApiError> {
    let image: Option<Option<String>> =
        sqlx::query_scalar("DELETE FROM projects WHERE id = $1 RETURNING image")
            .bind(*id)
            .fetch_optional(pool.get_ref())
            .await?;
    let Some(image) = image else {
        return Err(ApiError::NotFound("Project not found".into()));
    };
    storage.delete_quietly(image.as_deref()).await;
    Ok(HttpResponse::NoContent().finish())
}
