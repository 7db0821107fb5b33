use actix_web::{HttpResponse, web};
use sqlx::PgPool;
use uuid::Uuid;

use crate::content::{
    BlogFilter, ProjectFilter, find_blog_by_id, find_category_by_id, find_project_by_id,
    list_blogs, list_categories_with_counts, list_projects, list_services,
};
use crate::domain::Pagination;
use crate::routes::helpers::ApiError;

#[derive(Debug, serde::Deserialize)]
pub struct BlogsQuery {
    page: Option<i64>,
    limit: Option<i64>,
    category: Option<String>,
    search: Option<String>,
    featured: Option<bool>,
}

#[tracing::instrument(name = "List published blogs", skip(pool))]
pub async fn get_blogs(
    query: web::Query<BlogsQuery>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let BlogsQuery {
        page,
        limit,
        category,
        search,
        featured,
    } = query.into_inner();
    let pagination = Pagination::new(page, limit);
    let filter = BlogFilter {
        category,
        search,
        featured,
        ..BlogFilter::published()
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

#[tracing::instrument(name = "Get published blog", skip(pool))]
pub async fn get_blog(
    id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let blog = find_blog_by_id(&pool, *id, true)
        .await?
        .ok_or_else(|| ApiError::NotFound("Blog not found".into()))?;
    Ok(HttpResponse::Ok().json(blog))
}

#[derive(Debug, serde::Deserialize)]
pub struct ProjectsQuery {
    page: Option<i64>,
    limit: Option<i64>,
    category: Option<String>,
    tag: Option<String>,
    search: Option<String>,
    featured: Option<bool>,
}

#[tracing::instrument(name = "List published projects", skip(pool))]
pub async fn get_projects(
    query: web::Query<ProjectsQuery>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let ProjectsQuery {
        page,
        limit,
        category,
        tag,
        search,
        featured,
    } = query.into_inner();
    let pagination = Pagination::new(page, limit);
    let filter = ProjectFilter {
        category,
        tag,
        search,
        featured,
        ..ProjectFilter::published()
    };
    let (projects, total) = list_projects(&pool, &filter, pagination).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "projects": projects,
        "total": total,
        "page_count": pagination.page_count(total),
        "current_page": pagination.page(),
        "has_more": pagination.has_more(total),
    })))
}

#[tracing::instrument(name = "Get published project", skip(pool))]
pub async fn get_project(
    id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let project = find_project_by_id(&pool, *id, true)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".into()))?;
    Ok(HttpResponse::Ok().json(project))
}

pub async fn get_categories(pool: web::Data<PgPool>) -> Result<HttpResponse, ApiError> {
    let categories = list_categories_with_counts(&pool).await?;
    Ok(HttpResponse::Ok().json(categories))
}

pub async fn get_category(
    id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let category = find_category_by_id(&pool, *id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Category not found".into()))?;
    Ok(HttpResponse::Ok().json(category))
}

pub async fn get_services(pool: web::Data<PgPool>) -> Result<HttpResponse, ApiError> {
    let services = list_services(&pool).await?;
    Ok(HttpResponse::Ok().json(services))
}
