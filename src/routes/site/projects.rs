use actix_web::{HttpResponse, web};
use sqlx::PgPool;
use tera::Tera;

use super::PAGE_SIZE;
use crate::content::{ProjectFilter, find_published_project_by_slug, list_projects};
use crate::domain::Pagination;
use crate::routes::helpers::{e500, render, render_not_found};

#[derive(Debug, serde::Deserialize)]
pub struct ProjectsQuery {
    page: Option<i64>,
    category: Option<String>,
    tag: Option<String>,
    search: Option<String>,
}

#[tracing::instrument(name = "Projects page", skip(pool, tera))]
pub async fn projects_index(
    query: web::Query<ProjectsQuery>,
    pool: web::Data<PgPool>,
    tera: web::Data<Tera>,
) -> Result<HttpResponse, actix_web::Error> {
    let ProjectsQuery {
        page,
        category,
        tag,
        search,
    } = query.into_inner();
    let pagination = Pagination::with_default_limit(page, None, PAGE_SIZE);
    let filter = ProjectFilter {
        category: category.clone(),
        tag: tag.clone(),
        search: search.clone(),
        ..ProjectFilter::published()
    };
    let (projects, total) = list_projects(&pool, &filter, pagination)
        .await
        .map_err(e500)?;

    let mut ctx = tera::Context::new();
    ctx.insert("projects", &projects);
    ctx.insert("page", &pagination.page());
    ctx.insert("page_count", &pagination.page_count(total));
    ctx.insert("category", &category.unwrap_or_default());
    ctx.insert("tag", &tag.unwrap_or_default());
    ctx.insert("search", &search.unwrap_or_default());
    render(&tera, "projects/index.html", &ctx)
}

pub async fn project_detail(
    slug: web::Path<String>,
    pool: web::Data<PgPool>,
    tera: web::Data<Tera>,
) -> Result<HttpResponse, actix_web::Error> {
    let Some(project) = find_published_project_by_slug(&pool, &slug)
        .await
        .map_err(e500)?
    else {
        return render_not_found(&tera);
    };

    let mut ctx = tera::Context::new();
    ctx.insert("project", &project);
    render(&tera, "projects/detail.html", &ctx)
}
