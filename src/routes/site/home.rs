use actix_web::{HttpResponse, web};
use sqlx::PgPool;
use tera::Tera;

use crate::content::{BlogFilter, ProjectFilter, list_blogs, list_projects, list_services};
use crate::domain::Pagination;
use crate::routes::helpers::{e500, render};

pub async fn home(
    pool: web::Data<PgPool>,
    tera: web::Data<Tera>,
) -> Result<HttpResponse, actix_web::Error> {
    let (latest_blogs, _) = list_blogs(&pool, &BlogFilter::published(), Pagination::new(None, Some(3)))
        .await
        .map_err(e500)?;
    let featured = ProjectFilter {
        featured: Some(true),
        ..ProjectFilter::published()
    };
    let (featured_projects, _) = list_projects(&pool, &featured, Pagination::new(None, Some(6)))
        .await
        .map_err(e500)?;
    let services = list_services(&pool).await.map_err(e500)?;

    let mut ctx = tera::Context::new();
    ctx.insert("blogs", &latest_blogs);
    ctx.insert("projects", &featured_projects);
    ctx.insert("services", &services);
    render(&tera, "home.html", &ctx)
}
