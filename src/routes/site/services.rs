use actix_web::{HttpResponse, web};
use sqlx::PgPool;
use tera::Tera;

use crate::content::{find_service_by_slug, list_services};
use crate::routes::helpers::{e500, render, render_not_found};

pub async fn services_index(
    pool: web::Data<PgPool>,
    tera: web::Data<Tera>,
) -> Result<HttpResponse, actix_web::Error> {
    let services = list_services(&pool).await.map_err(e500)?;
    let mut ctx = tera::Context::new();
    ctx.insert("services", &services);
    render(&tera, "services/index.html", &ctx)
}

pub async fn service_detail(
    slug: web::Path<String>,
    pool: web::Data<PgPool>,
    tera: web::Data<Tera>,
) -> Result<HttpResponse, actix_web::Error> {
    let Some(service) = find_service_by_slug(&pool, &slug).await.map_err(e500)? else {
        return render_not_found(&tera);
    };
    let mut ctx = tera::Context::new();
    ctx.insert("service", &service);
    render(&tera, "services/detail.html", &ctx)
}
