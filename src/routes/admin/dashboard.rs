use actix_web::{HttpResponse, web};
use anyhow::Context;
use sqlx::PgPool;
use tera::Tera;

use super::password::get_email;
use crate::authentication::UserId;
use crate::routes::helpers::{e500, render};

#[derive(Debug, serde::Serialize, sqlx::FromRow)]
struct DashboardCounts {
    projects: i64,
    blogs: i64,
    subscribers: i64,
    users: i64,
}

pub async fn admin_dashboard(
    pool: web::Data<PgPool>,
    tera: web::Data<Tera>,
    user_id: web::ReqData<UserId>,
) -> Result<HttpResponse, actix_web::Error> {
    let email = get_email(**user_id, &pool).await.map_err(e500)?;
    let counts = get_counts(&pool).await.map_err(e500)?;

    let mut ctx = tera::Context::new();
    ctx.insert("email", &email);
    ctx.insert("counts", &counts);
    render(&tera, "admin/dashboard.html", &ctx)
}

#[tracing::instrument(name = "Get dashboard counts", skip(pool))]
async fn get_counts(pool: &PgPool) -> Result<DashboardCounts, anyhow::Error> {
    sqlx::query_as::<_, DashboardCounts>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM projects) AS projects,
            (SELECT COUNT(*) FROM blogs) AS blogs,
            (SELECT COUNT(*) FROM subscribers) AS subscribers,
            (SELECT COUNT(*) FROM users) AS users
        "#,
    )
    .fetch_one(pool)
    .await
    .context("Failed to count the dashboard records.")
}
