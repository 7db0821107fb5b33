use actix_web::{HttpResponse, web};
use sqlx::PgPool;
use tera::Tera;

use super::PAGE_SIZE;
use crate::content::{
    BlogFilter, find_published_blog_by_slug, list_blogs, list_categories_with_counts,
    similar_blogs,
};
use crate::domain::Pagination;
use crate::routes::helpers::{e500, render, render_not_found};

#[derive(Debug, serde::Deserialize)]
pub struct BlogQuery {
    page: Option<i64>,
    category: Option<String>,
    search: Option<String>,
}

#[tracing::instrument(name = "Blog index page", skip(pool, tera))]
pub async fn blog_index(
    query: web::Query<BlogQuery>,
    pool: web::Data<PgPool>,
    tera: web::Data<Tera>,
) -> Result<HttpResponse, actix_web::Error> {
    let BlogQuery {
        page,
        category,
        search,
    } = query.into_inner();
    let pagination = Pagination::with_default_limit(page, None, PAGE_SIZE);
    let filter = BlogFilter {
        category: category.clone(),
        search: search.clone(),
        ..BlogFilter::published()
    };
    let (blogs, total) = list_blogs(&pool, &filter, pagination)
        .await
        .map_err(e500)?;
    let categories = list_categories_with_counts(&pool).await.map_err(e500)?;

    let mut ctx = tera::Context::new();
    ctx.insert("blogs", &blogs);
    ctx.insert("categories", &categories);
    ctx.insert("page", &pagination.page());
    ctx.insert("page_count", &pagination.page_count(total));
    ctx.insert("category", &category.unwrap_or_default());
    ctx.insert("search", &search.unwrap_or_default());
    render(&tera, "blog/index.html", &ctx)
}

#[tracing::instrument(name = "Blog post page", skip(pool, tera))]
pub async fn blog_post(
    slug: web::Path<String>,
    pool: web::Data<PgPool>,
    tera: web::Data<Tera>,
) -> Result<HttpResponse, actix_web::Error> {
    let Some(blog) = find_published_blog_by_slug(&pool, &slug)
        .await
        .map_err(e500)?
    else {
        return render_not_found(&tera);
    };
    let similar = similar_blogs(&pool, &blog, 3).await.map_err(e500)?;

    let mut ctx = tera::Context::new();
    ctx.insert("blog", &blog);
    ctx.insert("similar", &similar);
    render(&tera, "blog/post.html", &ctx)
}
