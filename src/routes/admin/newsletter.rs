use actix_web::{HttpResponse, web};
use sqlx::PgPool;
use tera::Tera;

use crate::domain::{CampaignStatus, Pagination, SubscriberStatus};
use crate::newsletter::{SubscriberFilter, list_campaigns, list_subscribers};
use crate::routes::helpers::{e500, render};

const PAGE_SIZE: i64 = 20;

#[derive(Debug, serde::Deserialize)]
pub struct SubscribersQuery {
    page: Option<i64>,
    search: Option<String>,
    status: Option<String>,
    tag: Option<String>,
}

pub async fn subscribers_page(
    query: web::Query<SubscribersQuery>,
    pool: web::Data<PgPool>,
    tera: web::Data<Tera>,
) -> Result<HttpResponse, actix_web::Error> {
    let SubscribersQuery {
        page,
        search,
        status,
        tag,
    } = query.into_inner();
    let pagination = Pagination::with_default_limit(page, None, PAGE_SIZE);
    // Unknown statuses are shown unfiltered.
    let status_filter = status.and_then(|s| SubscriberStatus::try_from(s).ok());
    let filter = SubscriberFilter {
        search: search.clone(),
        status: status_filter,
        tag: tag.clone(),
    };
    let (subscribers, total) = list_subscribers(&pool, &filter, pagination)
        .await
        .map_err(e500)?;

    let mut ctx = tera::Context::new();
    ctx.insert("subscribers", &subscribers);
    ctx.insert("total", &total);
    ctx.insert("page", &pagination.page());
    ctx.insert("page_count", &pagination.page_count(total));
    ctx.insert("search", &search.unwrap_or_default());
    ctx.insert("status", &status_filter.map(|s| s.as_str()).unwrap_or_default());
    ctx.insert("tag", &tag.unwrap_or_default());
    render(&tera, "admin/subscribers.html", &ctx)
}

#[derive(Debug, serde::Deserialize)]
pub struct CampaignsQuery {
    page: Option<i64>,
    status: Option<String>,
}

pub async fn campaigns_page(
    query: web::Query<CampaignsQuery>,
    pool: web::Data<PgPool>,
    tera: web::Data<Tera>,
) -> Result<HttpResponse, actix_web::Error> {
    let CampaignsQuery { page, status } = query.into_inner();
    let pagination = Pagination::with_default_limit(page, None, PAGE_SIZE);
    let status = status.and_then(|s| CampaignStatus::try_from(s).ok());
    let (campaigns, total) = list_campaigns(&pool, status, pagination)
        .await
        .map_err(e500)?;

    let mut ctx = tera::Context::new();
    ctx.insert("campaigns", &campaigns);
    ctx.insert("total", &total);
    ctx.insert("page", &pagination.page());
    ctx.insert("page_count", &pagination.page_count(total));
    ctx.insert("status", &status.map(|s| s.as_str()).unwrap_or_default());
    render(&tera, "admin/campaigns.html", &ctx)
}
