mod blogs;
mod campaigns;
mod categories;
mod projects;
mod services;
mod subscribers;
mod templates;
mod upload;
mod users;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use validator::ValidateUrl;

use crate::domain::{PublishStatus, Slug};
use crate::routes::helpers::ApiError;

pub use blogs::{admin_get_blog, admin_list_blogs, create_blog, delete_blog, update_blog};
pub use campaigns::{
    create_campaign, delete_campaign, get_campaign, get_campaigns, send_campaign,
    send_test_campaign, update_campaign,
};
pub use categories::{create_category, delete_category, update_category};
pub use projects::{create_project, delete_project, update_project};
pub use services::{create_service, delete_service, update_service};
pub use subscribers::{
    bulk_update_subscribers, create_subscriber, delete_subscriber, get_subscriber,
    get_subscribers, import_subscribers, update_subscriber,
};
pub use templates::{create_template, delete_template, get_template, get_templates, update_template};
pub use upload::upload_image;
pub use users::{delete_user, update_user};

/// Tells a missing patch field (`None`) apart from an explicit `null`
/// (`Some(None)`). Pair with `#[serde(default)]`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Trimmed, non-empty value of a mandatory text field.
fn required(field: &str, value: String) -> Result<String, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::ValidationError(format!("{field} is required.")));
    }
    Ok(value.to_string())
}

/// `None` for missing or blank values.
fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Like [`optional`], but the value must be an absolute URL.
fn optional_url(field: &str, value: Option<String>) -> Result<Option<String>, ApiError> {
    match optional(value) {
        Some(url) if !url.validate_url() => Err(ApiError::ValidationError(format!(
            "{field} must be a valid URL."
        ))),
        other => Ok(other),
    }
}

/// Publishing without an explicit date stamps the current time.
fn publication_date(
    status: PublishStatus,
    published_at: Option<DateTime<Utc>>,
) -> Option<DateTime<Utc>> {
    match (status, published_at) {
        (PublishStatus::Published, None) => Some(Utc::now()),
        (_, published_at) => published_at,
    }
}

fn slug_from(title: &str) -> Result<Slug, ApiError> {
    Slug::from_title(title).map_err(ApiError::ValidationError)
}
