use std::error::Error;
use std::fmt::Write;

use actix_web::http::StatusCode;
use actix_web::http::header::{ContentType, LOCATION};
use actix_web::{HttpResponse, ResponseError};
use actix_web_flash_messages::{IncomingFlashMessages, Level};
use tera::Tera;

pub fn error_chain_fmt(e: &impl Error, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    writeln!(f, "{e}\n")?;
    let mut current = e.source();

    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{cause}")?;
        current = cause.source();
    }

    Ok(())
}

pub fn e500<T>(e: T) -> actix_web::Error
where
    T: std::fmt::Debug + std::fmt::Display + 'static,
{
    actix_web::error::ErrorInternalServerError(e)
}

pub fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((LOCATION, location))
        .finish()
}

pub fn get_message(flash_messages: &IncomingFlashMessages, level: Option<Level>) -> String {
    let mut message = String::new();
    for m in flash_messages
        .iter()
        .filter(|m| level.is_none_or(|l| m.level() == l))
    {
        let _ = writeln!(message, "{}", m.content());
    }
    message
}

/// Template context pre-filled with the pending `error` and `info` flash messages.
pub fn flash_context(flash_messages: &IncomingFlashMessages) -> tera::Context {
    let mut ctx = tera::Context::new();
    ctx.insert("error", &get_message(flash_messages, Some(Level::Error)));
    ctx.insert("info", &get_message(flash_messages, Some(Level::Info)));
    ctx
}

pub fn render(
    tera: &Tera,
    template_name: &str,
    ctx: &tera::Context,
) -> Result<HttpResponse, actix_web::Error> {
    render_with_status(tera, template_name, ctx, StatusCode::OK)
}

pub fn render_not_found(tera: &Tera) -> Result<HttpResponse, actix_web::Error> {
    render_with_status(
        tera,
        "not_found.html",
        &tera::Context::new(),
        StatusCode::NOT_FOUND,
    )
}

fn render_with_status(
    tera: &Tera,
    template_name: &str,
    ctx: &tera::Context,
    status: StatusCode,
) -> Result<HttpResponse, actix_web::Error> {
    let page = tera.render(template_name, ctx).map_err(e500)?;
    Ok(HttpResponse::build(status)
        .content_type(ContentType::html())
        .body(page))
}

/// Error type of every JSON endpoint; always rendered as `{"message": ...}`.
#[derive(thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        let unique_violation = e
            .as_database_error()
            .is_some_and(|db_error| db_error.is_unique_violation());
        if unique_violation {
            ApiError::Conflict("A record with the same unique value already exists.".into())
        } else {
            ApiError::UnexpectedError(anyhow::Error::new(e).context("A database query failed."))
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            ApiError::UnexpectedError(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(serde_json::json!({ "message": message }))
    }
}
