use actix_web::{HttpResponse, ResponseError, web};
use actix_web::http::StatusCode;
use anyhow::Context;
use sqlx::{PgPool, Postgres, Transaction};
use tera::Tera;
use uuid::Uuid;

use crate::domain::{ActivationToken, SubscriberEmail};
use crate::email_client::EmailClient;
use crate::routes::helpers::{error_chain_fmt, see_other};
use crate::startup::ApplicationBaseUrl;

const VERIFY_YOUR_SUBSCRIPTION: &str = "Please check your email to verify your subscription";

#[derive(serde::Deserialize)]
pub struct SubscribeRequest {
    email: String,
}

#[derive(thiserror::Error)]
pub enum SubscribeError {
    #[error("{0}")]
    ValidationError(String),
    #[error("This email is already subscribed to our newsletter")]
    AlreadySubscribed,
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for SubscribeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for SubscribeError {
    fn status_code(&self) -> StatusCode {
        match self {
            SubscribeError::ValidationError(_) | SubscribeError::AlreadySubscribed => {
                StatusCode::BAD_REQUEST
            }
            SubscribeError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            SubscribeError::UnexpectedError(_) => "Failed to process the subscription".to_string(),
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(serde_json::json!({ "message": message }))
    }
}

#[tracing::instrument(
    name = "Adding a new subscriber",
    skip(body, pool, email_client, tera, base_url),
    fields(subscriber_email = %body.email)
)]
pub async fn subscribe(
    body: web::Json<SubscribeRequest>,
    pool: web::Data<PgPool>,
    email_client: web::Data<EmailClient>,
    tera: web::Data<Tera>,
    base_url: web::Data<ApplicationBaseUrl>,
) -> Result<HttpResponse, SubscribeError> {
    let email = SubscriberEmail::parse(body.into_inner().email)
        .map_err(|_| SubscribeError::ValidationError("Invalid email address".into()))?;

    let mut transaction = pool
        .begin()
        .await
        .context("Failed to acquire a Postgres connection from the pool.")?;
    let token = ActivationToken::new();

    match find_subscriber_by_email(&mut transaction, &email)
        .await
        .context("Failed to look up the subscriber.")?
    {
        Some((_, true)) => return Err(SubscribeError::AlreadySubscribed),
        Some((subscriber_id, false)) => {
            refresh_activation_token(&mut transaction, subscriber_id, &token)
                .await
                .context("Failed to store a new activation token.")?;
        }
        None => {
            insert_pending_subscriber(&mut transaction, &email, &token)
                .await
                .context("Failed to insert a new subscriber in the database.")?;
        }
    }

    send_verification_email(&email_client, &tera, &base_url.0, &email, &token)
        .await
        .context("Failed to send a verification email.")?;
    transaction
        .commit()
        .await
        .context("Failed to commit SQL transaction to store a new subscriber.")?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": VERIFY_YOUR_SUBSCRIPTION })))
}

#[tracing::instrument(name = "Find subscriber by email", skip(transaction))]
async fn find_subscriber_by_email(
    transaction: &mut Transaction<'_, Postgres>,
    email: &SubscriberEmail,
) -> Result<Option<(Uuid, bool)>, sqlx::Error> {
    sqlx::query_as("SELECT id, active FROM subscribers WHERE email = $1 FOR UPDATE")
        .bind(email.as_ref())
        .fetch_optional(&mut **transaction)
        .await
}

#[tracing::instrument(name = "Saving pending subscriber", skip(transaction, token))]
async fn insert_pending_subscriber(
    transaction: &mut Transaction<'_, Postgres>,
    email: &SubscriberEmail,
    token: &ActivationToken,
) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO subscribers (id, email, active, activation_token, token_expiry)
        VALUES ($1, $2, false, $3, now() + interval '24 hours')
        "#,
    )
    .bind(id)
    .bind(email.as_ref())
    .bind(token.as_ref())
    .execute(&mut **transaction)
    .await?;
    Ok(id)
}

#[tracing::instrument(name = "Refreshing activation token", skip(transaction, token))]
async fn refresh_activation_token(
    transaction: &mut Transaction<'_, Postgres>,
    subscriber_id: Uuid,
    token: &ActivationToken,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE subscribers
        SET activation_token = $1, token_expiry = now() + interval '24 hours', updated_at = now()
        WHERE id = $2
        "#,
    )
    .bind(token.as_ref())
    .bind(subscriber_id)
    .execute(&mut **transaction)
    .await?;
    Ok(())
}

#[tracing::instrument(
    name = "Sending a verification email to a new subscriber",
    skip(email_client, tera, base_url, token)
)]
async fn send_verification_email(
    email_client: &EmailClient,
    tera: &Tera,
    base_url: &str,
    email: &SubscriberEmail,
    token: &ActivationToken,
) -> Result<(), anyhow::Error> {
    let link = format!("{base_url}/api/newsletter/verify?token={token}");
    let mut ctx = tera::Context::new();
    ctx.insert("link", &link);
    let html = tera
        .render("emails/verify_subscription.html", &ctx)
        .context("Failed to render the verification email.")?;
    let text = format!(
        "Thank you for subscribing to our newsletter!\n\
         Verify your email address by opening the link below:\n{link}\n\
         This link will expire in 24 hours."
    );

    email_client
        .send_email(
            email,
            "Verify Your Newsletter Subscription",
            &html,
            Some(&text),
            &[],
        )
        .await
}

#[derive(serde::Deserialize)]
pub struct VerifyParameters {
    token: Option<String>,
}

#[derive(thiserror::Error)]
pub enum VerifyError {
    #[error("{0}")]
    InvalidToken(&'static str),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for VerifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for VerifyError {
    fn status_code(&self) -> StatusCode {
        match self {
            VerifyError::InvalidToken(_) => StatusCode::BAD_REQUEST,
            VerifyError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            VerifyError::InvalidToken(message) => message,
            VerifyError::UnexpectedError(_) => "Failed to verify email subscription",
        };
        HttpResponse::build(self.status_code()).json(serde_json::json!({ "message": message }))
    }
}

#[tracing::instrument(name = "Verify a pending subscriber", skip(parameters, pool))]
pub async fn verify(
    parameters: web::Query<VerifyParameters>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, VerifyError> {
    let token = parameters
        .into_inner()
        .token
        .filter(|t| !t.is_empty())
        .ok_or(VerifyError::InvalidToken("Verification token is required"))?;
    let token = ActivationToken::parse(token)
        .map_err(|_| VerifyError::InvalidToken("Invalid or expired verification link"))?;

    let activated = sqlx::query(
        r#"
        UPDATE subscribers
        SET active = true, activation_token = NULL, token_expiry = NULL, updated_at = now()
        WHERE activation_token = $1 AND token_expiry > now()
        "#,
    )
    .bind(token.as_ref())
    .execute(pool.get_ref())
    .await
    .context("Failed to activate the subscriber.")?
    .rows_affected();

    if activated == 0 {
        return Err(VerifyError::InvalidToken(
            "Invalid or expired verification link",
        ));
    }
    Ok(see_other("/newsletter/verified"))
}
