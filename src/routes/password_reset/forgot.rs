use actix_web::{HttpResponse, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use anyhow::Context;
use sqlx::PgPool;
use tera::Tera;
use uuid::Uuid;

use super::{PasswordLink, send_password_link};
use crate::domain::{ActivationToken, SubscriberEmail};
use crate::email_client::EmailClient;
use crate::routes::helpers::{e500, flash_context, render, see_other};
use crate::startup::ApplicationBaseUrl;

const RESET_LINK_SENT: &str =
    "If an account exists for that email, you will receive a link to reset your password.";

pub async fn forgot_password_form(
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> Result<HttpResponse, actix_web::Error> {
    render(&tera, "forgot_password.html", &flash_context(&flash_messages))
}

#[derive(serde::Deserialize)]
pub struct FormData {
    email: String,
}

#[tracing::instrument(
    name = "Requesting a password reset",
    skip(form, pool, email_client, tera, base_url)
)]
pub async fn forgot_password(
    form: web::Form<FormData>,
    pool: web::Data<PgPool>,
    email_client: web::Data<EmailClient>,
    tera: web::Data<Tera>,
    base_url: web::Data<ApplicationBaseUrl>,
) -> Result<HttpResponse, actix_web::Error> {
    // Flashed whether or not the account exists.
    FlashMessage::info(RESET_LINK_SENT).send();

    let Ok(email) = SubscriberEmail::parse(form.0.email) else {
        return Ok(see_other("/auth/forgot-password"));
    };
    let Some(user_id) = find_user_by_email(&pool, &email).await.map_err(e500)? else {
        return Ok(see_other("/auth/forgot-password"));
    };

    let token = ActivationToken::new();
    store_reset_token(&pool, user_id, &token)
        .await
        .map_err(e500)?;
    if let Err(e) = send_password_link(
        &email_client,
        &tera,
        &base_url.0,
        &email,
        &token,
        PasswordLink::Reset,
    )
    .await
    {
        tracing::error!(
            error.cause_chain = ?e,
            error.message = %e,
            "Failed to send a password reset email"
        );
    }

    Ok(see_other("/auth/forgot-password"))
}

#[tracing::instrument(name = "Find user by email", skip(pool))]
async fn find_user_by_email(
    pool: &PgPool,
    email: &SubscriberEmail,
) -> Result<Option<Uuid>, anyhow::Error> {
    sqlx::query_scalar("SELECT user_id FROM users WHERE email = $1")
        .bind(email.as_ref())
        .fetch_optional(pool)
        .await
        .context("Failed to look up the user by email.")
}

#[tracing::instrument(name = "Store password reset token", skip(pool, token))]
async fn store_reset_token(
    pool: &PgPool,
    user_id: Uuid,
    token: &ActivationToken,
) -> Result<(), anyhow::Error> {
    sqlx::query(
        r#"
        UPDATE users
        SET reset_token = $1, reset_token_expiry = now() + interval '30 minutes', updated_at = now()
        WHERE user_id = $2
        "#,
    )
    .bind(token.as_ref())
    .bind(user_id)
    .execute(pool)
    .await
    .context("Failed to store the password reset token.")?;
    Ok(())
}
