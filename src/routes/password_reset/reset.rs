use actix_web::{HttpResponse, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use anyhow::Context;
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use tera::Tera;
use uuid::Uuid;

use crate::authentication::{check_password_policy, hash_password};
use crate::domain::ActivationToken;
use crate::routes::helpers::{e500, flash_context, render, see_other};

const INVALID_LINK: &str = "This password link is invalid or has expired.";

#[derive(serde::Deserialize)]
pub struct QueryParams {
    token: Option<String>,
}

pub async fn reset_password_form(
    query: web::Query<QueryParams>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> Result<HttpResponse, actix_web::Error> {
    let Some(Ok(token)) = query.0.token.map(ActivationToken::parse) else {
        FlashMessage::error(INVALID_LINK).send();
        return Ok(see_other("/auth/forgot-password"));
    };

    let mut ctx = flash_context(&flash_messages);
    ctx.insert("token", token.as_ref());
    render(&tera, "reset_password.html", &ctx)
}

#[derive(serde::Deserialize)]
pub struct FormData {
    token: String,
    password: SecretString,
    password_check: SecretString,
}

#[tracing::instrument(name = "Resetting a password", skip(form, pool))]
pub async fn reset_password(
    form: web::Form<FormData>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, actix_web::Error> {
    let FormData {
        token,
        password,
        password_check,
    } = form.0;
    let Ok(token) = ActivationToken::parse(token) else {
        FlashMessage::error(INVALID_LINK).send();
        return Ok(see_other("/auth/forgot-password"));
    };
    let retry_location = format!("/auth/reset-password?token={token}");

    if password.expose_secret() != password_check.expose_secret() {
        FlashMessage::error("You entered two different passwords - the field values must match.")
            .send();
        return Ok(see_other(&retry_location));
    }
    if let Err(message) = check_password_policy(&password) {
        FlashMessage::error(message).send();
        return Ok(see_other(&retry_location));
    }

    let Some(user_id) = find_user_by_reset_token(&pool, &token)
        .await
        .map_err(e500)?
    else {
        FlashMessage::error(INVALID_LINK).send();
        return Ok(see_other("/auth/forgot-password"));
    };

    let password_hash = hash_password(password).await.map_err(e500)?;
    store_new_password(&pool, user_id, &password_hash)
        .await
        .map_err(e500)?;

    FlashMessage::info("Your password has been set. You can now log in.").send();
    Ok(see_other("/login"))
}

#[tracing::instrument(name = "Find user by reset token", skip(pool, token))]
async fn find_user_by_reset_token(
    pool: &PgPool,
    token: &ActivationToken,
) -> Result<Option<Uuid>, anyhow::Error> {
    sqlx::query_scalar(
        r#"
        SELECT user_id FROM users
        WHERE reset_token = $1 AND reset_token_expiry > now()
        "#,
    )
    .bind(token.as_ref())
    .fetch_optional(pool)
    .await
    .context("Failed to look up the reset token.")
}

#[tracing::instrument(name = "Store new password", skip(pool, password_hash))]
async fn store_new_password(
    pool: &PgPool,
    user_id: Uuid,
    password_hash: &SecretString,
) -> Result<(), anyhow::Error> {
    sqlx::query(
        r#"
        UPDATE users
        SET password_hash = $1, reset_token = NULL, reset_token_expiry = NULL, updated_at = now()
        WHERE user_id = $2
        "#,
    )
    .bind(password_hash.expose_secret())
    .bind(user_id)
    .execute(pool)
    .await
    .context("Failed to store the new password.")?;
    Ok(())
}
