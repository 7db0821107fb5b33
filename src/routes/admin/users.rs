use actix_web::{HttpResponse, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tera::Tera;
use uuid::Uuid;

use crate::domain::{ActivationToken, Role, SubscriberEmail};
use crate::email_client::EmailClient;
use crate::routes::helpers::{e500, flash_context, render, see_other};
use crate::routes::password_reset::{PasswordLink, send_password_link};
use crate::routes::register::user_exists;
use crate::startup::ApplicationBaseUrl;

#[derive(Debug, serde::Serialize, sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    email: String,
    name: Option<String>,
    role: String,
    has_password: bool,
    created_at: DateTime<Utc>,
}

pub async fn list_users(
    pool: web::Data<PgPool>,
    tera: web::Data<Tera>,
    flash_messages: IncomingFlashMessages,
) -> Result<HttpResponse, actix_web::Error> {
    let users = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT user_id, email, name, role, password_hash IS NOT NULL AS has_password, created_at
        FROM users
        ORDER BY created_at
        "#,
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(e500)?;

    let mut ctx = flash_context(&flash_messages);
    ctx.insert("users", &users);
    render(&tera, "admin/users.html", &ctx)
}

#[derive(serde::Deserialize)]
pub struct FormData {
    name: String,
    email: String,
    role: String,
}

fn create_user_error(message: &str) -> HttpResponse {
    FlashMessage::error(message).send();
    see_other("/admin/users")
}

/// Create an account without a password and email its owner a setup link.
#[tracing::instrument(
    name = "Creating a user",
    skip(form, pool, email_client, tera, base_url),
    fields(email = %form.email, role = %form.role)
)]
pub async fn create_user(
    form: web::Form<FormData>,
    pool: web::Data<PgPool>,
    email_client: web::Data<EmailClient>,
    tera: web::Data<Tera>,
    base_url: web::Data<ApplicationBaseUrl>,
) -> Result<HttpResponse, actix_web::Error> {
    let FormData { name, email, role } = form.0;
    let name = name.trim();
    if name.is_empty() {
        return Ok(create_user_error("The name is required."));
    }
    let Ok(email) = SubscriberEmail::parse(email) else {
        return Ok(create_user_error("Please enter a valid email address."));
    };
    let Ok(role) = Role::try_from(role) else {
        return Ok(create_user_error("Unknown role."));
    };
    if user_exists(&pool, &email).await.map_err(e500)? {
        return Ok(create_user_error("A user with this email already exists."));
    }

    let mut transaction = pool
        .begin()
        .await
        .context("Failed to acquire a Postgres connection from the pool.")
        .map_err(e500)?;
    let token = ActivationToken::new();
    insert_user_with_setup_token(&mut transaction, &email, name, role, &token)
        .await
        .map_err(e500)?;
    send_password_link(
        &email_client,
        &tera,
        &base_url.0,
        &email,
        &token,
        PasswordLink::AccountSetup,
    )
    .await
    .map_err(e500)?;
    transaction
        .commit()
        .await
        .context("Failed to commit SQL transaction to store a new user.")
        .map_err(e500)?;

    FlashMessage::info(format!("{email} has been invited.")).send();
    Ok(see_other("/admin/users"))
}

#[tracing::instrument(name = "Saving invited user", skip(transaction, token))]
async fn insert_user_with_setup_token(
    transaction: &mut Transaction<'_, Postgres>,
    email: &SubscriberEmail,
    name: &str,
    role: Role,
    token: &ActivationToken,
) -> Result<Uuid, anyhow::Error> {
    let user_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO users (user_id, email, name, role, reset_token, reset_token_expiry)
        VALUES ($1, $2, $3, $4, $5, now() + interval '24 hours')
        "#,
    )
    .bind(user_id)
    .bind(email.as_ref())
    .bind(name)
    .bind(role.as_str())
    .bind(token.as_ref())
    .execute(&mut **transaction)
    .await
    .context("Failed to insert the invited user.")?;
    Ok(user_id)
}
