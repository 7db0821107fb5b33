use actix_web::{HttpResponse, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use anyhow::Context;
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use uuid::Uuid;

use crate::authentication::{check_password_policy, hash_password};
use crate::domain::SubscriberEmail;
use crate::routes::helpers::{e500, flash_context, render, see_other};

pub async fn register_form(
    flash_messages: IncomingFlashMessages,
    tera: web::Data<tera::Tera>,
) -> Result<HttpResponse, actix_web::Error> {
    render(&tera, "register.html", &flash_context(&flash_messages))
}

#[derive(serde::Deserialize)]
pub struct FormData {
    name: String,
    email: String,
    password: SecretString,
    password_check: SecretString,
}

fn register_error(message: &str) -> HttpResponse {
    FlashMessage::error(message).send();
    see_other("/register")
}

#[tracing::instrument(
    name = "Registering a new user",
    skip(form, pool),
    fields(email = %form.email)
)]
pub async fn register(
    form: web::Form<FormData>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, actix_web::Error> {
    let FormData {
        name,
        email,
        password,
        password_check,
    } = form.0;

    let name = name.trim();
    if !(2..=100).contains(&name.chars().count()) {
        return Ok(register_error(
            "The name must be between 2 and 100 characters long.",
        ));
    }
    let Ok(email) = SubscriberEmail::parse(email) else {
        return Ok(register_error("Please enter a valid email address."));
    };
    if password.expose_secret() != password_check.expose_secret() {
        return Ok(register_error(
            "You entered two different passwords - the field values must match.",
        ));
    }
    if let Err(message) = check_password_policy(&password) {
        return Ok(register_error(&message));
    }

    if user_exists(&pool, &email).await.map_err(e500)? {
        return Ok(register_error("An account with this email already exists."));
    }

    let password_hash = hash_password(password).await.map_err(e500)?;
    insert_user(&pool, &email, name, &password_hash)
        .await
        .map_err(e500)?;

    FlashMessage::info("Your account has been created. You can now log in.").send();
    Ok(see_other("/login"))
}

#[tracing::instrument(name = "Check whether a user exists", skip(pool))]
pub async fn user_exists(pool: &PgPool, email: &SubscriberEmail) -> Result<bool, anyhow::Error> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
        .bind(email.as_ref())
        .fetch_one(pool)
        .await
        .context("Failed to look up the user by email.")?;
    Ok(exists)
}

#[tracing::instrument(name = "Saving new user in the database", skip(pool, password_hash))]
async fn insert_user(
    pool: &PgPool,
    email: &SubscriberEmail,
    name: &str,
    password_hash: &SecretString,
) -> Result<Uuid, anyhow::Error> {
    let user_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO users (user_id, email, name, password_hash, role)
        VALUES ($1, $2, $3, $4, 'USER')
        "#,
    )
    .bind(user_id)
    .bind(email.as_ref())
    .bind(name)
    .bind(password_hash.expose_secret())
    .execute(pool)
    .await
    .context("Failed to insert the new user.")?;
    Ok(user_id)
}
