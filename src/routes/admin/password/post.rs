use actix_web::{HttpResponse, web};
use actix_web_flash_messages::FlashMessage;
use anyhow::Context;
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use uuid::Uuid;

use crate::authentication::{
    AuthError, Credentials, UserId, change_password as store_password, check_password_policy,
    validate_credentials,
};
use crate::routes::helpers::{e500, see_other};

#[derive(serde::Deserialize)]
pub struct FormData {
    current_password: SecretString,
    new_password: SecretString,
    new_password_check: SecretString,
}

#[tracing::instrument(name = "Change password form submission", skip(form, pool, user_id), fields(user_id = %&*user_id))]
pub async fn change_password(
    form: web::Form<FormData>,
    pool: web::Data<PgPool>,
    user_id: web::ReqData<UserId>,
) -> Result<HttpResponse, actix_web::Error> {
    let user_id = user_id.into_inner();

    if form.new_password.expose_secret() != form.new_password_check.expose_secret() {
        FlashMessage::error(
            "You entered two different new passwords - the field values must match.",
        )
        .send();
        return Ok(see_other("/admin/password"));
    }
    if let Err(message) = check_password_policy(&form.new_password) {
        FlashMessage::error(message).send();
        return Ok(see_other("/admin/password"));
    }

    let email = get_email(*user_id, &pool).await.map_err(e500)?;
    let credentials = Credentials {
        email,
        password: form.0.current_password,
    };
    if let Err(e) = validate_credentials(credentials, &pool).await {
        return match e {
            AuthError::InvalidCredentials(_) => {
                FlashMessage::error("The current password is incorrect.").send();
                Ok(see_other("/admin/password"))
            }
            AuthError::UnexpectedError(_) => Err(e500(e)),
        };
    }

    store_password(*user_id, form.0.new_password, &pool)
        .await
        .map_err(e500)?;
    FlashMessage::info("Your password has been changed.").send();
    Ok(see_other("/admin/password"))
}

#[tracing::instrument(name = "Get user email", skip(pool))]
pub async fn get_email(user_id: Uuid, pool: &PgPool) -> Result<String, anyhow::Error> {
    sqlx::query_scalar("SELECT email FROM users WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .context("Failed to perform a query to retrieve the user's email.")
}
