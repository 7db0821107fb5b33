use actix_web::error::InternalError;
use actix_web::{HttpResponse, web};
use actix_web_flash_messages::FlashMessage;
use secrecy::SecretString;
use sqlx::PgPool;

use crate::authentication::{AuthError, Credentials, get_role, validate_credentials};
use crate::domain::Role;
use crate::routes::helpers::{error_chain_fmt, see_other};
use crate::session_state::TypedSession;

#[derive(serde::Deserialize)]
pub struct FormData {
    email: String,
    password: SecretString,
}

#[tracing::instrument(
    skip(form, pool, session),
    fields(email = tracing::field::Empty, user_id = tracing::field::Empty)
)]
pub async fn login(
    form: web::Form<FormData>,
    pool: web::Data<PgPool>,
    session: TypedSession,
) -> Result<HttpResponse, InternalError<LoginError>> {
    let credentials = Credentials {
        email: form.0.email,
        password: form.0.password,
    };
    tracing::Span::current().record("email", tracing::field::display(&credentials.email));

    let user_id = validate_credentials(credentials, &pool)
        .await
        .map_err(|e| login_redirect(e.into()))?;
    tracing::Span::current().record("user_id", tracing::field::display(&user_id));

    session.renew();
    session
        .insert_user_id(user_id)
        .map_err(|e| login_redirect(LoginError::UnexpectedError(e.into())))?;

    let role = get_role(user_id, &pool)
        .await
        .map_err(|e| login_redirect(LoginError::UnexpectedError(e)))?;
    match role {
        Some(Role::Admin) => Ok(see_other("/admin/dashboard")),
        _ => Ok(see_other("/")),
    }
}

fn login_redirect(e: LoginError) -> InternalError<LoginError> {
    FlashMessage::error(e.to_string()).send();
    InternalError::from_response(e, see_other("/login"))
}

#[derive(thiserror::Error)]
pub enum LoginError {
    #[error("Authentication failed")]
    AuthError(#[source] anyhow::Error),
    #[error("Something went wrong")]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for LoginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl From<AuthError> for LoginError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials(_) => LoginError::AuthError(e.into()),
            AuthError::UnexpectedError(_) => LoginError::UnexpectedError(e.into()),
        }
    }
}
