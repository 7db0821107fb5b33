use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::error::InternalError;
use actix_web::middleware::Next;
use actix_web::{FromRequest, HttpMessage, HttpResponse, web};
use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::Role;
use crate::routes::{e500, see_other};
use crate::session_state::TypedSession;

#[derive(Copy, Clone, Debug)]
pub struct UserId(Uuid);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::ops::Deref for UserId {
    type Target = Uuid;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

enum Visitor {
    Anonymous,
    User(Uuid),
    Admin(Uuid),
}

#[tracing::instrument(name = "Get user role", skip(pool))]
pub async fn get_role(user_id: Uuid, pool: &PgPool) -> Result<Option<Role>, anyhow::Error> {
    let role: Option<String> = sqlx::query_scalar("SELECT role FROM users WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("Failed to perform a query to retrieve the user's role.")?;

    role.map(Role::try_from)
        .transpose()
        .map_err(anyhow::Error::msg)
}

async fn identify(req: &mut ServiceRequest) -> Result<Visitor, actix_web::Error> {
    let session = {
        let (http_request, payload) = req.parts_mut();
        TypedSession::from_request(http_request, payload).await
    }?;
    let Some(user_id) = session.get_user_id().map_err(e500)? else {
        return Ok(Visitor::Anonymous);
    };

    let pool = req
        .app_data::<web::Data<PgPool>>()
        .ok_or_else(|| e500("The database pool is not registered."))?;
    let visitor = match get_role(user_id, pool).await.map_err(e500)? {
        Some(Role::Admin) => Visitor::Admin(user_id),
        Some(Role::User) => Visitor::User(user_id),
        None => Visitor::Anonymous,
    };
    Ok(visitor)
}

/// Guard for the HTML back office: anything but an admin is sent to `/login`.
pub async fn reject_non_admin_users(
    mut req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    match identify(&mut req).await? {
        Visitor::Admin(user_id) => {
            req.extensions_mut().insert(UserId(user_id));
            next.call(req).await
        }
        Visitor::User(_) | Visitor::Anonymous => {
            let response = see_other("/login");
            let err = anyhow::anyhow!("The visitor is not a logged in admin.");
            Err(InternalError::from_response(err, response).into())
        }
    }
}

/// Guard for the admin JSON API: 401 without a session, 403 for non-admins.
pub async fn require_admin(
    mut req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    match identify(&mut req).await? {
        Visitor::Admin(user_id) => {
            req.extensions_mut().insert(UserId(user_id));
            next.call(req).await
        }
        Visitor::User(_) => {
            let response =
                HttpResponse::Forbidden().json(serde_json::json!({ "message": "Forbidden" }));
            let err = anyhow::anyhow!("The user is not an admin.");
            Err(InternalError::from_response(err, response).into())
        }
        Visitor::Anonymous => Err(unauthorized()),
    }
}

/// Guard for JSON endpoints open to any signed-in user.
pub async fn require_login(
    mut req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    match identify(&mut req).await? {
        Visitor::Admin(user_id) | Visitor::User(user_id) => {
            req.extensions_mut().insert(UserId(user_id));
            next.call(req).await
        }
        Visitor::Anonymous => Err(unauthorized()),
    }
}

fn unauthorized() -> actix_web::Error {
    let response =
        HttpResponse::Unauthorized().json(serde_json::json!({ "message": "Unauthorized" }));
    let err = anyhow::anyhow!("The user has not logged in.");
    InternalError::from_response(err, response).into()
}
