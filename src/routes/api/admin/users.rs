use actix_web::{HttpResponse, web};
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use uuid::Uuid;

use super::required;
use crate::authentication::{UserId, check_password_policy, find_account, hash_password};
use crate::domain::{Role, SubscriberEmail};
use crate::routes::helpers::ApiError;

#[derive(serde::Deserialize)]
pub struct UserPatch {
    name: Option<String>,
    email: Option<String>,
    role: Option<Role>,
    password: Option<SecretString>,
}

/// Edit another account. A password, when given, replaces the current one.
#[tracing::instrument(name = "Update user", skip(body, pool))]
pub async fn update_user(
    id: web::Path<Uuid>,
    body: web::Json<UserPatch>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let existing = find_account(&pool, *id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    let patch = body.into_inner();

    let name = match patch.name {
        Some(name) => Some(required("name", name)?),
        None => existing.name,
    };
    let email = match patch.email {
        Some(email) => {
            let email = SubscriberEmail::parse(email).map_err(ApiError::ValidationError)?;
            if email_taken_by_another_user(&pool, &email, existing.user_id).await? {
                return Err(ApiError::BadRequest("Email already taken".into()));
            }
            email.to_string()
        }
        None => existing.email,
    };
    let role = patch.role.map_or(existing.role, |r| r.as_str().to_string());
    let password_hash = match patch.password {
        Some(password) => {
            check_password_policy(&password).map_err(ApiError::ValidationError)?;
            Some(hash_password(password).await?)
        }
        None => None,
    };

    sqlx::query(
        r#"
        UPDATE users
        SET name = $2, email = $3, role = $4,
            password_hash = COALESCE($5, password_hash), updated_at = now()
        WHERE user_id = $1
        "#,
    )
    .bind(existing.user_id)
    .bind(&name)
    .bind(&email)
    .bind(&role)
    .bind(password_hash.as_ref().map(|h| h.expose_secret().to_string()))
    .execute(pool.get_ref())
    .await?;

    let account = find_account(&pool, existing.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(HttpResponse::Ok().json(account))
}

#[tracing::instrument(name = "Delete user", skip(pool, current_user), fields(admin_id = %&*current_user))]
pub async fn delete_user(
    id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
    current_user: web::ReqData<UserId>,
) -> Result<HttpResponse, ApiError> {
    if *id == **current_user {
        return Err(ApiError::BadRequest("Cannot delete your own account".into()));
    }
    let deleted = sqlx::query("DELETE FROM users WHERE user_id = $1")
        .bind(*id)
        .execute(pool.get_ref())
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(ApiError::NotFound("User not found".into()));
    }
    Ok(HttpResponse::NoContent().finish())
}

async fn email_taken_by_another_user(
    pool: &PgPool,
    email: &SubscriberEmail,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1 AND user_id <> $2)")
        .bind(email.as_ref())
        .bind(user_id)
        .fetch_one(pool)
        .await
}
