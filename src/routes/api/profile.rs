use actix_web::{HttpResponse, web};
use sqlx::PgPool;

use crate::authentication::{UserId, find_account};
use crate::routes::helpers::ApiError;

#[derive(serde::Deserialize)]
pub struct ProfileUpdate {
    name: String,
}

#[tracing::instrument(name = "Update own profile", skip(body, pool), fields(user_id = %&*user_id))]
pub async fn update_profile(
    body: web::Json<ProfileUpdate>,
    pool: web::Data<PgPool>,
    user_id: web::ReqData<UserId>,
) -> Result<HttpResponse, ApiError> {
    let name = body.into_inner().name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::ValidationError("name is required.".into()));
    }

    sqlx::query("UPDATE users SET name = $2, updated_at = now() WHERE user_id = $1")
        .bind(**user_id)
        .bind(&name)
        .execute(pool.get_ref())
        .await?;

    let account = find_account(&pool, **user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(HttpResponse::Ok().json(account))
}
