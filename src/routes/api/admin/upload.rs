use actix_web::http::header::CONTENT_TYPE;
use actix_web::{HttpRequest, HttpResponse, web};
use anyhow::Context;

use crate::routes::helpers::ApiError;
use crate::storage_client::{StorageClient, UploadFolder};

#[derive(Debug, serde::Deserialize)]
pub struct UploadParameters {
    folder: Option<String>,
    file_name: String,
}

/// Store the raw request body as an image and answer with its public URL.
#[tracing::instrument(name = "Upload image", skip(request, body, storage), fields(size = body.len()))]
pub async fn upload_image(
    request: HttpRequest,
    parameters: web::Query<UploadParameters>,
    body: web::Bytes,
    storage: web::Data<StorageClient>,
) -> Result<HttpResponse, ApiError> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("No file provided".into()));
    }
    let UploadParameters { folder, file_name } = parameters.into_inner();
    let folder = UploadFolder::try_from(folder.unwrap_or_default()).map_err(ApiError::BadRequest)?;
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    if !content_type.starts_with("image/") {
        return Err(ApiError::BadRequest("Only image uploads are accepted".into()));
    }

    let url = storage
        .upload(folder, &file_name, &content_type, body)
        .await
        .context("Failed to upload the image.")?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "url": url })))
}
