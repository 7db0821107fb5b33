use std::time::Duration;

use anyhow::Context;
use reqwest::{Client, Url, header::CONTENT_TYPE};
use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

/// Top-level prefixes images may be stored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFolder {
    Projects,
    Blogs,
    Categories,
    Services,
    Uploads,
}

impl UploadFolder {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadFolder::Projects => "projects",
            UploadFolder::Blogs => "blogs",
            UploadFolder::Categories => "categories",
            UploadFolder::Services => "services",
            UploadFolder::Uploads => "uploads",
        }
    }
}

impl TryFrom<String> for UploadFolder {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "projects" => Ok(UploadFolder::Projects),
            "blogs" => Ok(UploadFolder::Blogs),
            "categories" => Ok(UploadFolder::Categories),
            "services" => Ok(UploadFolder::Services),
            "" | "uploads" => Ok(UploadFolder::Uploads),
            other => Err(format!("{other} is not a known upload folder.")),
        }
    }
}

/// Client for an S3-compatible bucket exposed over plain HTTP with bearer
/// authentication. Objects are written publicly readable and addressed by
/// `{public_base_url}/{key}`.
#[derive(Clone)]
pub struct StorageClient {
    http_client: Client,
    base_url: Url,
    bucket: String,
    public_base_url: String,
    access_token: SecretString,
}

impl StorageClient {
    pub fn new(
        base_url: &str,
        bucket: String,
        public_base_url: String,
        access_token: SecretString,
        timeout: Duration,
    ) -> Result<Self, anyhow::Error> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build the storage HTTP client.")?;
        let base_url = Url::parse(base_url)
            .with_context(|| format!("{base_url} is not a valid storage url."))?;

        Ok(Self {
            http_client,
            base_url,
            bucket,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            access_token,
        })
    }

    fn object_url(&self, key: &str) -> Result<Url, anyhow::Error> {
        self.base_url
            .join(&format!("{}/{}", self.bucket, key))
            .context("Failed to build the object url.")
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }

    /// Inverse of [`StorageClient::public_url`]. `None` for foreign urls.
    pub fn key_from_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(&self.public_base_url)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|key| !key.is_empty())
            .map(str::to_string)
    }

    #[tracing::instrument(name = "Uploading an image", skip(self, body), fields(object_key = tracing::field::Empty))]
    pub async fn upload(
        &self,
        folder: UploadFolder,
        file_name: &str,
        content_type: &str,
        body: impl Into<reqwest::Body>,
    ) -> Result<String, anyhow::Error> {
        let key = format!(
            "{}/{}-{}",
            folder.as_str(),
            Uuid::new_v4(),
            sanitize_file_name(file_name)
        );
        tracing::Span::current().record("object_key", tracing::field::display(&key));

        self.http_client
            .put(self.object_url(&key)?)
            .bearer_auth(self.access_token.expose_secret())
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await?
            .error_for_status()
            .context("The storage service rejected the upload.")?;

        Ok(self.public_url(&key))
    }

    #[tracing::instrument(name = "Deleting an image", skip(self))]
    pub async fn delete_by_url(&self, url: &str) -> Result<(), anyhow::Error> {
        let Some(key) = self.key_from_url(url) else {
            tracing::warn!("Not a url of the configured bucket, nothing to delete.");
            return Ok(());
        };

        self.http_client
            .delete(self.object_url(&key)?)
            .bearer_auth(self.access_token.expose_secret())
            .send()
            .await?
            .error_for_status()
            .context("The storage service rejected the deletion.")?;

        Ok(())
    }

    /// Removing content must not fail because an image could not be removed.
    pub async fn delete_quietly(&self, url: Option<&str>) {
        let Some(url) = url.filter(|u| !u.is_empty()) else {
            return;
        };
        if let Err(e) = self.delete_by_url(url).await {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "Failed to delete an image from storage, skipping."
            );
        }
    }
}

fn sanitize_file_name(file_name: &str) -> String {
    let name: String = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect();
    if name.trim_matches(['.', '-']).is_empty() {
        "file".to_string()
    } else {
        name
    }
}
