use std::time::Duration;

use anyhow::Context;
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::domain::SubscriberEmail;

#[derive(Clone)]
pub struct EmailClient {
    http_client: Client,
    base_url: Url,
    sender: SubscriberEmail,
    sender_name: String,
    authorization_token: SecretString,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct EmailTag {
    pub name: String,
    pub value: String,
}

impl EmailTag {
    pub fn new(name: &str, value: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: String,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "<[EmailTag]>::is_empty")]
    tags: &'a [EmailTag],
}

impl EmailClient {
    pub fn new(
        base_url: &str,
        sender: SubscriberEmail,
        sender_name: String,
        authorization_token: SecretString,
        timeout: Duration,
    ) -> Result<Self, anyhow::Error> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build the email HTTP client.")?;
        let base_url = Url::parse(base_url)
            .with_context(|| format!("{base_url} is not a valid email API url."))?;

        Ok(Self {
            http_client,
            base_url,
            sender,
            sender_name,
            authorization_token,
        })
    }

    fn from_header(&self) -> String {
        format!("{} <{}>", self.sender_name, self.sender.as_ref())
    }

    pub async fn send_email(
        &self,
        recipient: &SubscriberEmail,
        subject: &str,
        html_content: &str,
        text_content: Option<&str>,
        tags: &[EmailTag],
    ) -> Result<(), anyhow::Error> {
        let url = self
            .base_url
            .join("emails")
            .context("Failed to build the email API endpoint.")?;

        let body = SendEmailRequest {
            from: self.from_header(),
            to: vec![recipient.as_ref()],
            subject,
            html: html_content,
            text: text_content,
            tags,
        };

        self.http_client
            .post(url)
            .bearer_auth(self.authorization_token.expose_secret())
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}
