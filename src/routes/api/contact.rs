use actix_web::{HttpResponse, web};
use anyhow::Context;
use tera::Tera;

use crate::domain::SubscriberEmail;
use crate::email_client::EmailClient;
use crate::routes::helpers::ApiError;
use crate::startup::ContactInbox;

#[derive(Debug, serde::Deserialize)]
pub struct ContactRequest {
    name: String,
    email: String,
    company: Option<String>,
    phone: Option<String>,
    subject: String,
    message: String,
    #[serde(default)]
    services: Vec<String>,
}

#[derive(Debug, serde::Serialize)]
struct ContactMessage {
    name: String,
    email: String,
    company: Option<String>,
    phone: Option<String>,
    subject: String,
    message: String,
    services: Vec<String>,
}

fn min_chars(field: &str, value: &str, min: usize) -> Result<(), ApiError> {
    if value.chars().count() < min {
        return Err(ApiError::ValidationError(format!(
            "{field} must be at least {min} characters long."
        )));
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl TryFrom<ContactRequest> for (SubscriberEmail, ContactMessage) {
    type Error = ApiError;

    fn try_from(request: ContactRequest) -> Result<Self, Self::Error> {
        let name = request.name.trim().to_string();
        min_chars("name", &name, 2)?;
        let email = SubscriberEmail::parse(request.email).map_err(ApiError::ValidationError)?;
        let phone = non_blank(request.phone);
        if let Some(phone) = &phone {
            min_chars("phone", phone, 10)?;
        }
        let subject = request.subject.trim().to_string();
        min_chars("subject", &subject, 5)?;
        let message = request.message.trim().to_string();
        min_chars("message", &message, 10)?;

        let contact = ContactMessage {
            name,
            email: email.to_string(),
            company: non_blank(request.company),
            phone,
            subject,
            message,
            services: request.services,
        };
        Ok((email, contact))
    }
}

#[tracing::instrument(
    name = "Handling a contact request",
    skip(body, email_client, tera, inbox),
    fields(sender = %body.email)
)]
pub async fn contact(
    body: web::Json<ContactRequest>,
    email_client: web::Data<EmailClient>,
    tera: web::Data<Tera>,
    inbox: web::Data<ContactInbox>,
) -> Result<HttpResponse, ApiError> {
    let (sender, message) = body.into_inner().try_into()?;

    let mut ctx = tera::Context::new();
    ctx.insert("contact", &message);
    let notification = tera
        .render("emails/contact_notification.html", &ctx)
        .context("Failed to render the contact notification.")?;
    let auto_reply = tera
        .render("emails/contact_reply.html", &ctx)
        .context("Failed to render the contact auto-reply.")?;

    email_client
        .send_email(
            &inbox.0,
            &format!("New Contact Form Submission: {}", message.subject),
            &notification,
            None,
            &[],
        )
        .await
        .context("Failed to forward the contact request.")?;
    email_client
        .send_email(
            &sender,
            "Thank you for contacting us",
            &auto_reply,
            None,
            &[],
        )
        .await
        .context("Failed to send the contact auto-reply.")?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Message sent successfully" })))
}
