mod forgot;
mod reset;

use anyhow::Context;
use tera::Tera;

use crate::domain::{ActivationToken, SubscriberEmail};
use crate::email_client::EmailClient;

pub use forgot::{forgot_password, forgot_password_form};
pub use reset::{reset_password, reset_password_form};

/// Why a password link is being sent.
#[derive(Debug, Clone, Copy)]
pub enum PasswordLink {
    Reset,
    AccountSetup,
}

impl PasswordLink {
    fn subject(&self) -> &'static str {
        match self {
            PasswordLink::Reset => "Reset your password",
            PasswordLink::AccountSetup => "Set up your account",
        }
    }

    fn template(&self) -> &'static str {
        match self {
            PasswordLink::Reset => "emails/password_reset.html",
            PasswordLink::AccountSetup => "emails/account_setup.html",
        }
    }
}

#[tracing::instrument(name = "Send a password link", skip(email_client, tera, base_url, token))]
pub async fn send_password_link(
    email_client: &EmailClient,
    tera: &Tera,
    base_url: &str,
    recipient: &SubscriberEmail,
    token: &ActivationToken,
    kind: PasswordLink,
) -> Result<(), anyhow::Error> {
    let link = format!("{base_url}/auth/reset-password?token={token}");
    let mut ctx = tera::Context::new();
    ctx.insert("link", &link);
    let html = tera
        .render(kind.template(), &ctx)
        .context("Failed to render the password email.")?;
    let text = format!("Open the following link to choose a password:\n{link}");

    email_client
        .send_email(recipient, kind.subject(), &html, Some(&text), &[])
        .await
        .context("Failed to send the password email.")
}
