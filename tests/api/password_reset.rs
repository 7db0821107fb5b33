use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{assert_is_redirect_to, spawn_app};

const RESET_LINK_SENT: &str = "If an account exists for that email";

#[tokio::test]
async fn unknown_emails_get_the_same_answer_and_no_email() {
    let app = spawn_app().await;
    Mock::given(path("/emails"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.email_server)
        .await;

    let response = app
        .post_form(
            "/auth/forgot-password",
            &serde_json::json!({ "email": "nobody@studio.test" }),
        )
        .await;

    assert_is_redirect_to(&response, "/auth/forgot-password");
    let html_page = app.get_html("/auth/forgot-password").await;
    assert!(html_page.contains(RESET_LINK_SENT));
}

#[tokio::test]
async fn a_reset_link_lets_the_user_choose_a_new_password() {
    let app = spawn_app().await;
    let new_password = Uuid::new_v4().to_string();
    Mock::given(path("/emails"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;

    let response = app
        .post_form(
            "/auth/forgot-password",
            &serde_json::json!({ "email": &app.test_user.email }),
        )
        .await;
    assert_is_redirect_to(&response, "/auth/forgot-password");

    let email_request = &app.email_server.received_requests().await.unwrap()[0];
    let links = app.get_email_links(email_request);
    assert_eq!(links.html, links.plain_text);
    assert_eq!(links.plain_text.path(), "/auth/reset-password");
    let token = links
        .plain_text
        .query_pairs()
        .find(|(key, _)| key == "token")
        .map(|(_, value)| value.into_owned())
        .unwrap();

    let form_page = app
        .get_html(&format!("/auth/reset-password?token={token}"))
        .await;
    assert!(form_page.contains(&token));

    let response = app
        .post_form(
            "/auth/reset-password",
            &serde_json::json!({
                "token": &token,
                "password": &new_password,
                "password_check": &new_password,
            }),
        )
        .await;
    assert_is_redirect_to(&response, "/login");

    let response = app
        .post_login(&serde_json::json!({
            "email": &app.test_user.email,
            "password": &new_password
        }))
        .await;
    assert_is_redirect_to(&response, "/admin/dashboard");

    // Tokens are single use.
    let response = app
        .post_form(
            "/auth/reset-password",
            &serde_json::json!({
                "token": &token,
                "password": &new_password,
                "password_check": &new_password,
            }),
        )
        .await;
    assert_is_redirect_to(&response, "/auth/forgot-password");
}

#[tokio::test]
async fn a_malformed_reset_link_is_rejected() {
    let app = spawn_app().await;

    let response = app.get("/auth/reset-password?token=not-a-token").await;

    assert_is_redirect_to(&response, "/auth/forgot-password");
    let html_page = app.get_html("/auth/forgot-password").await;
    assert!(html_page.contains("This password link is invalid or has expired."));
}

#[tokio::test]
async fn an_email_failure_does_not_leak_through_the_form() {
    let app = spawn_app().await;
    Mock::given(path("/emails"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&app.email_server)
        .await;

    let response = app
        .post_form(
            "/auth/forgot-password",
            &serde_json::json!({ "email": &app.test_user.email }),
        )
        .await;

    assert_is_redirect_to(&response, "/auth/forgot-password");
}
