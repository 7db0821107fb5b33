use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{assert_is_redirect_to, spawn_app};

#[tokio::test]
async fn subscribe_returns_200_and_stores_an_inactive_subscriber() {
    let app = spawn_app().await;
    Mock::given(path("/emails"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;

    let response = app.post_subscribe("Ursula_Le_Guin@Example.com").await;

    assert_eq!(response.status().as_u16(), 200);
    let (email, active, status): (String, bool, String) =
        sqlx::query_as("SELECT email, active, status FROM subscribers")
            .fetch_one(&app.db_pool)
            .await
            .expect("Failed to fetch saved subscriber.");
    assert_eq!(email, "ursula_le_guin@example.com");
    assert!(!active);
    assert_eq!(status, "ACTIVE");
}

#[tokio::test]
async fn subscribe_rejects_invalid_emails_with_400() {
    let app = spawn_app().await;
    let test_cases = [
        ("", "empty email"),
        ("definitely-not-an-email", "invalid email"),
    ];

    for (email, description) in test_cases {
        let response = app.post_subscribe(email).await;

        assert_eq!(
            response.status().as_u16(),
            400,
            "The API did not return 400 Bad Request when the payload was {description}."
        );
    }
}

#[tokio::test]
async fn subscribe_sends_a_verification_email_with_a_link() {
    let app = spawn_app().await;
    Mock::given(path("/emails"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;

    app.post_subscribe("ursula@example.com").await;

    let email_request = &app.email_server.received_requests().await.unwrap()[0];
    let links = app.get_email_links(email_request);
    assert_eq!(links.html, links.plain_text);
    assert_eq!(links.plain_text.path(), "/api/newsletter/verify");
}

#[tokio::test]
async fn subscribing_twice_before_verifying_sends_a_fresh_link() {
    let app = spawn_app().await;
    Mock::given(path("/emails"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&app.email_server)
        .await;

    app.post_subscribe("ursula@example.com").await;
    let response = app.post_subscribe("ursula@example.com").await;

    assert_eq!(response.status().as_u16(), 200);
    let requests = app.email_server.received_requests().await.unwrap();
    let first = app.get_email_links(&requests[0]);
    let second = app.get_email_links(&requests[1]);
    assert_ne!(first.plain_text, second.plain_text);
}

#[tokio::test]
async fn subscribe_fails_and_stores_nothing_if_the_email_cannot_be_sent() {
    let app = spawn_app().await;
    Mock::given(path("/emails"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&app.email_server)
        .await;

    let response = app.post_subscribe("ursula@example.com").await;

    assert_eq!(response.status().as_u16(), 500);
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subscribers")
        .fetch_one(&app.db_pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn clicking_the_verification_link_activates_the_subscriber() {
    let app = spawn_app().await;
    Mock::given(path("/emails"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&app.email_server)
        .await;

    app.post_subscribe("ursula@example.com").await;
    let email_request = &app.email_server.received_requests().await.unwrap()[0];
    let links = app.get_email_links(email_request);

    let response = app
        .api_client
        .get(links.plain_text)
        .send()
        .await
        .unwrap();
    assert_is_redirect_to(&response, "/newsletter/verified");

    let active: bool = sqlx::query_scalar("SELECT active FROM subscribers WHERE email = $1")
        .bind("ursula@example.com")
        .fetch_one(&app.db_pool)
        .await
        .unwrap();
    assert!(active);

    let response = app.post_subscribe("ursula@example.com").await;
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn verification_without_a_token_is_rejected_with_400() {
    let app = spawn_app().await;

    let response = app.get("/api/newsletter/verify").await;

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn verification_with_an_unknown_token_is_rejected_with_400() {
    let app = spawn_app().await;
    let token = "a".repeat(64);

    let response = app
        .get(&format!("/api/newsletter/verify?token={token}"))
        .await;

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn the_verified_page_renders() {
    let app = spawn_app().await;

    let html_page = app.get_html("/newsletter/verified").await;

    assert!(html_page.contains("Your subscription is confirmed"));
}
