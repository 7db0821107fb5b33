use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::spawn_app;

fn valid_request() -> serde_json::Value {
    serde_json::json!({
        "name": "Ada Lovelace",
        "email": "ada@example.com",
        "company": "Analytical Engines",
        "subject": "A new website",
        "message": "We would like to rebuild our website this quarter.",
        "services": ["web-development"]
    })
}

#[tokio::test]
async fn a_valid_contact_request_notifies_the_inbox_and_the_sender() {
    let app = spawn_app().await;
    Mock::given(path("/emails"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&app.email_server)
        .await;

    let response = app.post_json("/api/contact", &valid_request()).await;

    assert_eq!(response.status().as_u16(), 200);
    let emails = app.received_emails().await;
    assert_eq!(emails[0]["to"][0], "hello@studio.test");
    assert_eq!(emails[0]["subject"], "New Contact Form Submission: A new website");
    assert_eq!(emails[1]["to"][0], "ada@example.com");
}

#[tokio::test]
async fn invalid_contact_requests_are_rejected_with_422() {
    let app = spawn_app().await;
    let test_cases = [
        ("name", serde_json::json!("A"), "a one letter name"),
        ("email", serde_json::json!("not-an-email"), "an invalid email"),
        ("phone", serde_json::json!("12345"), "a short phone number"),
        ("subject", serde_json::json!("Hi"), "a short subject"),
        ("message", serde_json::json!("Too short"), "a short message"),
    ];

    for (field, value, description) in test_cases {
        let mut body = valid_request();
        body[field] = value;

        let response = app.post_json("/api/contact", &body).await;

        assert_eq!(
            response.status().as_u16(),
            422,
            "The API did not reject a request with {description}."
        );
    }
}

#[tokio::test]
async fn an_email_failure_returns_500() {
    let app = spawn_app().await;
    Mock::given(path("/emails"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&app.email_server)
        .await;

    let response = app.post_json("/api/contact", &valid_request()).await;

    assert_eq!(response.status().as_u16(), 500);
}
