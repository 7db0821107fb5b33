use uuid::Uuid;

use crate::helpers::{assert_is_redirect_to, spawn_app};

#[tokio::test]
async fn registering_creates_a_regular_account() {
    let app = spawn_app().await;
    let email = format!("{}@studio.test", Uuid::new_v4());
    let password = Uuid::new_v4().to_string();

    let response = app
        .post_form(
            "/register",
            &serde_json::json!({
                "name": "Ada Lovelace",
                "email": &email,
                "password": &password,
                "password_check": &password,
            }),
        )
        .await;
    assert_is_redirect_to(&response, "/login");
    let html_page = app.get_login_html().await;
    assert!(html_page.contains("Your account has been created."));

    let role: String = sqlx::query_scalar("SELECT role FROM users WHERE email = $1")
        .bind(&email)
        .fetch_one(&app.db_pool)
        .await
        .unwrap();
    assert_eq!(role, "USER");

    let response = app
        .post_login(&serde_json::json!({ "email": &email, "password": &password }))
        .await;
    assert_is_redirect_to(&response, "/");
}

#[tokio::test]
async fn registering_an_existing_email_is_rejected() {
    let app = spawn_app().await;
    let password = Uuid::new_v4().to_string();

    let response = app
        .post_form(
            "/register",
            &serde_json::json!({
                "name": "Someone Else",
                "email": &app.test_user.email,
                "password": &password,
                "password_check": &password,
            }),
        )
        .await;

    assert_is_redirect_to(&response, "/register");
    let html_page = app.get_html("/register").await;
    assert!(html_page.contains("An account with this email already exists."));
}

#[tokio::test]
async fn registering_with_mismatched_passwords_is_rejected() {
    let app = spawn_app().await;

    let response = app
        .post_form(
            "/register",
            &serde_json::json!({
                "name": "Ada Lovelace",
                "email": "ada@studio.test",
                "password": Uuid::new_v4().to_string(),
                "password_check": Uuid::new_v4().to_string(),
            }),
        )
        .await;

    assert_is_redirect_to(&response, "/register");
    let html_page = app.get_html("/register").await;
    assert!(html_page.contains("You entered two different passwords"));
}
