use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{TestUser, assert_is_redirect_to, spawn_app};

#[tokio::test]
async fn inviting_a_user_emails_an_account_setup_link() {
    let app = spawn_app().await;
    app.login_test_user().await;
    Mock::given(path("/emails"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;

    let response = app
        .post_form(
            "/admin/users",
            &serde_json::json!({ "name": "Octavia", "email": "octavia@example.com", "role": "USER" }),
        )
        .await;
    assert_is_redirect_to(&response, "/admin/users");

    let html_page = app.get_html("/admin/users").await;
    assert!(html_page.contains("octavia@example.com has been invited."));

    let email_request = &app.email_server.received_requests().await.unwrap()[0];
    let email: serde_json::Value = serde_json::from_slice(&email_request.body).unwrap();
    assert_eq!(email["subject"], "Set up your account");
    let links = app.get_email_links(email_request);
    assert_eq!(links.plain_text.path(), "/auth/reset-password");
    let token = links
        .plain_text
        .query_pairs()
        .find(|(key, _)| key == "token")
        .map(|(_, value)| value.into_owned())
        .unwrap();

    let (stored_token, hours_left, has_password): (String, f64, bool) = sqlx::query_as(
        r#"
        SELECT reset_token,
               EXTRACT(EPOCH FROM reset_token_expiry - now())::float8 / 3600,
               password_hash IS NOT NULL
        FROM users WHERE email = 'octavia@example.com'
        "#,
    )
    .fetch_one(&app.db_pool)
    .await
    .unwrap();
    assert_eq!(stored_token, token);
    assert!(hours_left > 23.0 && hours_left <= 24.0);
    assert!(!has_password);
}

#[tokio::test]
async fn inviting_an_existing_email_is_rejected() {
    let app = spawn_app().await;
    app.login_test_user().await;
    Mock::given(path("/emails"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.email_server)
        .await;

    let response = app
        .post_form(
            "/admin/users",
            &serde_json::json!({ "name": "Twin", "email": &app.test_user.email, "role": "ADMIN" }),
        )
        .await;
    assert_is_redirect_to(&response, "/admin/users");

    let html_page = app.get_html("/admin/users").await;
    assert!(html_page.contains("A user with this email already exists."));
}

#[tokio::test]
async fn admins_can_edit_another_user() {
    let app = spawn_app().await;
    let user = TestUser::generate("USER");
    user.store(&app.db_pool).await;
    app.login_test_user().await;

    let response = app
        .patch_json(
            &format!("/api/admin/users/{}", user.user_id),
            &serde_json::json!({
                "name": "Promoted",
                "email": "promoted@example.com",
                "role": "ADMIN",
                "password": "a-brand-new-long-password"
            }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let account: serde_json::Value = response.json().await.unwrap();
    assert_eq!(account["name"], "Promoted");
    assert_eq!(account["email"], "promoted@example.com");
    assert_eq!(account["role"], "ADMIN");
    assert!(account.get("password_hash").is_none());

    app.post_logout().await;
    let response = app
        .post_login(&serde_json::json!({
            "email": "promoted@example.com",
            "password": "a-brand-new-long-password"
        }))
        .await;
    assert_is_redirect_to(&response, "/admin/dashboard");
}

#[tokio::test]
async fn an_email_owned_by_another_user_cannot_be_taken() {
    let app = spawn_app().await;
    let user = TestUser::generate("USER");
    user.store(&app.db_pool).await;
    app.login_test_user().await;

    let response = app
        .patch_json(
            &format!("/api/admin/users/{}", user.user_id),
            &serde_json::json!({ "email": &app.test_user.email }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Email already taken");
}

#[tokio::test]
async fn a_short_password_is_rejected() {
    let app = spawn_app().await;
    let user = TestUser::generate("USER");
    user.store(&app.db_pool).await;
    app.login_test_user().await;

    let response = app
        .patch_json(
            &format!("/api/admin/users/{}", user.user_id),
            &serde_json::json!({ "password": "short" }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 422);
}

#[tokio::test]
async fn admins_can_delete_other_users_but_not_themselves() {
    let app = spawn_app().await;
    let user = TestUser::generate("USER");
    user.store(&app.db_pool).await;
    app.login_test_user().await;

    let response = app
        .delete(&format!("/api/admin/users/{}", app.test_user.user_id))
        .await;
    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Cannot delete your own account");

    let path = format!("/api/admin/users/{}", user.user_id);
    assert_eq!(app.delete(&path).await.status().as_u16(), 204);
    assert_eq!(app.delete(&path).await.status().as_u16(), 404);
}

#[tokio::test]
async fn regular_users_cannot_manage_users() {
    let app = spawn_app().await;
    app.login_regular_user().await;

    let response = app
        .delete(&format!("/api/admin/users/{}", app.test_user.user_id))
        .await;

    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn signed_in_users_can_rename_themselves() {
    let app = spawn_app().await;
    let user = app.login_regular_user().await;

    let response = app
        .post_json("/api/profile", &serde_json::json!({ "name": "  Ursula  " }))
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let name: Option<String> = sqlx::query_scalar("SELECT name FROM users WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_one(&app.db_pool)
        .await
        .unwrap();
    assert_eq!(name.as_deref(), Some("Ursula"));
}

#[tokio::test]
async fn a_blank_profile_name_is_rejected() {
    let app = spawn_app().await;
    app.login_regular_user().await;

    let response = app
        .post_json("/api/profile", &serde_json::json!({ "name": "   " }))
        .await;

    assert_eq!(response.status().as_u16(), 422);
}

#[tokio::test]
async fn anonymous_profile_updates_are_rejected() {
    let app = spawn_app().await;

    let response = app
        .post_json("/api/profile", &serde_json::json!({ "name": "Nobody" }))
        .await;

    assert_eq!(response.status().as_u16(), 401);
}
