use crate::helpers::{assert_is_redirect_to, spawn_app};

#[tokio::test]
async fn an_error_flash_message_is_set_on_failure() {
    let app = spawn_app().await;

    let response = app
        .post_login(&serde_json::json!({
            "email": "random-user@studio.test",
            "password": "random-password"
        }))
        .await;
    assert_is_redirect_to(&response, "/login");

    let html_page = app.get_login_html().await;
    assert!(html_page.contains("<i>Authentication failed"));

    // The flash message is gone after a reload.
    let html_page = app.get_login_html().await;
    assert!(!html_page.contains("Authentication failed"));
}

#[tokio::test]
async fn admins_are_redirected_to_the_dashboard_after_login() {
    let app = spawn_app().await;

    app.login_test_user().await;

    let html_page = app.get_admin_dashboard_html().await;
    assert!(html_page.contains(&format!("Welcome {}", app.test_user.email)));
}

#[tokio::test]
async fn regular_users_are_redirected_to_the_home_page_after_login() {
    let app = spawn_app().await;

    app.login_regular_user().await;
}

#[tokio::test]
async fn login_is_case_insensitive_on_the_email() {
    let app = spawn_app().await;

    let response = app
        .post_login(&serde_json::json!({
            "email": app.test_user.email.to_uppercase(),
            "password": &app.test_user.password
        }))
        .await;

    assert_is_redirect_to(&response, "/admin/dashboard");
}

#[tokio::test]
async fn logging_out_clears_the_session() {
    let app = spawn_app().await;
    app.login_test_user().await;

    let response = app.post_logout().await;
    assert_is_redirect_to(&response, "/login");

    let html_page = app.get_login_html().await;
    assert!(html_page.contains("You have successfully logged out."));

    let response = app.get("/admin/dashboard").await;
    assert_is_redirect_to(&response, "/login");
}
