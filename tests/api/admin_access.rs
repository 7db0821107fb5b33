use crate::helpers::{assert_is_redirect_to, spawn_app};

#[tokio::test]
async fn you_must_be_logged_in_to_access_the_admin_dashboard() {
    let app = spawn_app().await;

    let response = app.get("/admin/dashboard").await;

    assert_is_redirect_to(&response, "/login");
}

#[tokio::test]
async fn regular_users_cannot_access_admin_pages() {
    let app = spawn_app().await;
    app.login_regular_user().await;

    for path in [
        "/admin/dashboard",
        "/admin/users",
        "/admin/newsletter/subscribers",
        "/admin/newsletter/campaigns",
    ] {
        let response = app.get(path).await;
        assert_is_redirect_to(&response, "/login");
    }
}

#[tokio::test]
async fn the_admin_api_returns_401_without_a_session() {
    let app = spawn_app().await;

    let response = app.get("/api/admin/newsletter/subscribers").await;

    assert_eq!(response.status().as_u16(), 401);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Unauthorized");
}

#[tokio::test]
async fn the_admin_api_returns_403_for_regular_users() {
    let app = spawn_app().await;
    app.login_regular_user().await;

    let response = app
        .post_json(
            "/api/admin/categories",
            &serde_json::json!({ "name": "Sneaky" }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 403);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Forbidden");
}

#[tokio::test]
async fn admin_pages_render_for_admins() {
    let app = spawn_app().await;
    app.login_test_user().await;

    for path in [
        "/admin/users",
        "/admin/newsletter/subscribers",
        "/admin/newsletter/campaigns",
    ] {
        let response = app.get(path).await;
        assert_eq!(response.status().as_u16(), 200, "{path} did not render");
    }
}

#[tokio::test]
async fn the_users_page_lists_accounts() {
    let app = spawn_app().await;
    app.login_test_user().await;

    let html_page = app.get_html("/admin/users").await;

    assert!(html_page.contains(&app.test_user.email));
}
