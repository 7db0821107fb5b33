use uuid::Uuid;

use crate::helpers::{TestApp, spawn_app};

async fn create_subscriber(app: &TestApp, email: &str, tags: &[&str]) -> serde_json::Value {
    let response = app
        .post_json(
            "/api/admin/newsletter/subscribers",
            &serde_json::json!({ "email": email, "first_name": "Ursula", "tags": tags }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    response.json().await.unwrap()
}

fn id_of(subscriber: &serde_json::Value) -> Uuid {
    subscriber["id"].as_str().unwrap().parse().unwrap()
}

async fn post_csv(app: &TestApp, path: &str, csv: &'static str) -> reqwest::Response {
    app.api_client
        .post(app.url(path))
        .header("Content-Type", "text/csv")
        .body(csv)
        .send()
        .await
        .expect("Failed to execute request.")
}

#[tokio::test]
async fn admins_can_create_and_fetch_a_subscriber() {
    let app = spawn_app().await;
    app.login_test_user().await;

    let created = create_subscriber(&app, "Ursula@Example.com", &["vip", "vip", " news "]).await;

    assert_eq!(created["email"], "ursula@example.com");
    assert_eq!(created["status"], "ACTIVE");
    assert_eq!(created["tags"], serde_json::json!(["vip", "news"]));
    let response = app
        .get(&format!("/api/admin/newsletter/subscribers/{}", id_of(&created)))
        .await;
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn creating_a_duplicate_subscriber_is_rejected() {
    let app = spawn_app().await;
    app.login_test_user().await;
    create_subscriber(&app, "ursula@example.com", &[]).await;

    let response = app
        .post_json(
            "/api/admin/newsletter/subscribers",
            &serde_json::json!({ "email": "URSULA@example.com" }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Email already subscribed");
}

#[tokio::test]
async fn listing_subscribers_filters_by_tag_and_search() {
    let app = spawn_app().await;
    app.login_test_user().await;
    create_subscriber(&app, "ursula@example.com", &["vip"]).await;
    create_subscriber(&app, "octavia@example.com", &[]).await;

    let body: serde_json::Value = app
        .get("/api/admin/newsletter/subscribers?tag=vip")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["total"], 1);
    assert_eq!(body["subscribers"][0]["email"], "ursula@example.com");

    let body: serde_json::Value = app
        .get("/api/admin/newsletter/subscribers?search=octavia")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["total"], 1);
    assert_eq!(body["subscribers"][0]["email"], "octavia@example.com");
}

#[tokio::test]
async fn updating_a_subscriber_only_changes_the_given_fields() {
    let app = spawn_app().await;
    app.login_test_user().await;
    let created = create_subscriber(&app, "ursula@example.com", &["vip"]).await;

    let response = app
        .patch_json(
            &format!("/api/admin/newsletter/subscribers/{}", id_of(&created)),
            &serde_json::json!({ "status": "UNSUBSCRIBED" }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let updated: serde_json::Value = response.json().await.unwrap();
    assert_eq!(updated["status"], "UNSUBSCRIBED");
    assert_eq!(updated["email"], "ursula@example.com");
    assert_eq!(updated["tags"], serde_json::json!(["vip"]));
}

#[tokio::test]
async fn deleting_a_subscriber_returns_204_then_404() {
    let app = spawn_app().await;
    app.login_test_user().await;
    let created = create_subscriber(&app, "ursula@example.com", &[]).await;
    let path = format!("/api/admin/newsletter/subscribers/{}", id_of(&created));

    assert_eq!(app.delete(&path).await.status().as_u16(), 204);
    assert_eq!(app.delete(&path).await.status().as_u16(), 404);
    assert_eq!(app.get(&path).await.status().as_u16(), 404);
}

#[tokio::test]
async fn bulk_tag_changes_apply_to_every_selected_subscriber() {
    let app = spawn_app().await;
    app.login_test_user().await;
    let first = create_subscriber(&app, "ursula@example.com", &["vip"]).await;
    let second = create_subscriber(&app, "octavia@example.com", &[]).await;
    let ids = [id_of(&first), id_of(&second)];

    let response = app
        .post_json(
            "/api/admin/newsletter/subscribers/bulk",
            &serde_json::json!({
                "action": "addTags",
                "subscriber_ids": ids,
                "data": { "tags": ["launch", "vip"] }
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["affected"], 2);

    app.post_json(
        "/api/admin/newsletter/subscribers/bulk",
        &serde_json::json!({
            "action": "remove_tags",
            "subscriber_ids": ids,
            "data": { "tags": ["vip"] }
        }),
    )
    .await;

    let tags: Vec<Vec<String>> = sqlx::query_scalar("SELECT tags FROM subscribers ORDER BY email")
        .fetch_all(&app.db_pool)
        .await
        .unwrap();
    assert_eq!(tags, vec![vec!["launch".to_string()], vec!["launch".to_string()]]);
}

#[tokio::test]
async fn bulk_status_update_and_delete_work() {
    let app = spawn_app().await;
    app.login_test_user().await;
    let first = create_subscriber(&app, "ursula@example.com", &[]).await;
    let second = create_subscriber(&app, "octavia@example.com", &[]).await;

    let response = app
        .post_json(
            "/api/admin/newsletter/subscribers/bulk",
            &serde_json::json!({
                "action": "update_status",
                "subscriber_ids": [id_of(&first)],
                "data": { "status": "BOUNCED" }
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let status: String = sqlx::query_scalar("SELECT status FROM subscribers WHERE id = $1")
        .bind(id_of(&first))
        .fetch_one(&app.db_pool)
        .await
        .unwrap();
    assert_eq!(status, "BOUNCED");

    let response = app
        .post_json(
            "/api/admin/newsletter/subscribers/bulk",
            &serde_json::json!({
                "action": "delete",
                "subscriber_ids": [id_of(&first), id_of(&second)]
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subscribers")
        .fetch_one(&app.db_pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn invalid_bulk_requests_are_rejected_with_400() {
    let app = spawn_app().await;
    app.login_test_user().await;
    let subscriber = create_subscriber(&app, "ursula@example.com", &[]).await;
    let test_cases = [
        (
            serde_json::json!({ "action": "explode", "subscriber_ids": [id_of(&subscriber)] }),
            "an unknown action",
        ),
        (
            serde_json::json!({ "action": "delete", "subscriber_ids": [] }),
            "no subscribers",
        ),
        (
            serde_json::json!({ "action": "update_status", "subscriber_ids": [id_of(&subscriber)] }),
            "a status update without a status",
        ),
    ];

    for (body, description) in test_cases {
        let response = app
            .post_json("/api/admin/newsletter/subscribers/bulk", &body)
            .await;

        assert_eq!(
            response.status().as_u16(),
            400,
            "The API did not reject a bulk request with {description}."
        );
    }
}

#[tokio::test]
async fn csv_import_adds_new_subscribers_and_reports_the_rest() {
    let app = spawn_app().await;
    app.login_test_user().await;
    create_subscriber(&app, "octavia@example.com", &[]).await;
    let csv = "email,first_name,last_name\n\
               ursula@example.com,Ursula,Le Guin\n\
               octavia@example.com,Octavia,Butler\n\
               not-an-email,Nobody,\n";

    let response = post_csv(
        &app,
        "/api/admin/newsletter/subscribers/import?tags=imported,2024",
        csv,
    )
    .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["imported"], 1);
    let rows: Vec<u64> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["row"].as_u64().unwrap())
        .collect();
    assert_eq!(rows, vec![2, 3]);

    let tags: Vec<String> =
        sqlx::query_scalar("SELECT tags FROM subscribers WHERE email = 'ursula@example.com'")
            .fetch_one(&app.db_pool)
            .await
            .unwrap();
    assert_eq!(tags, vec!["imported".to_string(), "2024".to_string()]);
}

#[tokio::test]
async fn csv_import_without_valid_rows_is_rejected() {
    let app = spawn_app().await;
    app.login_test_user().await;

    let response = post_csv(
        &app,
        "/api/admin/newsletter/subscribers/import",
        "email\nnot-an-email\n",
    )
    .await;

    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "No valid subscribers found in file");
}

#[tokio::test]
async fn csv_import_of_only_known_emails_is_rejected() {
    let app = spawn_app().await;
    app.login_test_user().await;
    create_subscriber(&app, "octavia@example.com", &[]).await;

    let response = post_csv(
        &app,
        "/api/admin/newsletter/subscribers/import",
        "email\nOctavia@example.com\n",
    )
    .await;

    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "No valid subscribers found in file");
}
