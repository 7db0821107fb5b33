use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{TestApp, spawn_app};

async fn create_campaign(app: &TestApp, body: serde_json::Value) -> serde_json::Value {
    let response = app.post_json("/api/admin/newsletter/campaigns", &body).await;
    assert_eq!(response.status().as_u16(), 201);
    response.json().await.unwrap()
}

fn draft() -> serde_json::Value {
    serde_json::json!({
        "name": "Spring update",
        "subject": "What we shipped this spring",
        "content": "<p>Three new projects and a redesigned blog.</p>"
    })
}

fn id_of(campaign: &serde_json::Value) -> Uuid {
    campaign["id"].as_str().unwrap().parse().unwrap()
}

async fn add_active_subscribers(app: &TestApp, emails: &[&str]) {
    for email in emails {
        let response = app
            .post_json(
                "/api/admin/newsletter/subscribers",
                &serde_json::json!({ "email": email }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201);
    }
}

async fn stored_status(app: &TestApp, campaign_id: Uuid) -> String {
    sqlx::query_scalar("SELECT status FROM campaigns WHERE id = $1")
        .bind(campaign_id)
        .fetch_one(&app.db_pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn a_campaign_without_a_schedule_is_a_draft() {
    let app = spawn_app().await;
    app.login_test_user().await;

    let campaign = create_campaign(&app, draft()).await;

    assert_eq!(campaign["status"], "DRAFT");
    assert_eq!(campaign["stats"]["sent"], 0);
}

#[tokio::test]
async fn a_campaign_with_a_schedule_is_scheduled() {
    let app = spawn_app().await;
    app.login_test_user().await;
    let mut body = draft();
    body["scheduled_at"] = serde_json::json!("2099-01-01T09:00:00Z");

    let campaign = create_campaign(&app, body).await;

    assert_eq!(campaign["status"], "SCHEDULED");
}

#[tokio::test]
async fn a_campaign_with_an_unknown_template_is_rejected() {
    let app = spawn_app().await;
    app.login_test_user().await;
    let mut body = draft();
    body["template_id"] = serde_json::json!(Uuid::new_v4());

    let response = app.post_json("/api/admin/newsletter/campaigns", &body).await;

    assert_eq!(response.status().as_u16(), 422);
}

#[tokio::test]
async fn sending_a_campaign_delivers_it_to_every_active_subscriber() {
    let app = spawn_app().await;
    app.login_test_user().await;
    add_active_subscribers(&app, &["ursula@example.com", "octavia@example.com"]).await;
    let campaign = create_campaign(&app, draft()).await;
    Mock::given(path("/emails"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&app.email_server)
        .await;

    let response = app
        .post_json(
            &format!("/api/admin/newsletter/campaigns/{}/send", id_of(&campaign)),
            &serde_json::json!({}),
        )
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["stats"]["total"], 2);
    assert_eq!(body["stats"]["sent"], 2);
    assert_eq!(body["stats"]["failed"], 0);
    assert_eq!(stored_status(&app, id_of(&campaign)).await, "SENT");

    let emails = app.received_emails().await;
    assert_eq!(emails[0]["subject"], "What we shipped this spring");
}

#[tokio::test]
async fn pending_and_unsubscribed_subscribers_do_not_receive_campaigns() {
    let app = spawn_app().await;
    app.login_test_user().await;
    add_active_subscribers(&app, &["ursula@example.com", "octavia@example.com"]).await;
    sqlx::query("UPDATE subscribers SET status = 'UNSUBSCRIBED' WHERE email = 'octavia@example.com'")
        .execute(&app.db_pool)
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO subscribers (id, email, active) VALUES ($1, 'pending@example.com', false)",
    )
    .bind(Uuid::new_v4())
    .execute(&app.db_pool)
    .await
    .unwrap();
    let campaign = create_campaign(&app, draft()).await;
    Mock::given(path("/emails"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;

    let response = app
        .post_json(
            &format!("/api/admin/newsletter/campaigns/{}/send", id_of(&campaign)),
            &serde_json::json!({}),
        )
        .await;

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(app.received_emails().await[0]["to"][0], "ursula@example.com");
}

#[tokio::test]
async fn a_campaign_cannot_be_sent_without_active_subscribers() {
    let app = spawn_app().await;
    app.login_test_user().await;
    let campaign = create_campaign(&app, draft()).await;

    let response = app
        .post_json(
            &format!("/api/admin/newsletter/campaigns/{}/send", id_of(&campaign)),
            &serde_json::json!({}),
        )
        .await;

    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(stored_status(&app, id_of(&campaign)).await, "DRAFT");
}

#[tokio::test]
async fn a_sent_campaign_cannot_be_sent_or_edited_again() {
    let app = spawn_app().await;
    app.login_test_user().await;
    add_active_subscribers(&app, &["ursula@example.com"]).await;
    let campaign = create_campaign(&app, draft()).await;
    Mock::given(path("/emails"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;
    let send_path = format!("/api/admin/newsletter/campaigns/{}/send", id_of(&campaign));
    app.post_json(&send_path, &serde_json::json!({})).await;

    let response = app.post_json(&send_path, &serde_json::json!({})).await;
    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body["message"],
        "Campaign cannot be sent because it is in SENT status"
    );

    let response = app
        .patch_json(
            &format!("/api/admin/newsletter/campaigns/{}", id_of(&campaign)),
            &serde_json::json!({ "name": "Renamed" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn a_campaign_is_marked_failed_when_no_email_goes_out() {
    let app = spawn_app().await;
    app.login_test_user().await;
    add_active_subscribers(&app, &["ursula@example.com", "octavia@example.com"]).await;
    let campaign = create_campaign(&app, draft()).await;
    Mock::given(path("/emails"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&app.email_server)
        .await;

    let response = app
        .post_json(
            &format!("/api/admin/newsletter/campaigns/{}/send", id_of(&campaign)),
            &serde_json::json!({}),
        )
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["stats"]["failed"], 2);
    assert_eq!(stored_status(&app, id_of(&campaign)).await, "FAILED");
}

#[tokio::test]
async fn a_test_email_is_sent_to_the_given_address_only() {
    let app = spawn_app().await;
    app.login_test_user().await;
    let campaign = create_campaign(&app, draft()).await;
    Mock::given(path("/emails"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;

    let response = app
        .post_json(
            &format!("/api/admin/newsletter/campaigns/{}/test", id_of(&campaign)),
            &serde_json::json!({ "email": "editor@example.com" }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let email = &app.received_emails().await[0];
    assert_eq!(email["subject"], "[Test] What we shipped this spring");
    assert_eq!(email["to"][0], "editor@example.com");
    assert_eq!(stored_status(&app, id_of(&campaign)).await, "DRAFT");
}

#[tokio::test]
async fn templates_can_be_created_and_used_by_campaigns() {
    let app = spawn_app().await;
    app.login_test_user().await;
    let response = app
        .post_json(
            "/api/admin/newsletter/templates",
            &serde_json::json!({
                "name": "Monthly",
                "subject": "Monthly news",
                "content": "<p>{{ content }}</p>"
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let template: serde_json::Value = response.json().await.unwrap();

    let mut body = draft();
    body["template_id"] = template["id"].clone();
    let campaign = create_campaign(&app, body).await;

    assert_eq!(campaign["template_id"], template["id"]);
}

#[tokio::test]
async fn deleting_a_campaign_returns_204() {
    let app = spawn_app().await;
    app.login_test_user().await;
    let campaign = create_campaign(&app, draft()).await;
    let path = format!("/api/admin/newsletter/campaigns/{}", id_of(&campaign));

    assert_eq!(app.delete(&path).await.status().as_u16(), 204);
    assert_eq!(app.get(&path).await.status().as_u16(), 404);
}

#[tokio::test]
async fn the_worker_delivers_due_scheduled_campaigns() {
    let app = spawn_app().await;
    app.login_test_user().await;
    add_active_subscribers(&app, &["ursula@example.com"]).await;
    let mut body = draft();
    body["scheduled_at"] = serde_json::json!("2099-01-01T09:00:00Z");
    let future = create_campaign(&app, body).await;
    let due = create_campaign(&app, draft()).await;
    sqlx::query(
        "UPDATE campaigns SET status = 'SCHEDULED', scheduled_at = now() - interval '1 minute' WHERE id = $1",
    )
    .bind(id_of(&due))
    .execute(&app.db_pool)
    .await
    .unwrap();
    Mock::given(path("/emails"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;

    app.dispatch_all_pending_campaigns().await;

    assert_eq!(stored_status(&app, id_of(&due)).await, "SENT");
    assert_eq!(stored_status(&app, id_of(&future)).await, "SCHEDULED");
    let delivered: i32 =
        sqlx::query_scalar("SELECT delivered FROM campaign_stats WHERE campaign_id = $1")
            .bind(id_of(&due))
            .fetch_one(&app.db_pool)
            .await
            .unwrap();
    assert_eq!(delivered, 1);
}

#[tokio::test]
async fn a_due_campaign_without_recipients_is_marked_sent() {
    let app = spawn_app().await;
    app.login_test_user().await;
    let campaign = create_campaign(&app, draft()).await;
    sqlx::query("UPDATE campaigns SET status = 'SCHEDULED', scheduled_at = now() WHERE id = $1")
        .bind(id_of(&campaign))
        .execute(&app.db_pool)
        .await
        .unwrap();
    Mock::given(path("/emails"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.email_server)
        .await;

    app.dispatch_all_pending_campaigns().await;

    assert_eq!(stored_status(&app, id_of(&campaign)).await, "SENT");
}

#[tokio::test]
async fn a_campaign_being_sent_cannot_be_edited() {
    let app = spawn_app().await;
    app.login_test_user().await;
    let campaign = create_campaign(&app, draft()).await;
    sqlx::query("UPDATE campaigns SET status = 'SENDING' WHERE id = $1")
        .bind(id_of(&campaign))
        .execute(&app.db_pool)
        .await
        .unwrap();

    let response = app
        .patch_json(
            &format!("/api/admin/newsletter/campaigns/{}", id_of(&campaign)),
            &serde_json::json!({ "name": "Renamed" }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(stored_status(&app, id_of(&campaign)).await, "SENDING");
}

#[tokio::test]
async fn clearing_the_schedule_turns_a_campaign_back_into_a_draft() {
    let app = spawn_app().await;
    app.login_test_user().await;
    let mut body = draft();
    body["scheduled_at"] = serde_json::json!("2099-01-01T09:00:00Z");
    let campaign = create_campaign(&app, body).await;
    let path = format!("/api/admin/newsletter/campaigns/{}", id_of(&campaign));

    let renamed: serde_json::Value = app
        .patch_json(&path, &serde_json::json!({ "name": "Renamed" }))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(renamed["status"], "SCHEDULED");

    let unscheduled: serde_json::Value = app
        .patch_json(&path, &serde_json::json!({ "scheduled_at": null }))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(unscheduled["status"], "DRAFT");
    assert!(unscheduled["scheduled_at"].is_null());
}

#[tokio::test]
async fn a_send_that_loses_the_claim_is_rejected() {
    let app = spawn_app().await;
    app.login_test_user().await;
    add_active_subscribers(&app, &["ursula@example.com"]).await;
    let campaign = create_campaign(&app, draft()).await;
    Mock::given(path("/emails"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;
    let send_path = format!("/api/admin/newsletter/campaigns/{}/send", id_of(&campaign));

    let body = serde_json::json!({});
    let (first, second) = tokio::join!(
        app.post_json(&send_path, &body),
        app.post_json(&send_path, &body),
    );

    let mut statuses = [first.status().as_u16(), second.status().as_u16()];
    statuses.sort();
    assert_eq!(statuses, [200, 400]);
    assert_eq!(stored_status(&app, id_of(&campaign)).await, "SENT");
}
