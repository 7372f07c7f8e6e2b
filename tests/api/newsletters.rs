use chrono::{NaiveDateTime, Utc};
use serde_json::{json, Value};

use crate::helpers::TestApp;

fn timestamp(value: &Value) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(
        value.as_str().expect("Timestamp is not a string"),
        "%Y-%m-%d %H:%M:%S",
    )
    .expect("Timestamp has an unexpected format")
}

fn id_of(newsletter: &Value) -> i64 {
    newsletter["id"].as_i64().expect("Newsletter has no id")
}

#[tokio::test]
async fn create_newsletter_returns_a_201_for_valid_data() {
    let app = TestApp::spawn().await;
    let user = app.add_user().await;

    let response = app
        .post_newsletters(&json!({
            "title": "Weekly digest",
            "body": "All the news.",
            "user_id": user.id,
        }))
        .await;

    assert_eq!(201, response.status().as_u16());
    let body: Value = response.json().await.expect("Response is not JSON");
    assert_eq!(body["title"], "Weekly digest");
    assert_eq!(body["body"], "All the news.");
    assert_eq!(body["user_id"], user.id);
    assert_eq!(body["user"], json!({ "id": user.id, "username": user.username }));
    assert!(body["edited_at"].is_null());
}

#[tokio::test]
async fn created_newsletter_can_be_fetched_back() {
    let app = TestApp::spawn().await;
    let user = app.add_user().await;
    let before = Utc::now().naive_utc();

    let created = app
        .create_newsletter("Monthly roundup", "Plenty happened.", user.id)
        .await;
    let response = app.get_newsletter(id_of(&created)).await;

    assert_eq!(200, response.status().as_u16());
    let fetched: Value = response.json().await.expect("Response is not JSON");
    assert_eq!(fetched, created);
    assert_eq!(fetched["title"], "Monthly roundup");
    assert_eq!(fetched["body"], "Plenty happened.");
    assert_eq!(fetched["user_id"], user.id);
    assert!(fetched["edited_at"].is_null());

    let published_at = timestamp(&fetched["published_at"]);
    let drift = (published_at - before).num_seconds().abs();
    assert!(drift <= 5, "published_at is {drift}s away from the request");
}

#[tokio::test]
async fn create_newsletter_rejects_short_titles() {
    let app = TestApp::spawn().await;
    let user = app.add_user().await;

    let response = app
        .post_newsletters(&json!({ "title": "Hey", "body": "Hi.", "user_id": user.id }))
        .await;

    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await.expect("Response is not JSON");
    assert_eq!(
        body,
        json!({ "message": { "title": "Title must be at least 5 characters long" } })
    );
}

#[tokio::test]
async fn create_newsletter_accepts_a_five_character_title() {
    let app = TestApp::spawn().await;
    let user = app.add_user().await;

    let response = app
        .post_newsletters(&json!({ "title": "Hello", "body": "Hi.", "user_id": user.id }))
        .await;

    assert_eq!(201, response.status().as_u16());
}

#[tokio::test]
async fn create_newsletter_returns_a_400_when_data_is_missing() {
    let app = TestApp::spawn().await;
    let user = app.add_user().await;
    let test_cases = vec![
        (
            json!({ "body": "Hi.", "user_id": user.id }),
            "title",
            "Title is required",
        ),
        (
            json!({ "title": "Weekly digest", "user_id": user.id }),
            "body",
            "Body is required",
        ),
        (
            json!({ "title": "Weekly digest", "body": "Hi." }),
            "user_id",
            "User ID is required",
        ),
    ];

    for (invalid_body, field, message) in test_cases {
        let response = app.post_newsletters(&invalid_body).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 when {field} was missing"
        );
        let body: Value = response.json().await.expect("Response is not JSON");
        assert_eq!(body["message"][field], message);
    }
}

#[tokio::test]
async fn create_newsletter_reports_every_failing_field() {
    let app = TestApp::spawn().await;

    let response = app.post_newsletters(&json!({ "title": "abc" })).await;

    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await.expect("Response is not JSON");
    assert_eq!(
        body,
        json!({ "message": {
            "title": "Title must be at least 5 characters long",
            "body": "Body is required",
            "user_id": "User ID is required",
        } })
    );
}

#[tokio::test]
async fn create_newsletter_rejects_an_unknown_user() {
    let app = TestApp::spawn().await;

    let response = app
        .post_newsletters(&json!({ "title": "Weekly digest", "body": "Hi.", "user_id": 999999 }))
        .await;

    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await.expect("Response is not JSON");
    assert_eq!(body, json!({ "message": { "user_id": "User not found" } }));

    let listed: Value = app.get_newsletters().await.json().await.unwrap();
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn create_newsletter_rejects_malformed_json() {
    let app = TestApp::spawn().await;

    let response = app
        .api_client
        .post(format!("{}/newsletters", app.address))
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await.expect("Response is not JSON");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn create_newsletter_reports_wrongly_typed_fields_by_name() {
    let app = TestApp::spawn().await;
    let user = app.add_user().await;
    let test_cases = vec![
        (
            json!({ "title": "Weekly digest", "body": "Hi.", "user_id": "abc" }),
            "user_id",
            "User ID must be an integer",
        ),
        (
            json!({ "title": 12345, "body": "Hi.", "user_id": user.id }),
            "title",
            "Title must be a string",
        ),
    ];

    for (invalid_body, field, message) in test_cases {
        let response = app.post_newsletters(&invalid_body).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 when {field} had the wrong type"
        );
        let body: Value = response.json().await.expect("Response is not JSON");
        assert!(body["message"].is_object());
        assert_eq!(body["message"][field], message);
    }

    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM newsletters")
        .fetch_one(&app.db_pool)
        .await
        .expect("Failed to count newsletters");
    assert_eq!(count.0, 0);
}

#[tokio::test]
async fn list_newsletters_returns_every_newsletter_with_its_author() {
    let app = TestApp::spawn().await;
    let alice = app.add_user().await;
    let bob = app.add_user().await;
    let first = app.create_newsletter("First issue", "One.", alice.id).await;
    let second = app.create_newsletter("Second issue", "Two.", bob.id).await;

    let response = app.get_newsletters().await;

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.expect("Response is not JSON");
    assert_eq!(body, json!([first, second]));
    assert!(body[0]["user"].get("newsletters").is_none());
    assert_eq!(body[1]["user"]["username"], bob.username);
}

#[tokio::test]
async fn get_newsletter_returns_a_404_for_an_unknown_id() {
    let app = TestApp::spawn().await;

    let response = app.get_newsletter(424242).await;

    assert_eq!(404, response.status().as_u16());
    let body: Value = response.json().await.expect("Response is not JSON");
    assert_eq!(body, json!({ "error": "Not found" }));
}

#[tokio::test]
async fn patch_updates_only_the_fields_sent() {
    let app = TestApp::spawn().await;
    let user = app.add_user().await;
    let created = app
        .create_newsletter("Original title", "Original body.", user.id)
        .await;
    let id = id_of(&created);

    let response = app
        .patch_newsletter(id, &json!({ "title": "Updated Title" }))
        .await;

    assert_eq!(200, response.status().as_u16());
    let updated: Value = response.json().await.expect("Response is not JSON");
    assert_eq!(updated["title"], "Updated Title");
    assert_eq!(updated["body"], "Original body.");
    assert_eq!(updated["user_id"], user.id);
    assert_eq!(updated["published_at"], created["published_at"]);
    assert!(timestamp(&updated["edited_at"]) >= timestamp(&created["published_at"]));

    let fetched: Value = app.get_newsletter(id).await.json().await.unwrap();
    assert_eq!(fetched, updated);
}

#[tokio::test]
async fn patch_can_move_a_newsletter_to_another_user() {
    let app = TestApp::spawn().await;
    let alice = app.add_user().await;
    let bob = app.add_user().await;
    let created = app.create_newsletter("Handover", "Yours now.", alice.id).await;

    let response = app
        .patch_newsletter(id_of(&created), &json!({ "user_id": bob.id }))
        .await;

    assert_eq!(200, response.status().as_u16());
    let updated: Value = response.json().await.expect("Response is not JSON");
    assert_eq!(updated["user_id"], bob.id);
    assert_eq!(updated["user"]["username"], bob.username);
}

#[tokio::test]
async fn patch_rejects_a_short_title_and_leaves_the_record_alone() {
    let app = TestApp::spawn().await;
    let user = app.add_user().await;
    let created = app.create_newsletter("Keep me", "Body.", user.id).await;
    let id = id_of(&created);

    let response = app.patch_newsletter(id, &json!({ "title": "no" })).await;

    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await.expect("Response is not JSON");
    assert_eq!(
        body,
        json!({ "message": { "title": "Title must be at least 5 characters long" } })
    );
    let fetched: Value = app.get_newsletter(id).await.json().await.unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn patch_rejects_an_unknown_user() {
    let app = TestApp::spawn().await;
    let user = app.add_user().await;
    let created = app.create_newsletter("Stay put", "Body.", user.id).await;

    let response = app
        .patch_newsletter(id_of(&created), &json!({ "user_id": 999999 }))
        .await;

    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await.expect("Response is not JSON");
    assert_eq!(body, json!({ "message": { "user_id": "User not found" } }));
}

#[tokio::test]
async fn patch_reports_wrongly_typed_fields_by_name() {
    let app = TestApp::spawn().await;
    let user = app.add_user().await;
    let created = app.create_newsletter("Typed fields", "Body.", user.id).await;
    let id = id_of(&created);
    let test_cases = vec![
        (
            json!({ "user_id": "not a number" }),
            "user_id",
            "User ID must be an integer",
        ),
        (json!({ "title": true }), "title", "Title must be a string"),
    ];

    for (invalid_body, field, message) in test_cases {
        let response = app.patch_newsletter(id, &invalid_body).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 when {field} had the wrong type"
        );
        let body: Value = response.json().await.expect("Response is not JSON");
        assert_eq!(body, json!({ "message": { field: message } }));
    }

    let fetched: Value = app.get_newsletter(id).await.json().await.unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn patch_with_no_fields_leaves_the_record_unchanged() {
    let app = TestApp::spawn().await;
    let user = app.add_user().await;
    let created = app.create_newsletter("Untouched", "Body.", user.id).await;

    let response = app.patch_newsletter(id_of(&created), &json!({})).await;

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.expect("Response is not JSON");
    assert_eq!(body, created);
    assert!(body["edited_at"].is_null());
}

#[tokio::test]
async fn patch_returns_a_404_for_an_unknown_id() {
    let app = TestApp::spawn().await;

    let response = app
        .patch_newsletter(424242, &json!({ "title": "Updated Title" }))
        .await;

    assert_eq!(404, response.status().as_u16());
    let body: Value = response.json().await.expect("Response is not JSON");
    assert_eq!(body, json!({ "error": "Not found" }));
}

#[tokio::test]
async fn delete_removes_the_newsletter() {
    let app = TestApp::spawn().await;
    let user = app.add_user().await;
    let created = app.create_newsletter("Short lived", "Bye.", user.id).await;
    let id = id_of(&created);

    let response = app.delete_newsletter(id).await;

    assert_eq!(204, response.status().as_u16());
    assert_eq!(
        "",
        response.text().await.expect("Failed to read response body")
    );
    assert_eq!(404, app.get_newsletter(id).await.status().as_u16());
}

#[tokio::test]
async fn delete_returns_a_404_for_an_unknown_id() {
    let app = TestApp::spawn().await;

    let response = app.delete_newsletter(424242).await;

    assert_eq!(404, response.status().as_u16());
    let body: Value = response.json().await.expect("Response is not JSON");
    assert_eq!(body, json!({ "error": "Not found" }));
}
