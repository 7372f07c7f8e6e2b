use serde_json::{json, Value};

use crate::helpers::TestApp;

#[tokio::test]
async fn get_user_returns_the_user_with_their_newsletters() {
    let app = TestApp::spawn().await;
    let user = app.add_user().await;
    let other = app.add_user().await;
    let first = app.create_newsletter("First issue", "One.", user.id).await;
    let second = app.create_newsletter("Second issue", "Two.", user.id).await;
    app.create_newsletter("Not theirs", "Three.", other.id).await;

    let response = app.get_user(user.id).await;

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.expect("Response is not JSON");
    assert_eq!(body["id"], user.id);
    assert_eq!(body["username"], user.username);

    let newsletters = body["newsletters"]
        .as_array()
        .expect("newsletters is not an array");
    assert_eq!(newsletters.len(), 2);
    assert_eq!(newsletters[0]["id"], first["id"]);
    assert_eq!(newsletters[1]["id"], second["id"]);
    for newsletter in newsletters {
        assert!(newsletter.get("user").is_none());
        assert_eq!(newsletter["user_id"], user.id);
    }
}

#[tokio::test]
async fn get_user_without_newsletters_has_an_empty_list() {
    let app = TestApp::spawn().await;
    let user = app.add_user().await;

    let body: Value = app.get_user(user.id).await.json().await.unwrap();

    assert_eq!(
        body,
        json!({ "id": user.id, "username": user.username, "newsletters": [] })
    );
}

#[tokio::test]
async fn get_user_returns_a_404_for_an_unknown_id() {
    let app = TestApp::spawn().await;

    let response = app.get_user(999999).await;

    assert_eq!(404, response.status().as_u16());
    let body: Value = response.json().await.expect("Response is not JSON");
    assert_eq!(body, json!({ "error": "User not found" }));
}
