//! HTTP surface: authentication, error mapping, probes.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;

use helpers::TestApp;

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let app = TestApp::new();

    let res = app.request("GET", "/directory", None, None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["error"], "UNAUTHORIZED");
}

#[tokio::test]
async fn forged_token_is_unauthorized() {
    let app = TestApp::new();
    let forged = jsonwebtoken::encode(
        &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS512),
        &json!({ "id": "u1", "exp": chrono::Utc::now().timestamp() + 60 }),
        &jsonwebtoken::EncodingKey::from_secret(b"not-the-secret"),
    )
    .unwrap();

    let res = app.request("GET", "/directory", None, Some(&forged)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn private_directory_of_another_user_is_wrong_user() {
    let app = TestApp::new();
    let owner = app.token("u1");
    let other = app.token("u2");

    let root_id = app
        .request("GET", "/directory", None, Some(&owner))
        .await
        .str("id");

    let res = app
        .request("GET", &format!("/directory/{root_id}"), None, Some(&other))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["error"], "VALIDATION_ERROR");
    assert_eq!(res.body["message"], "wrong user");

    let res = app
        .request(
            "POST",
            "/directory",
            Some(json!({ "parent_directory_id": root_id, "name": "intruder" })),
            Some(&other),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["message"], "wrong user");
}

#[tokio::test]
async fn missing_and_malformed_ids() {
    let app = TestApp::new();
    let token = app.token("u1");

    let res = app
        .request("GET", "/directory/000000000000000000000000", None, Some(&token))
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app
        .request("GET", "/directory/not-an-id", None, Some(&token))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn root_cannot_be_deleted() {
    let app = TestApp::new();
    let token = app.token("u1");
    let root_id = app
        .request("GET", "/directory", None, Some(&token))
        .await
        .str("id");

    let res = app
        .request("DELETE", &format!("/directory/{root_id}"), None, Some(&token))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn children_page_sorted_and_sliced() {
    let app = TestApp::new();
    let token = app.token("u1");
    let t = Some(token.as_str());
    let root_id = app.request("GET", "/directory", None, t).await.str("id");
    for name in ["b", "c", "a"] {
        app.request("POST", "/directory", Some(json!({ "parent_directory_id": root_id, "name": name })), t)
            .await
            .data();
    }

    let page = app
        .request("GET", "/directory?offset=1&limit=1&sort_by=name&sort_dir=desc", None, t)
        .await;
    let dirs = page.data()["directories"].as_array().unwrap().clone();
    assert_eq!(dirs.len(), 1);
    assert_eq!(dirs[0]["name"], "b");
    assert_eq!(page.data()["directories_count"], 3);

    let bad = app
        .request("GET", "/directory?sort_by=colour", None, t)
        .await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn probes_answer() {
    let app = TestApp::new();

    let live = app.request("GET", "/live", None, None).await;
    assert_eq!(live.status, StatusCode::OK);
    assert_eq!(live.body["data"]["status"], "ok");

    let ready = app.request("GET", "/ready", None, None).await;
    assert_eq!(ready.status, StatusCode::OK);
}
