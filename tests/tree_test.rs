//! End-to-end tree behavior through the HTTP surface.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;

use helpers::TestApp;

fn path_ids(dir: &serde_json::Value) -> Vec<String> {
    dir["path"]
        .as_array()
        .expect("path is an array")
        .iter()
        .map(|p| p["id"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn docs_archive_scenario() {
    let app = TestApp::new();
    app.spawn_coordinator("");
    let token = app.token("u1");
    let t = Some(token.as_str());

    let root = app.request("GET", "/directory", None, t).await;
    let root_id = root.str("id");

    let docs = app
        .request("POST", "/directory", Some(json!({ "parent_directory_id": root_id, "name": "docs" })), t)
        .await;
    let docs_id = docs.str("id");
    assert_eq!(path_ids(docs.data()), vec![root_id.clone()]);

    let file = app
        .request(
            "POST",
            "/file",
            Some(json!({ "parent_directory_id": docs_id, "name": "a", "extension": "txt", "size": 50 })),
            t,
        )
        .await;
    assert_eq!(file.data()["host"], helpers::NODE_HOST);
    let file_id = file.data()["file"]["id"].as_str().unwrap().to_string();

    let docs = app.request("GET", &format!("/directory/{docs_id}"), None, t).await;
    assert_eq!(docs.data()["size"], 50);
    let root = app.request("GET", "/directory", None, t).await;
    assert_eq!(root.data()["size"], 50);

    let archive = app
        .request("POST", "/directory", Some(json!({ "parent_directory_id": root_id, "name": "archive" })), t)
        .await;
    let archive_id = archive.str("id");

    let moved = app
        .request("PATCH", &format!("/directory/{docs_id}/move?to={archive_id}"), None, t)
        .await;
    assert_eq!(path_ids(moved.data()), vec![root_id.clone(), archive_id.clone()]);

    let root = app.request("GET", "/directory", None, t).await;
    assert_eq!(root.data()["size"], 50);
    let archive = app.request("GET", &format!("/directory/{archive_id}"), None, t).await;
    assert_eq!(archive.data()["size"], 50);
    assert_eq!(archive.data()["directories"][0]["id"], docs_id.as_str());

    let deleted = app.request("DELETE", &format!("/file/{file_id}"), None, t).await;
    assert_eq!(deleted.status, StatusCode::OK);

    let docs = app.request("GET", &format!("/directory/{docs_id}"), None, t).await;
    assert_eq!(docs.data()["size"], 0);
    assert_eq!(docs.data()["files_count"], 0);
    let root = app.request("GET", "/directory", None, t).await;
    assert_eq!(root.data()["size"], 0);
}

#[tokio::test]
async fn directory_delete_sweeps_descendants_and_releases_bytes() {
    let app = TestApp::new();
    app.spawn_coordinator("");
    let token = app.token("u1");
    let t = Some(token.as_str());

    let root_id = app.request("GET", "/directory", None, t).await.str("id");
    let x = app
        .request("POST", "/directory", Some(json!({ "parent_directory_id": root_id, "name": "x" })), t)
        .await
        .str("id");
    let y = app
        .request("POST", "/directory", Some(json!({ "parent_directory_id": x, "name": "y" })), t)
        .await
        .str("id");
    for (parent, name) in [(&x, "one"), (&y, "two")] {
        let created = app
            .request(
                "POST",
                "/file",
                Some(json!({ "parent_directory_id": parent, "name": name, "extension": "bin", "size": 10 })),
                t,
            )
            .await;
        assert_eq!(created.status, StatusCode::OK);
    }
    assert_eq!(app.store.file_count(), 2);

    let deleted = app.request("DELETE", &format!("/directory/{x}"), None, t).await;
    assert_eq!(deleted.status, StatusCode::OK);

    let root = app.request("GET", "/directory", None, t).await;
    assert_eq!(root.data()["size"], 0);
    assert_eq!(root.data()["directories_count"], 0);

    assert!(
        TestApp::eventually(|| app.store.file_count() == 0 && app.store.directory_count() == 1)
            .await,
        "sweep did not remove the subtree"
    );
    let releases = || {
        app.answered
            .lock()
            .iter()
            .filter(|op| **op == stratum_broker::Operation::Delete)
            .count()
    };
    assert!(TestApp::eventually(|| releases() == 2).await, "bytes were not released");

    let gone = app.request("GET", &format!("/directory/{y}"), None, t).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rename_rewrites_descendant_paths() {
    let app = TestApp::new();
    let token = app.token("u1");
    let t = Some(token.as_str());

    let root_id = app.request("GET", "/directory", None, t).await.str("id");
    let a = app
        .request("POST", "/directory", Some(json!({ "parent_directory_id": root_id, "name": "a" })), t)
        .await
        .str("id");
    let b = app
        .request("POST", "/directory", Some(json!({ "parent_directory_id": a, "name": "b" })), t)
        .await
        .str("id");

    let renamed = app
        .request("PATCH", &format!("/directory/{a}/rename?name=alpha"), None, t)
        .await;
    assert_eq!(renamed.data()["name"], "alpha");

    let b = app.request("GET", &format!("/directory/{b}"), None, t).await;
    assert_eq!(b.data()["path"][1]["name"], "alpha");
    let root = app.request("GET", "/directory", None, t).await;
    assert_eq!(root.data()["directories"][0]["name"], "alpha");
}

#[tokio::test]
async fn star_twice_restores_and_share_is_mirrored() {
    let app = TestApp::new();
    let token = app.token("u1");
    let t = Some(token.as_str());

    let root_id = app.request("GET", "/directory", None, t).await.str("id");
    let a = app
        .request("POST", "/directory", Some(json!({ "parent_directory_id": root_id, "name": "a" })), t)
        .await
        .str("id");

    let once = app.request("PATCH", &format!("/directory/{a}/star"), None, t).await;
    assert_eq!(once.data()["starred"], true);
    let twice = app.request("PATCH", &format!("/directory/{a}/star"), None, t).await;
    assert_eq!(twice.data()["starred"], false);

    app.request("PATCH", &format!("/directory/{a}/share?public=true"), None, t)
        .await
        .data();
    let root = app.request("GET", "/directory", None, t).await;
    assert_eq!(root.data()["directories"][0]["public"], true);
    assert_eq!(root.data()["directories"][0]["starred"], false);
}

#[tokio::test]
async fn search_filters_by_extension_and_pages() {
    let app = TestApp::new();
    app.spawn_coordinator("");
    let token = app.token("u1");
    let t = Some(token.as_str());

    let root_id = app.request("GET", "/directory", None, t).await.str("id");
    for (name, ext) in [("a", "txt"), ("b", "pdf"), ("c", "txt")] {
        app.request(
            "POST",
            "/file",
            Some(json!({ "parent_directory_id": root_id, "name": name, "extension": ext, "size": 1 })),
            t,
        )
        .await
        .data();
    }

    let found = app
        .request("GET", "/directory/search?extensions=txt&limit=1&sort_by=name&sort_dir=desc", None, t)
        .await;
    let data = found.data();
    assert_eq!(data["files_count"], 2);
    assert_eq!(data["files"].as_array().unwrap().len(), 1);
    assert_eq!(data["files"][0]["name"], "c");
    assert_eq!(data["directories_count"], 0);

    let other = app.token("u2");
    let theirs = app
        .request("GET", "/directory/search", None, Some(other.as_str()))
        .await;
    assert_eq!(theirs.data()["files_count"], 0);
}

#[tokio::test]
async fn moving_into_a_descendant_is_rejected() {
    let app = TestApp::new();
    let token = app.token("u1");
    let t = Some(token.as_str());

    let root_id = app.request("GET", "/directory", None, t).await.str("id");
    let a = app
        .request("POST", "/directory", Some(json!({ "parent_directory_id": root_id, "name": "a" })), t)
        .await
        .str("id");
    let b = app
        .request("POST", "/directory", Some(json!({ "parent_directory_id": a, "name": "b" })), t)
        .await
        .str("id");

    let rejected = app
        .request("PATCH", &format!("/directory/{a}/move?to={b}"), None, t)
        .await;
    assert_eq!(rejected.status, StatusCode::BAD_REQUEST);

    let root_move = app
        .request("PATCH", &format!("/directory/{root_id}/move?to={a}"), None, t)
        .await;
    assert_eq!(root_move.status, StatusCode::BAD_REQUEST);
}
