//! Integration tests for the posters storage contract (poster-server).

mod common;

use std::sync::Arc;

use common::server::TestServer;
use poster_core::PosterStore;
use poster_server::{AppState, LocalStorage};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const IMAGE: &str = "data:image/png;base64,iVBORw0KGgo=";

async fn body(response: reqwest::Response) -> (StatusCode, Value) {
    let status = response.status();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    (status, response.json().await.expect("json body"))
}

#[tokio::test]
async fn empty_gallery_lists_nothing() {
    let server = TestServer::start().await;
    let (status, json) = body(
        Client::new()
            .get(server.posters_url())
            .send()
            .await
            .expect("request"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({ "posters": [] }));
    server.shutdown().await;
}

#[tokio::test]
async fn posters_are_listed_newest_first() {
    let server = TestServer::start().await;
    let client = Client::new();

    for timestamp in [10, 30, 20] {
        let (status, json) = body(
            client
                .post(server.posters_url())
                .json(&json!({ "dataURL": IMAGE, "editor": "rombi", "timestamp": timestamp }))
                .send()
                .await
                .expect("request"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["id"].as_str().is_some_and(|id| !id.is_empty()));
    }

    let (_, json) = body(client.get(server.posters_url()).send().await.expect("list")).await;
    let timestamps: Vec<u64> = json["posters"]
        .as_array()
        .expect("array")
        .iter()
        .map(|p| p["timestamp"].as_u64().expect("timestamp"))
        .collect();
    assert_eq!(timestamps, vec![30, 20, 10]);
    server.shutdown().await;
}

#[tokio::test]
async fn uploads_get_defaults() {
    let server = TestServer::start().await;
    let client = Client::new();
    client
        .post(server.posters_url())
        .json(&json!({ "dataURL": IMAGE }))
        .send()
        .await
        .expect("save");

    let (_, json) = body(client.get(server.posters_url()).send().await.expect("list")).await;
    let poster = &json["posters"][0];
    assert_eq!(poster["editor"], "unknown");
    assert_eq!(poster["seed"], Value::Null);
    assert_eq!(poster["width"], 1000);
    assert_eq!(poster["height"], 1500);
    let timestamp = poster["timestamp"].as_u64().expect("timestamp");
    assert_eq!(poster["filename"], format!("poster-{timestamp}.png"));
    assert_eq!(poster["dataURL"], IMAGE);
    server.shutdown().await;
}

#[tokio::test]
async fn missing_fields_are_bad_requests() {
    let server = TestServer::start().await;
    let client = Client::new();

    let (status, json) = body(
        client
            .post(server.posters_url())
            .json(&json!({ "editor": "sand" }))
            .send()
            .await
            .expect("post"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json, json!({ "error": "Missing dataURL" }));

    // An empty body is an empty object.
    let (status, json) = body(
        client
            .post(server.posters_url())
            .send()
            .await
            .expect("post"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Missing dataURL");

    let (status, json) = body(
        client
            .delete(server.posters_url())
            .json(&json!({}))
            .send()
            .await
            .expect("delete"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json, json!({ "error": "Missing id" }));
    server.shutdown().await;
}

#[tokio::test]
async fn invalid_json_is_rejected() {
    let server = TestServer::start().await;
    let (status, json) = body(
        Client::new()
            .post(server.posters_url())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body("{\"dataURL\": ")
            .send()
            .await
            .expect("post"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json, json!({ "error": "Invalid JSON body" }));
    server.shutdown().await;
}

#[tokio::test]
async fn delete_removes_the_poster() {
    let server = TestServer::start().await;
    let client = Client::new();
    let (_, saved) = body(
        client
            .post(server.posters_url())
            .json(&json!({ "dataURL": IMAGE }))
            .send()
            .await
            .expect("save"),
    )
    .await;

    let (status, json) = body(
        client
            .delete(server.posters_url())
            .json(&json!({ "id": saved["id"] }))
            .send()
            .await
            .expect("delete"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({ "ok": true }));

    // Unknown ids are not an error.
    let (status, _) = body(
        client
            .delete(server.posters_url())
            .json(&json!({ "id": "never-saved" }))
            .send()
            .await
            .expect("delete"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = body(client.get(server.posters_url()).send().await.expect("list")).await;
    assert_eq!(json["posters"], json!([]));
    server.shutdown().await;
}

#[tokio::test]
async fn options_and_other_methods() {
    let server = TestServer::start().await;
    let client = Client::new();

    let (status, json) = body(
        client
            .request(reqwest::Method::OPTIONS, server.posters_url())
            .send()
            .await
            .expect("options"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({ "ok": true }));

    let (status, json) = body(
        client
            .put(server.posters_url())
            .json(&json!({ "dataURL": IMAGE }))
            .send()
            .await
            .expect("put"),
    )
    .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(json, json!({ "error": "Method not allowed" }));
    server.shutdown().await;
}

#[tokio::test]
async fn netlify_alias_shares_the_store() {
    let server = TestServer::start().await;
    let client = Client::new();
    client
        .post(server.url("/.netlify/functions/posters"))
        .json(&json!({ "dataURL": IMAGE, "seed": 0 }))
        .send()
        .await
        .expect("save");

    let (_, json) = body(client.get(server.posters_url()).send().await.expect("list")).await;
    assert_eq!(json["posters"][0]["seed"], 0);
    server.shutdown().await;
}

#[tokio::test]
async fn retained_count_is_capped() {
    let store = PosterStore::new().with_max_posters(2);
    let server = TestServer::start_with(AppState::new(Arc::new(LocalStorage::new(store)))).await;
    let client = Client::new();

    for (timestamp, editor) in [(1, "first"), (2, "second"), (3, "third")] {
        client
            .post(server.posters_url())
            .json(&json!({ "dataURL": IMAGE, "editor": editor, "timestamp": timestamp }))
            .send()
            .await
            .expect("save");
    }

    let (_, json) = body(client.get(server.posters_url()).send().await.expect("list")).await;
    let editors: Vec<&str> = json["posters"]
        .as_array()
        .expect("array")
        .iter()
        .map(|p| p["editor"].as_str().expect("editor"))
        .collect();
    assert_eq!(editors, vec!["third", "second"]);
    server.shutdown().await;
}

#[tokio::test]
async fn storage_failures_are_generic_server_errors() {
    // Nothing listens on the remote, so every call fails.
    let port = portpicker::pick_unused_port().expect("port");
    let remote = poster_server::RemoteStorage::new(format!("http://127.0.0.1:{port}"))
        .expect("client");
    let server = TestServer::start_with(AppState::new(Arc::new(remote))).await;

    let (status, json) = body(
        Client::new()
            .get(server.posters_url())
            .send()
            .await
            .expect("list"),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json, json!({ "error": "Server error" }));

    let health = Client::new()
        .get(server.url("/health/ready"))
        .send()
        .await
        .expect("health");
    assert_eq!(health.status(), StatusCode::SERVICE_UNAVAILABLE);
    server.shutdown().await;
}

#[tokio::test]
async fn health_probes() {
    let server = TestServer::start().await;
    let client = Client::new();
    let live = client.get(server.url("/health/live")).send().await.expect("live");
    assert_eq!(live.status(), StatusCode::OK);

    let ready = client.get(server.url("/health")).send().await.expect("ready");
    assert_eq!(ready.status(), StatusCode::OK);
    assert!(ready.headers().contains_key("x-request-id"));
    let json: Value = ready.json().await.expect("json");
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["checks"]["storage"], true);
    server.shutdown().await;
}
