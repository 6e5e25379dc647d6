//! tests/common/mod.rs
//! A shared test helper to spawn the app on an ephemeral port, by default over an in-memory grid.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::{serve, Router};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use social_grid_api::{create_app, AppState, EnvironmentVariables, MemoryGrid, PersonGrid};
use tokio::net::TcpListener as TokioTcpListener;

/// Body limit used by the test server, small enough to trip cheaply.
pub const TEST_BODY_LIMIT: usize = 4096;

/// Request timeout of the test server, in seconds.
pub const TEST_TIMEOUT_SECONDS: u64 = 1;

/// Spawns the app on a random unused port and returns its base URL.
pub fn spawn_app() -> String {
    spawn_app_with(Arc::new(MemoryGrid::new()))
}

/// Same as [`spawn_app`], over the given grid.
pub fn spawn_app_with(grid: Arc<dyn PersonGrid>) -> String {
    let vars: HashMap<String, String> = HashMap::from([
        ("ENVIRONMENT".to_string(), "test".to_string()),
        ("MAX_REQUEST_BODY_SIZE".to_string(), TEST_BODY_LIMIT.to_string()),
        ("DEFAULT_TIMEOUT_SECONDS".to_string(), TEST_TIMEOUT_SECONDS.to_string()),
    ]);
    let env: EnvironmentVariables =
        EnvironmentVariables::from_vars(&vars).expect("Failed to build test environment");

    let app: Router = create_app(AppState::new(env, grid));

    // * Bind an ephemeral port using std::net::TcpListener.
    let std_listener: std::net::TcpListener = std::net::TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind random port");
    std_listener.set_nonblocking(true).unwrap();

    let tokio_listener: TokioTcpListener = TokioTcpListener::from_std(std_listener)
        .expect("Failed to convert to tokio listener");

    let addr: std::net::SocketAddr = tokio_listener.local_addr().unwrap();

    tokio::spawn(async move {
        serve(tokio_listener, app)
            .await
            .expect("Server failed");
    });

    format!("http://{}", addr)
}

/// Sends `body` as JSON with the given method and returns the raw response.
pub async fn send_json(method: reqwest::Method, url: String, body: &Value) -> reqwest::Response {
    reqwest::Client::new()
        .request(method, url)
        .header(CONTENT_TYPE, "application/json")
        .header(ACCEPT, "application/json")
        .body(serde_json::to_vec(body).unwrap())
        .send()
        .await
        .expect("Failed to execute request.")
}

pub async fn get(url: String) -> reqwest::Response {
    reqwest::Client::new()
        .get(url)
        .header(ACCEPT, "application/json")
        .send()
        .await
        .expect("Failed to execute request.")
}

pub async fn delete(url: String) -> reqwest::Response {
    reqwest::Client::new()
        .delete(url)
        .send()
        .await
        .expect("Failed to execute request.")
}

/// Parses the response envelope.
pub async fn envelope(resp: reqwest::Response) -> Value {
    let body: String = resp.text().await.unwrap();
    serde_json::from_str(&body).unwrap()
}

/// Creates a user and returns its id.
pub async fn create_user(base_url: &str, first: &str, last: &str, age: u32) -> u64 {
    let resp: reqwest::Response = send_json(
        reqwest::Method::POST,
        format!("{}/users", base_url),
        &serde_json::json!({ "firstName": first, "lastName": last, "age": age, "gender": "FEMALE" }),
    )
    .await;
    assert_eq!(resp.status(), reqwest::StatusCode::CREATED);

    envelope(resp).await["data"]["id"].as_u64().unwrap()
}

/// Makes two users friends.
pub async fn befriend(base_url: &str, user_id: u64, friend_id: u64) -> reqwest::Response {
    send_json(
        reqwest::Method::POST,
        format!("{}/users/{}/friends", base_url, user_id),
        &serde_json::json!({ "id": friend_id }),
    )
    .await
}
