//! tests/grid_failures.rs
//! Requests served while the grid fails or stalls.

mod common;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use social_grid_api::grid::GridResult;
use social_grid_api::models::{PersonEntity, PersonProfile, PersonQuery};
use social_grid_api::{GridError, PersonGrid};
use tokio::time::timeout;

/// Grid whose every call waits `delay` and then fails as if no node answered.
#[derive(Debug, Default)]
struct DownGrid {
    delay: Option<Duration>,
}

impl DownGrid {
    async fn fail<T>(&self) -> GridResult<T> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Err(GridError::Unreachable("127.0.0.1:6379".to_string()))
    }
}

#[async_trait]
impl PersonGrid for DownGrid {
    fn backend(&self) -> &'static str {
        "down"
    }

    async fn next_id(&self) -> GridResult<u64> {
        self.fail().await
    }

    async fn insert(&self, _id: u64, _profile: PersonProfile) -> GridResult<()> {
        self.fail().await
    }

    async fn get(&self, _id: u64) -> GridResult<Option<PersonEntity>> {
        self.fail().await
    }

    async fn get_all(&self, _ids: &BTreeSet<u64>) -> GridResult<Vec<(u64, PersonEntity)>> {
        self.fail().await
    }

    async fn scan(&self, _query: &PersonQuery) -> GridResult<Vec<(u64, PersonEntity)>> {
        self.fail().await
    }

    async fn replace(&self, _id: u64, _profile: PersonProfile) -> GridResult<Option<PersonEntity>> {
        self.fail().await
    }

    async fn remove(&self, _id: u64) -> GridResult<bool> {
        self.fail().await
    }

    async fn link(&self, _a: u64, _b: u64) -> GridResult<bool> {
        self.fail().await
    }

    async fn unlink(&self, _a: u64, _b: u64) -> GridResult<bool> {
        self.fail().await
    }

    async fn friend_ids(&self, _id: u64) -> GridResult<BTreeSet<u64>> {
        self.fail().await
    }

    async fn contains_friend(&self, _id: u64, _friend_id: u64) -> GridResult<bool> {
        self.fail().await
    }

    async fn size(&self) -> GridResult<usize> {
        self.fail().await
    }

    async fn shutdown(&self) {}
}

async fn assert_grid_failure(resp: reqwest::Response) {
    assert_eq!(resp.status(), StatusCode::NOT_IMPLEMENTED);

    let json: Value = common::envelope(resp).await;
    assert_eq!(json["status"], "NOT_IMPLEMENTED");
    assert_eq!(json["code"], 501);
    assert_eq!(json["messages"][0], "Something goes wrong");
}

#[tokio::test]
async fn reads_answer_501_when_grid_fails() {
    let base_url: String = common::spawn_app_with(Arc::new(DownGrid::default()));

    assert_grid_failure(common::get(format!("{}/users/1", base_url)).await).await;
    assert_grid_failure(common::get(format!("{}/users", base_url)).await).await;
    assert_grid_failure(common::get(format!("{}/users/1/friends", base_url)).await).await;
}

#[tokio::test]
async fn writes_answer_501_when_grid_fails() {
    let base_url: String = common::spawn_app_with(Arc::new(DownGrid::default()));

    let created: reqwest::Response = common::send_json(
        Method::POST,
        format!("{}/users", base_url),
        &json!({ "firstName": "Ada", "lastName": "Lovelace", "age": 36 }),
    )
    .await;
    assert_grid_failure(created).await;

    assert_grid_failure(common::delete(format!("{}/users/1", base_url)).await).await;
    assert_grid_failure(common::befriend(&base_url, 1, 2).await).await;
}

#[tokio::test]
async fn returns_408_when_grid_stalls() {
    let stalled: DownGrid = DownGrid {
        delay: Some(Duration::from_secs(common::TEST_TIMEOUT_SECONDS + 2)),
    };
    let base_url: String = common::spawn_app_with(Arc::new(stalled));

    let resp: reqwest::Response = timeout(
        Duration::from_secs(common::TEST_TIMEOUT_SECONDS + 4),
        common::get(format!("{}/status", base_url)),
    )
    .await
    .expect("Client timed out waiting for server.");

    assert_eq!(resp.status(), StatusCode::REQUEST_TIMEOUT);

    let json: Value = common::envelope(resp).await;
    assert_eq!(json["status"], "REQUEST_TIMEOUT");
    assert_eq!(json["code"], 408);
}
