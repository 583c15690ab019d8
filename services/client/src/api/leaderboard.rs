//! services/client/src/api/leaderboard.rs
//!
//! Ranked results per metric.

use astrometric_core::ports::ApiRequest;
use serde::Deserialize;
use serde_json::Value;

use crate::api::{MessageResponse, MAX_PER_PAGE};
use crate::error::ClientResult;
use crate::http::ApiClient;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LeaderboardUser {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LeaderboardEntry {
    pub id: i64,
    #[serde(default)]
    pub run_id: Option<i64>,
    #[serde(default)]
    pub dataset_id: Option<i64>,
    pub metric: String,
    pub value: f64,
    pub rank: u32,
    #[serde(default)]
    pub user: Option<LeaderboardUser>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardQuery {
    pub metric: String,
    pub scope: String,
    pub limit: u32,
}

impl Default for LeaderboardQuery {
    fn default() -> Self {
        Self {
            metric: "accuracy".to_string(),
            scope: "global".to_string(),
            limit: MAX_PER_PAGE,
        }
    }
}

#[derive(Deserialize)]
struct EntryList {
    entries: Vec<LeaderboardEntry>,
}

/// GET /api/leaderboard
pub async fn entries(
    client: &ApiClient,
    query: &LeaderboardQuery,
) -> ClientResult<Vec<LeaderboardEntry>> {
    let request = ApiRequest::get("/api/leaderboard")
        .with_query("metric", &query.metric)
        .with_query("scope", &query.scope)
        .with_query("limit", query.limit.clamp(1, MAX_PER_PAGE));
    let list: EntryList = client.get_json(request).await?;
    Ok(list.entries)
}

/// POST /api/leaderboard/submit
pub async fn submit(client: &ApiClient, submission: &Value) -> ClientResult<MessageResponse> {
    client.post_json("/api/leaderboard/submit", submission).await
}
