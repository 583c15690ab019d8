//! services/client/src/api/models.rs
//!
//! Published models and training requests.

use astrometric_core::ports::ApiRequest;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::{page_params, Page, Pagination};
use crate::error::ClientResult;
use crate::http::ApiClient;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelInfo {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub model_type: Option<String>,
    #[serde(default)]
    pub algorithm: Option<String>,
    #[serde(default)]
    pub metrics: Option<Value>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub dataset_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainRequest {
    pub name: String,
    pub dataset_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Deserialize)]
struct ModelList {
    models: Vec<ModelInfo>,
    pagination: Pagination,
}

#[derive(Deserialize)]
struct TrainResponse {
    model: ModelInfo,
}

/// GET /api/models
pub async fn list(client: &ApiClient, page: u32, per_page: u32) -> ClientResult<Page<ModelInfo>> {
    let (page, per_page) = page_params(page, per_page);
    let request = ApiRequest::get("/api/models")
        .with_query("page", page)
        .with_query("per_page", per_page);
    let list: ModelList = client.get_json(request).await?;
    Ok(Page {
        items: list.models,
        pagination: list.pagination,
    })
}

/// POST /api/models/train
pub async fn train(client: &ApiClient, request: &TrainRequest) -> ClientResult<ModelInfo> {
    let response: TrainResponse = client.post_json("/api/models/train", request).await?;
    Ok(response.model)
}
