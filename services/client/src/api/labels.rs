//! services/client/src/api/labels.rs
//!
//! Row-level labels attached to a dataset.

use astrometric_core::ports::ApiRequest;
use serde::{Deserialize, Serialize};

use crate::api::MessageResponse;
use crate::error::ClientResult;
use crate::http::ApiClient;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Label {
    #[serde(default)]
    pub id: Option<i64>,
    pub dataset_id: i64,
    pub row_id: i64,
    pub label: String,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelItem {
    pub row_id: i64,
    pub label: String,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl LabelItem {
    pub fn new(row_id: i64, label: impl Into<String>) -> Self {
        Self {
            row_id,
            label: label.into(),
            confidence: 1.0,
            notes: None,
        }
    }
}

#[derive(Serialize)]
struct LabelBatch<'a> {
    dataset_id: i64,
    items: &'a [LabelItem],
}

#[derive(Deserialize)]
struct LabelList {
    labels: Vec<Label>,
}

/// GET /api/labels
pub async fn list(client: &ApiClient, dataset_id: Option<i64>) -> ClientResult<Vec<Label>> {
    let mut request = ApiRequest::get("/api/labels");
    if let Some(dataset_id) = dataset_id {
        request = request.with_query("dataset_id", dataset_id);
    }
    let list: LabelList = client.get_json(request).await?;
    Ok(list.labels)
}

/// POST /api/labels/batch
pub async fn create_batch(
    client: &ApiClient,
    dataset_id: i64,
    items: &[LabelItem],
) -> ClientResult<MessageResponse> {
    client
        .post_json("/api/labels/batch", &LabelBatch { dataset_id, items })
        .await
}
