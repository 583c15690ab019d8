//! services/client/src/api/analyses.rs
//!
//! Analysis jobs: listing, launching, polling and fetching chart data.

use astrometric_core::ports::ApiRequest;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::api::{page_params, Page, Pagination};
use crate::error::ClientResult;
use crate::http::ApiClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Pending,
    Running,
    Done,
    Error,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Pending => "pending",
            AnalysisStatus::Running => "running",
            AnalysisStatus::Done => "done",
            AnalysisStatus::Error => "error",
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, AnalysisStatus::Done | AnalysisStatus::Error)
    }
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of job to launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    Eda,
    Predict,
    Train,
}

impl AnalysisMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "eda" => Some(AnalysisMode::Eda),
            "predict" => Some(AnalysisMode::Predict),
            "train" => Some(AnalysisMode::Train),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Analysis {
    pub id: i64,
    pub dataset_id: i64,
    pub user_id: i64,
    pub mode: String,
    pub status: AnalysisStatus,
    #[serde(default)]
    pub params: Option<Value>,
    #[serde(default)]
    pub metrics: Option<Value>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub started_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub finished_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisQuery {
    pub page: u32,
    pub per_page: u32,
    pub status: Option<AnalysisStatus>,
}

impl Default for AnalysisQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
            status: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewAnalysis {
    pub dataset_id: i64,
    pub mode: AnalysisMode,
    pub params: Value,
}

/// A single chart of an analysis' visualization payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Chart {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Visualization {
    pub charts: Vec<Chart>,
}

#[derive(Deserialize)]
struct AnalysisList {
    analyses: Vec<Analysis>,
    pagination: Pagination,
}

#[derive(Deserialize)]
struct CreatedAnalysis {
    analysis: Analysis,
}

/// GET /api/analyses
pub async fn list(client: &ApiClient, query: AnalysisQuery) -> ClientResult<Page<Analysis>> {
    let (page, per_page) = page_params(query.page, query.per_page);
    let mut request = ApiRequest::get("/api/analyses")
        .with_query("page", page)
        .with_query("per_page", per_page);
    if let Some(status) = query.status {
        request = request.with_query("status", status);
    }
    let list: AnalysisList = client.get_json(request).await?;
    Ok(Page {
        items: list.analyses,
        pagination: list.pagination,
    })
}

/// POST /api/analyses
pub async fn create(client: &ApiClient, analysis: &NewAnalysis) -> ClientResult<Analysis> {
    let created: CreatedAnalysis = client.post_json("/api/analyses", analysis).await?;
    Ok(created.analysis)
}

/// GET /api/analyses/{id}
pub async fn get(client: &ApiClient, analysis_id: i64) -> ClientResult<Analysis> {
    client
        .get_json(ApiRequest::get(format!("/api/analyses/{analysis_id}")))
        .await
}

/// GET /api/analyses/{id}/viz
pub async fn visualization(client: &ApiClient, analysis_id: i64) -> ClientResult<Visualization> {
    client
        .get_json(ApiRequest::get(format!("/api/analyses/{analysis_id}/viz")))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_analysis_serializes_lowercase_mode() {
        let body = serde_json::to_value(NewAnalysis {
            dataset_id: 9,
            mode: AnalysisMode::Predict,
            params: serde_json::json!({"target": "koi_disposition"}),
        })
        .unwrap();
        assert_eq!(body["mode"], "predict");
        assert_eq!(body["params"]["target"], "koi_disposition");
    }

    #[test]
    fn visualization_chart_type_is_renamed() {
        let viz: Visualization = serde_json::from_str(
            r#"{"charts":[{"type":"histogram","title":"Distribution of Values","data":{"bins":[0,1]}}]}"#,
        )
        .unwrap();
        assert_eq!(viz.charts[0].kind, "histogram");
    }

    #[test]
    fn mode_and_status_helpers() {
        assert_eq!(AnalysisMode::parse("EDA"), Some(AnalysisMode::Eda));
        assert_eq!(AnalysisMode::parse("cluster"), None);
        assert!(AnalysisStatus::Error.is_finished());
        assert!(!AnalysisStatus::Running.is_finished());
        assert_eq!(AnalysisStatus::Done.to_string(), "done");
    }
}
