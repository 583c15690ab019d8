//! services/client/src/api/datasets.rs
//!
//! Dataset listing, upload and deletion.

use astrometric_core::ports::ApiRequest;
use bytes::Bytes;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::api::{page_params, MessageResponse, Page, Pagination};
use crate::error::{ClientError, ClientResult};
use crate::http::ApiClient;

/// File types the server will ingest.
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["csv", "json", "jsonl"];

const ERROR_REPORT_PATH: &str = "/api/datasets/error-report";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Dataset {
    pub id: i64,
    pub filename: String,
    #[serde(default)]
    pub size_bytes: Option<u64>,
    #[serde(default)]
    pub rows: Option<u64>,
    #[serde(default)]
    pub cols: Option<u64>,
    #[serde(default)]
    pub is_public: bool,
    pub user_id: i64,
    #[serde(default)]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetQuery {
    pub page: u32,
    pub per_page: u32,
    /// Include other users' public datasets alongside the caller's own.
    pub show_public: bool,
}

impl Default for DatasetQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
            show_public: true,
        }
    }
}

#[derive(Deserialize)]
struct DatasetList {
    datasets: Vec<Dataset>,
    pagination: Pagination,
}

/// The abbreviated dataset record an upload answers with.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadedDataset {
    pub id: i64,
    pub filename: String,
    #[serde(default)]
    pub rows: Option<u64>,
    #[serde(default)]
    pub cols: Option<u64>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub size_bytes: Option<u64>,
}

/// One finding of the server's CSV checks.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ValidationIssue {
    /// 1-based line in the file; 0 when the issue concerns the whole file.
    #[serde(default)]
    pub line: u64,
    #[serde(default)]
    pub column: Value,
    pub error: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub severity: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ValidationSummary {
    #[serde(default)]
    pub total_rows: Option<u64>,
    #[serde(default)]
    pub total_columns: Option<u64>,
    #[serde(default)]
    pub encoding_used: Option<String>,
    #[serde(default)]
    pub file_size_bytes: Option<u64>,
    #[serde(default)]
    pub missing_values: Option<u64>,
    #[serde(default)]
    pub duplicate_rows: Option<u64>,
}

/// CSV validation results. The server trims `errors` to 3 and `warnings` to 5.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadValidation {
    pub valid: bool,
    #[serde(default)]
    pub errors: Vec<ValidationIssue>,
    #[serde(default)]
    pub warnings: Vec<ValidationIssue>,
    #[serde(default)]
    pub summary: ValidationSummary,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadOutcome {
    pub dataset: UploadedDataset,
    /// Present for CSV uploads only.
    #[serde(default)]
    pub validation: Option<UploadValidation>,
}

#[derive(Deserialize)]
struct ValidationRejection {
    validation: UploadValidation,
    #[serde(default)]
    error_report_url: Option<String>,
}

pub fn is_supported_file(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .map(|(stem, ext)| {
            !stem.is_empty() && SUPPORTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
        })
        .unwrap_or(false)
}

/// GET /api/datasets
pub async fn list(client: &ApiClient, query: DatasetQuery) -> ClientResult<Page<Dataset>> {
    let (page, per_page) = page_params(query.page, query.per_page);
    let request = ApiRequest::get("/api/datasets")
        .with_query("page", page)
        .with_query("per_page", per_page)
        .with_query("show_public", query.show_public);
    let list: DatasetList = client.get_json(request).await?;
    Ok(Page {
        items: list.datasets,
        pagination: list.pagination,
    })
}

/// POST /api/datasets/upload
///
/// Unsupported file types are refused locally, before any bytes are sent.
/// A CSV the server rejects comes back as `ClientError::ValidationFailed`.
pub async fn upload(
    client: &ApiClient,
    file_name: &str,
    content: Bytes,
    is_public: bool,
) -> ClientResult<UploadOutcome> {
    if !is_supported_file(file_name) {
        return Err(ClientError::InvalidInput(format!(
            "'{file_name}' is not a CSV, JSON or JSONL file"
        )));
    }
    client
        .upload(
            "/api/datasets/upload",
            "file",
            file_name,
            content,
            vec![("is_public".to_string(), is_public.to_string())],
        )
        .await
        .map_err(into_validation_failure)
}

fn into_validation_failure(err: ClientError) -> ClientError {
    match err {
        ClientError::Api {
            status: 422,
            message,
            body,
        } => match serde_json::from_slice::<ValidationRejection>(&body) {
            Ok(rejection) => ClientError::ValidationFailed {
                message: message.unwrap_or_else(|| "CSV validation failed".to_string()),
                validation: Box::new(rejection.validation),
                report_url: rejection.error_report_url,
            },
            Err(e) => {
                warn!(error = %e, "422 upload response without validation detail");
                ClientError::Api {
                    status: 422,
                    message,
                    body,
                }
            }
        },
        other => other,
    }
}

/// GET /api/datasets/error-report/{name}
///
/// Accepts either the `report_url` of a failed upload or the bare report file name.
pub async fn error_report(client: &ApiClient, report: &str) -> ClientResult<Bytes> {
    let path = if report.starts_with('/') {
        report.to_string()
    } else {
        format!("{ERROR_REPORT_PATH}/{report}")
    };
    let response = client.send(ApiRequest::get(path)).await?;
    Ok(response.body)
}

/// DELETE /api/datasets/{id}
pub async fn delete(client: &ApiClient, dataset_id: i64) -> ClientResult<MessageResponse> {
    client
        .delete_json(&format!("/api/datasets/{dataset_id}"))
        .await
}
