//! services/client/src/api/graphs.rs
//!
//! The metrics/chart template. Its shape is owned by the server and rendered
//! as-is, so it stays untyped.

use astrometric_core::ports::ApiRequest;
use serde_json::Value;

use crate::error::ClientResult;
use crate::http::ApiClient;

/// GET /api/graphs/template
pub async fn template(client: &ApiClient) -> ClientResult<Value> {
    client.get_json(ApiRequest::get("/api/graphs/template")).await
}
