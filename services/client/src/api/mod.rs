//! services/client/src/api/mod.rs
//!
//! Typed wrappers over the REST endpoints. Every call goes through `ApiClient`,
//! so all of them share token attachment, refresh and error surfacing.

pub mod analyses;
pub mod auth;
pub mod datasets;
pub mod graphs;
pub mod labels;
pub mod leaderboard;
pub mod models;

use astrometric_core::ports::ApiRequest;
use serde::Deserialize;

use crate::error::ClientResult;
use crate::http::ApiClient;

/// The server caps page sizes at this value.
pub const MAX_PER_PAGE: u32 = 100;

//=========================================================================================
// Shared Payloads
//=========================================================================================

/// Paging metadata attached to every list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub pages: u32,
}

impl Pagination {
    pub fn has_next(&self) -> bool {
        self.page < self.pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

/// The `{"message": ...}` acknowledgement most mutating endpoints answer with.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

/// Pages are 1-based and sized 1..=100.
pub(crate) fn page_params(page: u32, per_page: u32) -> (u32, u32) {
    (page.max(1), per_page.clamp(1, MAX_PER_PAGE))
}

/// GET /api/health
pub async fn health(client: &ApiClient) -> ClientResult<HealthStatus> {
    client.get_json(ApiRequest::get("/api/health")).await
}
