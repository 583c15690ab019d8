//! services/client/src/adapters/reqwest_transport.rs
//!
//! This module contains the HTTP adapter, the concrete implementation of the
//! `HttpTransport` port. It resolves request paths against the configured base
//! address and enforces the fixed request timeout.

use astrometric_core::ports::{
    ApiRequest, ApiResponse, HttpMethod, HttpTransport, RequestBody, TransportError,
};
use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method};
use std::time::Duration;
use tracing::debug;

use crate::config::REQUEST_TIMEOUT;
use crate::error::{ClientError, ClientResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Creates a transport for `base_url` (e.g. `http://localhost:5000`).
    pub fn new(base_url: impl Into<String>) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: REQUEST_TIMEOUT,
        })
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn map_error(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else {
            TransportError::Network(e.to_string())
        }
    }
}

fn method_of(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
    }
}

//=========================================================================================
// `HttpTransport` Trait Implementation
//=========================================================================================

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self.url_for(&request.path);
        debug!(method = %request.method, %url, authenticated = request.bearer.is_some(), "Dispatching request");

        let mut builder = self
            .client
            .request(method_of(request.method), &url)
            .query(&request.query);

        if let Some(token) = &request.bearer {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| TransportError::Network(format!("invalid bearer token: {e}")))?;
            builder = builder.header(AUTHORIZATION, value);
        }

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(bytes) => builder
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(bytes),
            RequestBody::Multipart {
                field,
                file_name,
                content,
                fields,
            } => {
                let mut form = Form::new().part(field, Part::bytes(content.to_vec()).file_name(file_name));
                for (key, value) in fields {
                    form = form.text(key, value);
                }
                builder.multipart(form)
            }
        };

        let response = builder.send().await.map_err(|e| self.map_error(e))?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| self.map_error(e))?;
        debug!(%url, status, "Response received");
        Ok(ApiResponse { status, body })
    }
}
