//! services/client/src/http.rs
//!
//! The authenticated request pipeline.
//!
//! `ApiClient` attaches the current access token to every call and recovers from
//! exactly one class of failure, an expired access token, by refreshing it once and
//! replaying the original request. Per failed call it walks a small state machine:
//!
//! ```text
//! Normal --401 + refresh token--> Refreshing --refresh ok--> Normal (replay once)
//!                                            \--refresh failed--> Failed (logout + redirect)
//! ```
//!
//! Every other failure is surfaced through the notification center and returned to
//! the caller unchanged.

use astrometric_core::ports::{ApiRequest, ApiResponse, HttpTransport, Navigator, RequestBody};
use bytes::Bytes;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::{ClientError, ClientResult, ErrorClass};
use crate::notifications::NotificationCenter;
use crate::session::SessionStore;

/// Where a fresh access token is minted.
pub const REFRESH_PATH: &str = "/api/auth/refresh";

/// Shown when a call gets no response at all.
pub const CONNECTIVITY_MESSAGE: &str = "Network error. Please check your connection.";

/// The most recent position of the refresh state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Normal,
    Refreshing,
    Failed,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ClientOptions {
    /// Let concurrent 401s share one refresh instead of each issuing their own.
    pub coalesce_refresh: bool,
}

/// A request on its way through the pipeline, with its one-shot replay flag.
struct PendingRequest {
    request: ApiRequest,
    retried: bool,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access_token: String,
}

//=========================================================================================
// The Client
//=========================================================================================

/// Cheap to clone; all clones share the same session, sink and refresh state.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    session: SessionStore,
    notifications: NotificationCenter,
    navigator: Arc<dyn Navigator>,
    options: ClientOptions,
    state: Arc<Mutex<RefreshState>>,
    refresh_gate: Arc<tokio::sync::Mutex<()>>,
}

impl ApiClient {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        session: SessionStore,
        notifications: NotificationCenter,
        navigator: Arc<dyn Navigator>,
        options: ClientOptions,
    ) -> Self {
        Self {
            transport,
            session,
            notifications,
            navigator,
            options,
            state: Arc::new(Mutex::new(RefreshState::Normal)),
            refresh_gate: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn refresh_state(&self) -> RefreshState {
        *self.state.lock()
    }

    fn transition(&self, next: RefreshState) {
        let mut state = self.state.lock();
        if *state != next {
            debug!(from = ?*state, to = ?next, "Refresh state transition");
            *state = next;
        }
    }

    /// A later success means the session was re-established.
    fn clear_failure(&self) {
        let mut state = self.state.lock();
        if *state == RefreshState::Failed {
            debug!("Request succeeded after a failed refresh; state reset");
            *state = RefreshState::Normal;
        }
    }

    //=====================================================================================
    // Request Pipeline
    //=====================================================================================

    /// Sends a request, transparently renewing an expired access token once.
    ///
    /// Resolves with the first successful response. Anything else is surfaced to the
    /// user (where appropriate) and returned as an error.
    pub async fn send(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        let mut pending = PendingRequest {
            request,
            retried: false,
        };
        // The header reflects whatever token is current at dispatch time.
        pending.request.bearer = self.session.access_token();

        loop {
            let response = match self.transport.send(pending.request.clone()).await {
                Ok(response) => response,
                Err(e) => return Err(self.surface(ClientError::Transport(e))),
            };
            if response.is_success() {
                self.clear_failure();
                return Ok(response);
            }

            if response.is_unauthorized() && !pending.retried {
                if let Some(refresh_token) = self.session.refresh_token() {
                    debug!(
                        path = %pending.request.path,
                        class = ?ErrorClass::ExpiredCredential,
                        "Access token rejected; attempting refresh"
                    );
                    let token = self.renew(&pending, refresh_token).await?;
                    pending.request.bearer = Some(token);
                    pending.retried = true;
                    continue;
                }
            }

            return Err(self.surface(ClientError::from_response(
                response.status,
                &response.body,
            )));
        }
    }

    /// Runs the `Refreshing` leg. On failure the session is torn down and the
    /// shell is sent back to the login view.
    async fn renew(&self, pending: &PendingRequest, refresh_token: String) -> ClientResult<String> {
        let outcome = if self.options.coalesce_refresh {
            let _gate = self.refresh_gate.lock().await;
            match self.session.access_token() {
                // Someone else already refreshed while we waited.
                Some(current) if pending.request.bearer.as_deref() != Some(current.as_str()) => {
                    debug!("Reusing access token minted by a concurrent refresh");
                    Ok(current)
                }
                _ => match self.session.refresh_token() {
                    Some(current) => self.refresh(&current).await,
                    // A concurrent refresh already failed and tore the session down.
                    None => return Err(ClientError::SessionExpired),
                },
            }
        } else {
            self.refresh(&refresh_token).await
        };

        match outcome {
            Ok(token) => {
                self.transition(RefreshState::Normal);
                Ok(token)
            }
            Err(e) => {
                self.transition(RefreshState::Failed);
                error!(error = %e, "Token refresh failed; ending session");
                self.session.logout();
                self.navigator.redirect_to_login();
                Err(ClientError::SessionExpired)
            }
        }
    }

    /// Mints a new access token. Goes straight to the transport so a rejected
    /// refresh can never trigger another refresh.
    async fn refresh(&self, refresh_token: &str) -> ClientResult<String> {
        self.transition(RefreshState::Refreshing);
        let request = ApiRequest::post(REFRESH_PATH).with_bearer(refresh_token);
        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return Err(ClientError::from_response(response.status, &response.body));
        }
        let parsed: RefreshResponse = serde_json::from_slice(&response.body)?;
        self.session.set_access_token(parsed.access_token.clone());
        info!("Access token refreshed");
        Ok(parsed.access_token)
    }

    /// Reports an unrecoverable failure to the user and hands it back for propagation.
    fn surface(&self, err: ClientError) -> ClientError {
        match &err {
            ClientError::Transport(e) => {
                warn!(error = %e, "Request failed without a response");
                self.notifications.error(CONNECTIVITY_MESSAGE);
            }
            ClientError::Api {
                status, message, ..
            } => {
                warn!(status, message = message.as_deref().unwrap_or(""), "Request rejected");
                if let Some(message) = message {
                    self.notifications.error(message.clone());
                }
            }
            _ => {}
        }
        err
    }

    //=====================================================================================
    // JSON Helpers
    //=====================================================================================

    pub async fn get_json<T: DeserializeOwned>(&self, request: ApiRequest) -> ClientResult<T> {
        let response = self.send(request).await?;
        decode(&response)
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = ApiRequest::post(path).with_body(json_body(body)?);
        let response = self.send(request).await?;
        decode(&response)
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = ApiRequest::put(path).with_body(json_body(body)?);
        let response = self.send(request).await?;
        decode(&response)
    }

    pub async fn delete_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let response = self.send(ApiRequest::delete(path)).await?;
        decode(&response)
    }

    /// Posts a single file as `multipart/form-data`.
    pub async fn upload<T: DeserializeOwned>(
        &self,
        path: &str,
        field: &str,
        file_name: &str,
        content: Bytes,
        fields: Vec<(String, String)>,
    ) -> ClientResult<T> {
        let request = ApiRequest::post(path).with_body(RequestBody::Multipart {
            field: field.to_string(),
            file_name: file_name.to_string(),
            content,
            fields,
        });
        let response = self.send(request).await?;
        decode(&response)
    }
}

pub(crate) fn json_body<B: Serialize + ?Sized>(body: &B) -> ClientResult<RequestBody> {
    Ok(RequestBody::Json(Bytes::from(serde_json::to_vec(body)?)))
}

pub(crate) fn decode<T: DeserializeOwned>(response: &ApiResponse) -> ClientResult<T> {
    Ok(serde_json::from_slice(&response.body)?)
}
