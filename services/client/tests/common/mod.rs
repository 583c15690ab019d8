//! Shared fixtures: a scripted transport, a recording navigator and a client
//! wired together over in-memory storage.

#![allow(dead_code)]

use astrometric_core::domain::{AuthPayload, Role, UserSummary};
use astrometric_core::ports::{ApiRequest, ApiResponse, HttpTransport, Navigator, TransportError};
use async_trait::async_trait;
use client_lib::adapters::MemorySessionStorage;
use client_lib::{ApiClient, ClientOptions, NotificationCenter, SessionStore};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

type Handler = Box<dyn Fn(&ApiRequest) -> Result<ApiResponse, TransportError> + Send + Sync>;

/// Answers every request through `handler` and remembers what it was asked.
pub struct ScriptedTransport {
    handler: Handler,
    seen: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new<F>(handler: F) -> Arc<Self>
    where
        F: Fn(&ApiRequest) -> Result<ApiResponse, TransportError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            handler: Box::new(handler),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.seen.lock().clone()
    }

    pub fn count_path(&self, path: &str) -> usize {
        self.seen.lock().iter().filter(|r| r.path == path).count()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        self.seen.lock().push(request.clone());
        // Give concurrent callers a chance to interleave, like a real network would.
        tokio::task::yield_now().await;
        (self.handler)(&request)
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    redirects: AtomicUsize,
}

impl RecordingNavigator {
    pub fn redirects(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }
}

impl Navigator for RecordingNavigator {
    fn redirect_to_login(&self) {
        self.redirects.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct Harness {
    pub client: ApiClient,
    pub transport: Arc<ScriptedTransport>,
    pub navigator: Arc<RecordingNavigator>,
    pub storage: Arc<MemorySessionStorage>,
}

impl Harness {
    pub fn new(transport: Arc<ScriptedTransport>, options: ClientOptions) -> Self {
        let storage = Arc::new(MemorySessionStorage::new());
        let navigator = Arc::new(RecordingNavigator::default());
        let client = ApiClient::new(
            transport.clone(),
            SessionStore::new(storage.clone()),
            NotificationCenter::new(),
            navigator.clone(),
            options,
        );
        Self {
            client,
            transport,
            navigator,
            storage,
        }
    }

    pub fn sign_in(&self, access: &str, refresh: Option<&str>) {
        self.client.session().set_session(AuthPayload {
            user: UserSummary {
                id: 11,
                email: "leavitt@example.org".to_string(),
                name: Some("Henrietta".to_string()),
                role: Role::Researcher,
            },
            access_token: access.to_string(),
            refresh_token: refresh.map(str::to_string),
        });
    }

    pub fn notification_messages(&self) -> Vec<String> {
        self.client
            .notifications()
            .items()
            .into_iter()
            .map(|n| n.message)
            .collect()
    }
}

pub fn json(status: u16, body: serde_json::Value) -> Result<ApiResponse, TransportError> {
    Ok(ApiResponse::new(status, body.to_string()))
}
