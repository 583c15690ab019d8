//! services/client/src/session.rs
//!
//! The session store: the single owner of the signed-in user and both tokens.
//!
//! Every mutation is mirrored to the injected `SessionStorage` port so a later
//! `load()` (e.g. on the next process start) restores the same triple. Storage
//! failures are logged and swallowed; the in-memory state is always authoritative.

use astrometric_core::domain::{AuthPayload, Role, Session, UserSummary};
use astrometric_core::ports::SessionStorage;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The role string reported when nobody is signed in.
pub const GUEST_ROLE: &str = "guest";

/// A cheaply clonable handle to the shared session state.
#[derive(Clone)]
pub struct SessionStore {
    state: Arc<RwLock<Session>>,
    storage: Arc<dyn SessionStorage>,
}

impl SessionStore {
    /// Creates an empty store. Call `load()` to restore a persisted session.
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            state: Arc::new(RwLock::new(Session::empty())),
            storage,
        }
    }

    //=====================================================================================
    // Mutators
    //=====================================================================================

    /// Stores the result of a login exchange, in memory and durably.
    pub fn set_session(&self, payload: AuthPayload) {
        let session = Session::from(payload);
        info!(
            user_id = session.user.as_ref().map(|u| u.id),
            has_refresh_token = session.refresh_token.is_some(),
            "Session established"
        );
        *self.state.write() = session.clone();
        self.persist(&session);
    }

    /// Replaces only the access token, leaving the user and refresh token untouched.
    pub fn set_access_token(&self, token: impl Into<String>) {
        let snapshot = {
            let mut state = self.state.write();
            if state.user.is_none() {
                warn!("Ignoring access token update: no user is signed in");
                return;
            }
            state.access_token = Some(token.into());
            state.clone()
        };
        debug!("Access token replaced");
        self.persist(&snapshot);
    }

    /// Restores the persisted session, if there is one. Safe to call repeatedly.
    pub fn load(&self) {
        match self.storage.read() {
            Ok(Some(stored)) => {
                let mut state = self.state.write();
                if *state != stored {
                    debug!("Session restored from storage");
                    *state = stored;
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Failed to read persisted session"),
        }
    }

    /// Purely local invalidation: forgets everything, in memory and durably.
    pub fn logout(&self) {
        *self.state.write() = Session::empty();
        if let Err(e) = self.storage.clear() {
            warn!(error = %e, "Failed to clear persisted session");
        }
        info!("Session cleared");
    }

    fn persist(&self, session: &Session) {
        if let Err(e) = self.storage.write(session) {
            warn!(error = %e, "Failed to persist session");
        }
    }

    //=====================================================================================
    // Read-only views
    //=====================================================================================

    pub fn snapshot(&self) -> Session {
        self.state.read().clone()
    }

    pub fn user(&self) -> Option<UserSummary> {
        self.state.read().user.clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.state.read().access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.state.read().refresh_token.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().access_token.is_some()
    }

    /// The current role, or `"guest"` without a user.
    pub fn role(&self) -> &'static str {
        self.current_role().map(|r| r.as_str()).unwrap_or(GUEST_ROLE)
    }

    pub fn is_researcher(&self) -> bool {
        matches!(self.current_role(), Some(Role::Researcher | Role::Admin))
    }

    pub fn is_admin(&self) -> bool {
        self.current_role() == Some(Role::Admin)
    }

    fn current_role(&self) -> Option<Role> {
        self.state.read().user.as_ref().map(|u| u.role)
    }
}
