//! crates/astrometric_core/src/domain.rs
//!
//! Defines the pure, core data structures for the client.
//! These structs are independent of any storage or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

//=========================================================================================
// Identity
//=========================================================================================

/// The role a signed-in user holds on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    #[default]
    User,
    Researcher,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Researcher => "researcher",
            Role::Admin => "admin",
        }
    }

    /// Parses the server's role string. Anything unrecognised is treated as a plain user,
    /// which is also what the server assigns when no role is given.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "researcher" => Role::Researcher,
            "admin" => Role::Admin,
            _ => Role::User,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The user identity returned by the server alongside a token exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSummary {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
}

//=========================================================================================
// Session
//=========================================================================================

/// The in-memory and persisted triple of user identity plus the two tokens.
///
/// `access_token` being set implies `user` is set; both are written together.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    pub user: Option<UserSummary>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl Session {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.user.is_none() && self.access_token.is_none() && self.refresh_token.is_none()
    }
}

/// What a successful login exchange hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthPayload {
    pub user: UserSummary,
    pub access_token: String,
    pub refresh_token: Option<String>,
}

impl From<AuthPayload> for Session {
    fn from(payload: AuthPayload) -> Self {
        Session {
            user: Some(payload.user),
            access_token: Some(payload.access_token),
            refresh_token: payload.refresh_token,
        }
    }
}

//=========================================================================================
// Notifications
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NotificationKind::Success => "success",
            NotificationKind::Error => "error",
            NotificationKind::Info => "info",
        };
        f.write_str(label)
    }
}

/// Opaque identifier of a queued notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotificationId(Uuid);

impl NotificationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NotificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A transient, user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: NotificationId,
    pub message: String,
    pub kind: NotificationKind,
    pub created_at: DateTime<Utc>,
}

//=========================================================================================
// Navigation
//=========================================================================================

/// Who may enter a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    /// Anyone.
    Public,
    /// Only visitors without a session (login, signup).
    GuestOnly,
    /// Any signed-in user.
    Authenticated,
    /// Researchers and admins.
    Researcher,
    /// Admins only.
    Admin,
}
