//! services/client/src/guard.rs
//!
//! Route guards: decide whether the current session may enter a view.

use astrometric_core::domain::RouteAccess;
use tracing::debug;

use crate::session::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    RedirectToLogin,
    /// Signed in, but this view is not for them.
    RedirectToHome,
}

/// The view each shell command belongs to. Mirrors the server: everything
/// except health and the auth forms needs a signed-in user.
pub fn command_access(command: &str) -> RouteAccess {
    match command {
        "login" | "signup" => RouteAccess::GuestOnly,
        "health" | "help" => RouteAccess::Public,
        "train" => RouteAccess::Researcher,
        _ => RouteAccess::Authenticated,
    }
}

/// Re-reads durable storage, then checks `access` against the session.
pub fn authorize(session: &SessionStore, access: RouteAccess) -> GuardDecision {
    session.load();
    let authenticated = session.is_authenticated();

    let decision = match access {
        RouteAccess::Public => GuardDecision::Allow,
        RouteAccess::GuestOnly if authenticated => GuardDecision::RedirectToHome,
        RouteAccess::GuestOnly => GuardDecision::Allow,
        _ if !authenticated => GuardDecision::RedirectToLogin,
        RouteAccess::Authenticated => GuardDecision::Allow,
        RouteAccess::Researcher if session.is_researcher() => GuardDecision::Allow,
        RouteAccess::Admin if session.is_admin() => GuardDecision::Allow,
        RouteAccess::Researcher | RouteAccess::Admin => GuardDecision::RedirectToHome,
    };
    debug!(?access, role = session.role(), ?decision, "Route guard evaluated");
    decision
}
