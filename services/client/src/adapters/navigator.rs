//! services/client/src/adapters/navigator.rs
//!
//! A `Navigator` for a terminal shell: there is no login view to jump to, so the
//! redirect is logged and remembered for the caller to act on.

use astrometric_core::ports::Navigator;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

#[derive(Default)]
pub struct ConsoleNavigator {
    redirected: AtomicBool,
}

impl ConsoleNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a login redirect was requested since the last call.
    pub fn take_redirect(&self) -> bool {
        self.redirected.swap(false, Ordering::SeqCst)
    }
}

impl Navigator for ConsoleNavigator {
    fn redirect_to_login(&self) {
        warn!("Session is no longer valid; log in again with `astrometric login`");
        self.redirected.store(true, Ordering::SeqCst);
    }
}
