//! services/client/src/adapters/memory_storage.rs
//!
//! An in-process `SessionStorage`, used by tests and by runs that should not
//! leave a session behind on disk.

use astrometric_core::domain::Session;
use astrometric_core::ports::{PortResult, SessionStorage};
use parking_lot::Mutex;

#[derive(Default)]
pub struct MemorySessionStorage {
    record: Mutex<Option<Session>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts out holding `session`, as if a previous run had persisted it.
    pub fn with_session(session: Session) -> Self {
        Self {
            record: Mutex::new(Some(session)),
        }
    }
}

impl SessionStorage for MemorySessionStorage {
    fn read(&self) -> PortResult<Option<Session>> {
        Ok(self.record.lock().clone())
    }

    fn write(&self, session: &Session) -> PortResult<()> {
        *self.record.lock() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> PortResult<()> {
        *self.record.lock() = None;
        Ok(())
    }
}
