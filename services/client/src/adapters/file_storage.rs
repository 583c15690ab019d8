//! services/client/src/adapters/file_storage.rs
//!
//! Durable session storage backed by a single JSON file. This is the concrete
//! implementation of the `SessionStorage` port used by the command-line client.

use astrometric_core::domain::{Role, Session, UserSummary};
use astrometric_core::ports::{PortError, PortResult, SessionStorage};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::config::SESSION_STORAGE_KEY;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// Keeps the session record in `<dir>/astrometric.session.json`.
#[derive(Clone, Debug)]
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{SESSION_STORAGE_KEY}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

//=========================================================================================
// "Impure" Storage Record Structs
//=========================================================================================

#[derive(Serialize, Deserialize)]
struct UserRecord {
    id: i64,
    email: String,
    #[serde(default)]
    name: Option<String>,
    role: String,
}
impl UserRecord {
    fn from_domain(user: &UserSummary) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role.as_str().to_string(),
        }
    }

    fn to_domain(self) -> UserSummary {
        UserSummary {
            id: self.id,
            email: self.email,
            name: self.name,
            role: Role::parse(&self.role),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct SessionRecord {
    user: Option<UserRecord>,
    access_token: Option<String>,
    refresh_token: Option<String>,
}
impl SessionRecord {
    fn from_domain(session: &Session) -> Self {
        Self {
            user: session.user.as_ref().map(UserRecord::from_domain),
            access_token: session.access_token.clone(),
            refresh_token: session.refresh_token.clone(),
        }
    }

    fn to_domain(self) -> Session {
        Session {
            user: self.user.map(UserRecord::to_domain),
            access_token: self.access_token,
            refresh_token: self.refresh_token,
        }
    }
}

//=========================================================================================
// `SessionStorage` Trait Implementation
//=========================================================================================

impl SessionStorage for FileSessionStorage {
    fn read(&self) -> PortResult<Option<Session>> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PortError::Unexpected(e.to_string())),
        };
        let record: SessionRecord = serde_json::from_slice(&raw)
            .map_err(|e| PortError::Unexpected(format!("corrupt session record: {e}")))?;
        Ok(Some(record.to_domain()))
    }

    fn write(&self, session: &Session) -> PortResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| PortError::Unexpected(e.to_string()))?;
        }
        let json = serde_json::to_vec_pretty(&SessionRecord::from_domain(session))
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        // Write-then-rename so a crash never leaves a half-written record.
        let tmp = self.path.with_extension("json.tmp");
        write_private(&tmp, &json).map_err(|e| PortError::Unexpected(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| PortError::Unexpected(e.to_string()))
    }

    fn clear(&self) -> PortResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PortError::Unexpected(e.to_string())),
        }
    }
}

/// Writes `contents` readable by the owner only; the record holds both tokens.
#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // `mode` only applies on creation; a stale temp file keeps its old bits.
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    fs::write(path, contents)
}
