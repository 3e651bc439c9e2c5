use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use uuid::Uuid;

use crate::domain::error::Result;
use crate::domain::session::SessionState;
use crate::infrastructure::storage::ensure_session_dir;

/// Server-side session states keyed by the id carried in the session cookie.
///
/// Callers take a snapshot, work on it, and `save` it back only when the
/// request succeeded, so a failed request leaves the stored state untouched.
pub struct SessionStore {
    upload_root: PathBuf,
    sessions: Mutex<HashMap<String, SessionState>>,
}

impl SessionStore {
    pub fn new(upload_root: impl Into<PathBuf>) -> Self {
        Self {
            upload_root: upload_root.into(),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn upload_root(&self) -> &Path {
        &self.upload_root
    }

    pub fn new_session_id() -> String {
        Uuid::new_v4().simple().to_string()
    }

    /// Ids are generated here, so anything else is a forged or stale cookie.
    pub fn is_valid_id(id: &str) -> bool {
        Uuid::try_parse(id).is_ok()
    }

    pub fn get(&self, id: &str) -> Option<SessionState> {
        self.lock().get(id).cloned()
    }

    /// Snapshot of the session, or a blank one with its work directory created.
    ///
    /// A new session is only stored once it is passed to `save`.
    pub fn get_or_create(&self, id: &str) -> Result<SessionState> {
        if let Some(state) = self.get(id) {
            return Ok(state);
        }
        let work_dir = ensure_session_dir(&self.upload_root, id)?;
        Ok(SessionState::new(work_dir))
    }

    pub fn save(&self, id: &str, state: SessionState) {
        self.lock().insert(id.to_string(), state);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, SessionState>> {
        self.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
