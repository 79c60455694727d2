use crate::{
    error::Result,
    models::{Generation, Session},
    navigation::{Navigator, SESSION_PARAM},
    storage::KeyValueStorage,
};
use std::sync::Arc;
use uuid::Uuid;

pub const SESSION_INDEX_KEY: &str = "userSessions";
const SESSION_RECORD_PREFIX: &str = "userSession-";

pub fn session_record_key(session_id: &str) -> String {
    format!("{}{}", SESSION_RECORD_PREFIX, session_id)
}

/// Durable session history.
///
/// Persisted as an index of ids under [`SESSION_INDEX_KEY`] plus one record per
/// session under `userSession-<id>`. The active session is whatever the URL's
/// `session` parameter names; a missing or unknown id means no active session.
pub struct SessionStore {
    storage: Arc<dyn KeyValueStorage>,
    navigator: Arc<dyn Navigator>,
    sessions: Vec<Session>,
    current_session_id: Option<String>,
}

impl SessionStore {
    pub fn load(storage: Arc<dyn KeyValueStorage>, navigator: Arc<dyn Navigator>) -> Self {
        let sessions = restore_sessions(storage.as_ref());
        let current_session_id = navigator.query_param(SESSION_PARAM);

        log::debug!(
            "Restored {} session(s), url session = {:?}",
            sessions.len(),
            current_session_id
        );

        Self {
            storage,
            navigator,
            sessions,
            current_session_id,
        }
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn session(&self, session_id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.session_id == session_id)
    }

    pub fn current_session_id(&self) -> Option<&str> {
        self.current_session_id.as_deref()
    }

    pub fn current_session(&self) -> Option<&Session> {
        self.current_session_id
            .as_deref()
            .and_then(|id| self.session(id))
    }

    /// Re-reads the `session` URL parameter. Returns `true` when the active id changed.
    pub fn sync_with_url(&mut self) -> bool {
        let from_url = self.navigator.query_param(SESSION_PARAM);
        if from_url == self.current_session_id {
            return false;
        }
        log::debug!(
            "Active session changed {:?} -> {:?}",
            self.current_session_id,
            from_url
        );
        self.current_session_id = from_url;
        true
    }

    pub fn open_session(&mut self, session_id: Option<&str>) -> bool {
        if session_id == self.current_session_id.as_deref() {
            return false;
        }
        self.navigator.replace_query_param(SESSION_PARAM, session_id);
        self.current_session_id = session_id.map(String::from);
        true
    }

    /// Returns the active session id, allocating one (and writing it to the URL)
    /// only when there is none. The URL is not re-read here; see [`Self::sync_with_url`].
    pub fn ensure_session_id(&mut self) -> String {
        if let Some(id) = &self.current_session_id {
            return id.clone();
        }

        let session_id = Uuid::new_v4().to_string();
        self.navigator
            .replace_query_param(SESSION_PARAM, Some(&session_id));
        self.current_session_id = Some(session_id.clone());
        log::info!("Created session {}", session_id);
        session_id
    }

    pub fn add_generation(&mut self, session_id: &str, generation: Generation) -> Result<()> {
        match self
            .sessions
            .iter_mut()
            .find(|s| s.session_id == session_id)
        {
            Some(session) => {
                session.generations.push(generation);
                let record = serde_json::to_string(&*session)?;
                log::debug!(
                    "Session {} now has {} generation(s)",
                    session_id,
                    session.len()
                );
                self.storage
                    .set_item(&session_record_key(session_id), &record)?;
            }
            None => {
                let mut session = Session::new(session_id);
                session.generations.push(generation);
                let record = serde_json::to_string(&session)?;
                self.sessions.push(session);
                log::info!("Started history for session {}", session_id);
                self.persist_index()?;
                self.storage
                    .set_item(&session_record_key(session_id), &record)?;
            }
        }
        Ok(())
    }

    pub fn add_to_current(&mut self, generation: Generation) -> Result<String> {
        let session_id = self.ensure_session_id();
        self.add_generation(&session_id, generation)?;
        Ok(session_id)
    }

    /// Removes a session entirely. Returns `true` if it was the active one, in which
    /// case the URL's session parameter is cleared.
    pub fn delete_session(&mut self, session_id: &str) -> Result<bool> {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.session_id != session_id);
        if self.sessions.len() != before {
            log::info!("Deleted session {}", session_id);
        }

        let was_active = self.current_session_id.as_deref() == Some(session_id);
        if was_active {
            self.current_session_id = None;
            self.navigator.replace_query_param(SESSION_PARAM, None);
        }

        self.persist_index()?;
        self.storage.remove_item(&session_record_key(session_id))?;
        Ok(was_active)
    }

    fn persist_index(&self) -> Result<()> {
        let ids: Vec<&str> = self
            .sessions
            .iter()
            .map(|s| s.session_id.as_str())
            .collect();
        self.storage
            .set_item(SESSION_INDEX_KEY, &serde_json::to_string(&ids)?)
    }
}

/// Reads the index and its records. Corruption never propagates: a bad index is
/// cleared, a bad record is skipped.
fn restore_sessions(storage: &dyn KeyValueStorage) -> Vec<Session> {
    let raw_index = match storage.get_item(SESSION_INDEX_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            log::error!("Failed to read session index: {}", e);
            return Vec::new();
        }
    };

    let ids: Vec<String> = match serde_json::from_str(&raw_index) {
        Ok(ids) => ids,
        Err(e) => {
            log::warn!("Corrupted session index ({}), clearing it", e);
            if let Err(e) = storage.remove_item(SESSION_INDEX_KEY) {
                log::error!("Failed to clear corrupted session index: {}", e);
            }
            return Vec::new();
        }
    };

    let mut sessions: Vec<Session> = Vec::with_capacity(ids.len());
    for id in ids {
        if sessions.iter().any(|s| s.session_id == id) {
            log::warn!("Duplicate session id {} in index, ignoring", id);
            continue;
        }
        let raw = match storage.get_item(&session_record_key(&id)) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                log::warn!("Session {} listed in index but has no record", id);
                continue;
            }
            Err(e) => {
                log::error!("Failed to read session {}: {}", id, e);
                continue;
            }
        };
        match serde_json::from_str::<Session>(&raw) {
            Ok(mut session) => {
                session.session_id = id;
                sessions.push(session);
            }
            Err(e) => log::warn!("Skipping corrupted session {}: {}", id, e),
        }
    }
    sessions
}
