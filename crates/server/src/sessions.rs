//! Login sessions.
//!
//! A session id is handed out as the `session_id` cookie on login and maps to
//! the user id until logout. Sessions live in memory only and are lost on
//! restart.

use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock},
};

use uuid::Uuid;

#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Uuid>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// User behind a session id, if the session is live.
    pub fn get(&self, session_id: &str) -> Option<Uuid> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session_id)
            .copied()
    }

    /// Open a session for `user_id` and return its id (32 hex digits).
    pub fn insert(&self, user_id: Uuid) -> String {
        let session_id = Uuid::new_v4().simple().to_string();
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session_id.clone(), user_id);
        session_id
    }

    /// Close a session. Unknown ids are ignored.
    pub fn remove(&self, session_id: &str) {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(session_id);
    }
}
