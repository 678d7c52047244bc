//! Session registry: the single source of truth for which sessions are
//! alive and which sandbox each one owns.
//!
//! Held for the whole process lifetime, no expiry. Idle-timeout eviction is
//! a deployment concern, not handled here.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, RwLock};

use crate::error::Result;
use crate::sandbox::SandboxClient;

/// Canonical name the dataset is staged under inside every sandbox.
pub const DATASET_FILENAME: &str = "dataset.csv";

/// Remote path of the staged dataset, derived from [`DATASET_FILENAME`].
pub const DATASET_PATH: &str = "/home/user/dataset.csv";

/// One live session: a bound sandbox plus dataset metadata. The sandbox
/// binding is stable for the session's lifetime; re-upload never rebinds.
pub struct Session {
    pub sandbox: SandboxClient,
    pub filename: String,
    pub columns: String,
}

pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    // Per-identifier creation gates so two concurrent first uploads for the
    // same id cannot both provision a sandbox. Distinct ids never contend.
    creating: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            creating: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the existing session for `session_id` unchanged, or builds a
    /// sandbox via `factory`, binds it, and stores the new session. The
    /// factory runs outside any registry-wide lock; only callers with the
    /// same identifier wait on it.
    pub async fn create_or_get<F, Fut>(
        &self,
        session_id: &str,
        filename: &str,
        columns: &str,
        factory: F,
    ) -> Result<Arc<Session>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<SandboxClient>>,
    {
        if let Some(existing) = self.get(session_id) {
            return Ok(existing);
        }

        let gate = {
            let mut creating = self.creating.lock().expect("creation gate lock poisoned");
            creating
                .entry(session_id.to_string())
                .or_default()
                .clone()
        };
        let guard = gate.lock().await;

        // Lost the race: a concurrent upload already bound this id.
        if let Some(existing) = self.get(session_id) {
            return Ok(existing);
        }

        let sandbox = match factory().await {
            Ok(sandbox) => sandbox,
            Err(e) => {
                // No session was bound, so the gate entry must go too or a
                // stream of failed uploads would grow the map forever.
                drop(guard);
                self.creating
                    .lock()
                    .expect("creation gate lock poisoned")
                    .remove(session_id);
                return Err(e);
            }
        };
        let session = Arc::new(Session {
            sandbox,
            filename: filename.to_string(),
            columns: columns.to_string(),
        });
        self.sessions
            .write()
            .expect("session map lock poisoned")
            .insert(session_id.to_string(), Arc::clone(&session));

        drop(guard);
        self.creating
            .lock()
            .expect("creation gate lock poisoned")
            .remove(session_id);

        Ok(session)
    }

    /// Pure lookup. Absent means "not yet initialized", never an error.
    pub fn get(&self, session_id: &str) -> Option<Arc<Session>> {
        self.sessions
            .read()
            .expect("session map lock poisoned")
            .get(session_id)
            .cloned()
    }

    /// Best-effort teardown: the entry is removed unconditionally, and a
    /// failed remote stop is logged, never propagated. Removing an absent
    /// id is a no-op.
    pub async fn remove(&self, session_id: &str) {
        let session = self
            .sessions
            .write()
            .expect("session map lock poisoned")
            .remove(session_id);

        if let Some(session) = session {
            if let Err(e) = session.sandbox.stop().await {
                tracing::warn!(
                    session_id,
                    error = %e,
                    "sandbox teardown failed; session entry removed anyway"
                );
            }
        }
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
