//! Process-wide table of connection id -> session.
//!
//! The registry is the sole authority for the connection/session mapping. It
//! is an explicit object owned by the composition root and handed to the
//! transport adapters by reference, never ambient global state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use scriptsync_core::ScriptRoot;
use tracing::debug;

use crate::dts::DtsStore;
use crate::ports::{ClientNotifier, EditorPort, WatcherFactory};
use crate::session::SyncSession;

pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Arc<SyncSession>>>,
    root: ScriptRoot,
    dts: DtsStore,
    watchers: Arc<dyn WatcherFactory>,
    notifier: Arc<dyn ClientNotifier>,
    editor: Arc<dyn EditorPort>,
}

impl SessionRegistry {
    pub fn new(
        root: ScriptRoot,
        dts: DtsStore,
        watchers: Arc<dyn WatcherFactory>,
        notifier: Arc<dyn ClientNotifier>,
        editor: Arc<dyn EditorPort>,
    ) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            root,
            dts,
            watchers,
            notifier,
            editor,
        }
    }

    /// Create the session for a newly established connection. A stale entry
    /// under the same id is torn down first so its watch cannot leak.
    pub async fn create(&self, connection_id: &str) -> Arc<SyncSession> {
        self.remove(connection_id).await;
        let session = Arc::new(SyncSession::new(
            connection_id,
            self.root.clone(),
            self.dts.clone(),
            self.watchers.clone(),
            self.notifier.clone(),
            self.editor.clone(),
        ));
        self.sessions
            .lock()
            .unwrap()
            .insert(connection_id.to_string(), session.clone());
        debug!("Registered session {connection_id}");
        session
    }

    pub fn get(&self, connection_id: &str) -> Option<Arc<SyncSession>> {
        self.sessions.lock().unwrap().get(connection_id).cloned()
    }

    /// Used by the stateless HTTP bridge, where the socket transport that
    /// normally owns the create/teardown lifecycle is not in the loop.
    pub async fn get_or_create(&self, connection_id: &str) -> Arc<SyncSession> {
        if let Some(session) = self.get(connection_id) {
            return session;
        }
        self.create(connection_id).await
    }

    /// Teardown path, invoked exactly once per connection loss.
    pub async fn remove(&self, connection_id: &str) {
        let taken = self.sessions.lock().unwrap().remove(connection_id);
        if let Some(session) = taken {
            session.teardown().await;
            debug!("Removed session {connection_id}");
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
