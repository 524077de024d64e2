//! The per-connection sync session state machine.
//!
//! A session is either idle or bound to exactly one script; while bound it
//! exclusively owns one directory watch whose root is the bound script's
//! directory. Operations are serialized through the session's state mutex,
//! matching the one-in-flight-request-per-connection transport contract.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use scriptsync_config::{EDITOR_OPEN_DELAY_MS, ENTRY_FILE_NAME};
use scriptsync_core::protocol::{
    DeleteFileEvent, FileChangeEvent, LogMessage, OpenFileRequest, PullRequest, PushRequest,
};
use scriptsync_core::ScriptRoot;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::dts::DtsStore;
use crate::ports::{ClientNotifier, EditorPort, WatchEvent, WatcherFactory};
use crate::reader::{self, ScriptFileEntry};
use crate::SessionError;

/// An active script binding: name, the owned watch, and the task forwarding
/// watch events to the client notifier.
struct Binding {
    script_name: String,
    watcher: Box<dyn crate::ports::WatcherHandle>,
    forward: JoinHandle<()>,
}

impl Binding {
    fn close(self) {
        self.watcher.close();
        // The watcher stops emitting once closed; aborting the forward task
        // guarantees nothing already queued reaches the client afterwards.
        self.forward.abort();
    }
}

#[derive(Default)]
struct SessionState {
    binding: Option<Binding>,
}

impl SessionState {
    fn active_script(&self) -> Option<&str> {
        self.binding.as_ref().map(|b| b.script_name.as_str())
    }
}

pub struct SyncSession {
    session_id: String,
    root: ScriptRoot,
    dts: DtsStore,
    watchers: Arc<dyn WatcherFactory>,
    notifier: Arc<dyn ClientNotifier>,
    editor: Arc<dyn EditorPort>,
    state: Mutex<SessionState>,
}

impl SyncSession {
    pub fn new(
        session_id: impl Into<String>,
        root: ScriptRoot,
        dts: DtsStore,
        watchers: Arc<dyn WatcherFactory>,
        notifier: Arc<dyn ClientNotifier>,
        editor: Arc<dyn EditorPort>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            root,
            dts,
            watchers,
            notifier,
            editor,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// The script currently bound to this session, if any.
    pub async fn active_script(&self) -> Option<String> {
        self.state
            .lock()
            .await
            .active_script()
            .map(str::to_string)
    }

    /// Client-to-server sync: persist the pushed file set and start watching.
    pub async fn push(&self, req: PushRequest) -> Result<(), SessionError> {
        let mut state = self.state.lock().await;
        if state.active_script() == Some(req.script_name.as_str()) {
            return Err(SessionError::AlreadyInitialized(req.script_name));
        }

        let dir = self.root.script_dir(&req.script_name)?;
        // Resolve every write target up front so a bad name or a traversal
        // attempt rejects before any state mutation.
        let mut writes: Vec<(Utf8PathBuf, &str)> = Vec::with_capacity(req.script_files.len());
        for (rel, content) in &req.script_files {
            writes.push((
                self.root.script_file(&req.script_name, rel)?,
                content.as_str(),
            ));
        }

        // A session only ever owns one watch.
        if let Some(prev) = state.binding.take() {
            debug!(
                "Session {}: replacing binding '{}' with '{}'",
                self.session_id, prev.script_name, req.script_name
            );
            prev.close();
        }

        self.dts
            .write_all(&req.global_dts, &req.scripting_dts)?;
        ScriptRoot::ensure_dir(&dir)?;

        // Fail fast on the first write error. Files already written stay in
        // place; the client resolves the partial state with a retry push.
        for (path, content) in writes {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, content)?;
        }

        info!(
            "Session {}: pushed {} file(s) into '{}'",
            self.session_id,
            req.script_files.len(),
            req.script_name
        );

        state.binding = Some(self.install_watch(&req.script_name, &dir));
        self.schedule_entry_open(&dir, &req.script_files);
        Ok(())
    }

    /// Server-to-client sync: export the script directory and start watching.
    ///
    /// Pull never creates a script; a missing directory is an error.
    pub async fn pull(
        &self,
        req: PullRequest,
    ) -> Result<BTreeMap<String, ScriptFileEntry>, SessionError> {
        let mut state = self.state.lock().await;
        if state.active_script() == Some(req.script_name.as_str()) {
            return Err(SessionError::AlreadyInitialized(req.script_name));
        }

        let dir = self.root.script_dir(&req.script_name)?;
        if !dir.is_dir() {
            return Err(SessionError::NotFound(req.script_name));
        }

        if let Some(prev) = state.binding.take() {
            prev.close();
        }

        self.dts
            .write_all(&req.global_dts, &req.scripting_dts)?;
        let files = reader::read_all(&dir)?;

        info!(
            "Session {}: pulled {} file(s) from '{}'",
            self.session_id,
            files.len(),
            req.script_name
        );

        state.binding = Some(self.install_watch(&req.script_name, &dir));
        Ok(files)
    }

    /// Unbind when the name matches. A non-matching name is a no-op signal,
    /// not an error.
    pub async fn stop(&self, script_name: &str) -> bool {
        let mut state = self.state.lock().await;
        if state.active_script() != Some(script_name) {
            return false;
        }
        if let Some(binding) = state.binding.take() {
            binding.close();
        }
        info!("Session {}: stopped '{}'", self.session_id, script_name);
        true
    }

    /// Fire-and-forget log relay to the server console. Messages for a
    /// since-replaced script are dropped, not queued.
    pub async fn relay_log(&self, msg: LogMessage) {
        let state = self.state.lock().await;
        if state.active_script() != Some(msg.script_name.as_str()) {
            debug!(
                "Session {}: dropping stale log for '{}'",
                self.session_id, msg.script_name
            );
            return;
        }
        if msg.is_error {
            error!("[{}] {}", msg.script_name, msg.content);
        } else {
            info!("[{}] {}", msg.script_name, msg.content);
        }
    }

    /// Fire-and-forget editor open. Ignored unless the script is the active
    /// one and the resolved file exists.
    pub async fn request_open(&self, req: OpenFileRequest) {
        let state = self.state.lock().await;
        if state.active_script() != Some(req.script_name.as_str()) {
            return;
        }
        let path = match self.root.script_file(&req.script_name, &req.relative_path) {
            Ok(p) => p,
            Err(e) => {
                debug!("Session {}: ignoring open request: {}", self.session_id, e);
                return;
            }
        };
        if !path.is_file() {
            return;
        }
        if let Err(e) = self.editor.open(&path) {
            warn!("Session {}: editor open failed: {:#}", self.session_id, e);
        }
    }

    /// Read-only fetch of one file of the active script. No state change.
    pub async fn get_file_content(
        &self,
        script_name: &str,
        relative_path: &str,
    ) -> Result<String, SessionError> {
        let state = self.state.lock().await;
        if state.active_script() != Some(script_name) {
            return Err(SessionError::Validation(format!(
                "script '{script_name}' is not active on this session"
            )));
        }
        let path = self.root.script_file(script_name, relative_path)?;
        Ok(std::fs::read_to_string(path)?)
    }

    /// Invoked on connection loss: release the watch and clear the binding.
    /// Idempotent.
    pub async fn teardown(&self) {
        let mut state = self.state.lock().await;
        if let Some(binding) = state.binding.take() {
            debug!(
                "Session {}: teardown closes watch on '{}'",
                self.session_id, binding.script_name
            );
            binding.close();
        }
    }

    fn install_watch(&self, script_name: &str, dir: &Utf8Path) -> Binding {
        let (tx, mut rx) = mpsc::channel(64);
        let watcher = self.watchers.watch(dir, tx);

        let notifier = self.notifier.clone();
        let session_id = self.session_id.clone();
        let script = script_name.to_string();
        let forward = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match event {
                    WatchEvent::Ready => debug!("Watch ready for '{script}'"),
                    WatchEvent::Changed { rel_path, hash } => {
                        notifier
                            .file_changed(
                                &session_id,
                                FileChangeEvent {
                                    script_name: script.clone(),
                                    file_path: rel_path,
                                    hash,
                                },
                            )
                            .await;
                    }
                    WatchEvent::Removed { rel_path } => {
                        notifier
                            .file_removed(
                                &session_id,
                                DeleteFileEvent {
                                    script_name: script.clone(),
                                    file_path: rel_path,
                                },
                            )
                            .await;
                    }
                    WatchEvent::Error(e) => warn!("Watcher error for '{script}': {e}"),
                }
            }
        });

        Binding {
            script_name: script_name.to_string(),
            watcher,
            forward,
        }
    }

    /// Open the entry file in the desktop editor after a deliberate delay so
    /// the acknowledgment is flushed before the external open executes.
    fn schedule_entry_open(&self, dir: &Utf8Path, files: &BTreeMap<String, String>) {
        let rel = if files.contains_key(ENTRY_FILE_NAME) {
            Some(ENTRY_FILE_NAME.to_string())
        } else {
            files.keys().next().cloned()
        };
        let Some(rel) = rel else { return };
        let path = dir.join(rel);
        let editor = self.editor.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(EDITOR_OPEN_DELAY_MS)).await;
            if let Err(e) = editor.open(&path) {
                warn!("Editor open failed for {}: {:#}", path, e);
            }
        });
    }
}
