//! Capability traits at the session's seams.
//!
//! The session never holds a concrete watcher, transport or editor type;
//! infrastructure crates implement these and the composition root wires them
//! together. Tests substitute recording fakes.

use camino::Utf8Path;
use scriptsync_core::protocol::{DeleteFileEvent, FileChangeEvent};
use tokio::sync::mpsc;

/// A classified filesystem observation from a script directory watch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// Initial scan finished; diagnostic only.
    Ready,
    /// A syncable file's content changed. The fingerprint reflects the
    /// version read at emission time.
    Changed { rel_path: String, hash: String },
    /// A file or directory was deleted.
    Removed { rel_path: String },
    /// Watch setup or delivery failure; the watch stays otherwise usable.
    Error(String),
}

/// Handle to one active directory watch, exclusively owned by one session.
pub trait WatcherHandle: Send + Sync {
    /// Stop event delivery. Idempotent; no events are emitted after this
    /// returns.
    fn close(&self);
}

/// Creates directory watches. One factory serves all sessions.
pub trait WatcherFactory: Send + Sync + 'static {
    /// Start watching `root` recursively, delivering classified events on
    /// `events`. Setup failures surface as [`WatchEvent::Error`] rather than
    /// a panic or a dead handle.
    fn watch(&self, root: &Utf8Path, events: mpsc::Sender<WatchEvent>) -> Box<dyn WatcherHandle>;
}

/// Outbound push-event channel toward the connected client.
#[async_trait::async_trait]
pub trait ClientNotifier: Send + Sync + 'static {
    async fn file_changed(&self, session_id: &str, event: FileChangeEvent);
    async fn file_removed(&self, session_id: &str, event: DeleteFileEvent);
}

/// External desktop-editor collaborator.
pub trait EditorPort: Send + Sync + 'static {
    fn open(&self, path: &Utf8Path) -> anyhow::Result<()>;
}
