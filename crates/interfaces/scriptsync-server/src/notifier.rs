//! Broadcast-channel client notifier.
//!
//! Push events (`fileChange`, `deleteFile`) are addressed to one connection;
//! the transport adapters subscribe and route them to their client. Push
//! delivery is best-effort: with no subscriber the event is dropped, never
//! queued.

use scriptsync_core::protocol::{DeleteFileEvent, FileChangeEvent};
use scriptsync_session::ClientNotifier;
use serde::Serialize;
use tokio::sync::broadcast;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum PushEvent {
    FileChange(FileChangeEvent),
    DeleteFile(DeleteFileEvent),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressedEvent {
    pub socket_id: String,
    #[serde(flatten)]
    pub payload: PushEvent,
}

pub struct BroadcastNotifier {
    tx: broadcast::Sender<AddressedEvent>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AddressedEvent> {
        self.tx.subscribe()
    }
}

#[async_trait::async_trait]
impl ClientNotifier for BroadcastNotifier {
    async fn file_changed(&self, session_id: &str, event: FileChangeEvent) {
        let _ = self.tx.send(AddressedEvent {
            socket_id: session_id.to_string(),
            payload: PushEvent::FileChange(event),
        });
    }

    async fn file_removed(&self, session_id: &str, event: DeleteFileEvent) {
        let _ = self.tx.send(AddressedEvent {
            socket_id: session_id.to_string(),
            payload: PushEvent::DeleteFile(event),
        });
    }
}
