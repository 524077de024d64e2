//! Per-connection session engine: the push/pull protocol state machine, the
//! session registry, directory export, and the shared declaration store.

use scriptsync_core::PathError;

pub mod dts;
pub mod ports;
pub mod reader;
pub mod registry;
pub mod session;

pub use dts::DtsStore;
pub use ports::{ClientNotifier, EditorPort, WatchEvent, WatcherFactory, WatcherHandle};
pub use reader::{read_all, ReadError, ScriptFileEntry};
pub use registry::SessionRegistry;
pub use session::SyncSession;

/// High-level error type for session protocol operations.
///
/// Every request/response operation converts one of these into a structured
/// `{error}` acknowledgment; fire-and-forget paths log and swallow instead.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("script '{0}' is already initialized on this session")]
    AlreadyInitialized(String),
    #[error("script '{0}' was not found")]
    NotFound(String),
    #[error("path error: {0}")]
    Path(#[from] PathError),
    #[error("read error: {0}")]
    Read(#[from] ReadError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
