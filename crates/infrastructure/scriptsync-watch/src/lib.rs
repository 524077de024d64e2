//! Filesystem-notification and editor infrastructure behind the session's
//! capability traits.

pub mod editor;
pub mod watcher;

pub use editor::CommandEditor;
pub use watcher::{DirectoryWatcher, NotifyWatcherFactory};
