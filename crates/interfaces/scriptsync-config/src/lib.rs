//! Central configuration constants for runtime limits and defaults.

/// File name of the shared global declaration blob.
///
/// Both push and pull resolve their declaration write target through this
/// constant, so the two protocol paths can never drift apart.
pub const GLOBAL_DTS_FILE_NAME: &str = "global.d.ts";

/// File name of the shared scripting declaration blob.
pub const SCRIPTING_DTS_FILE_NAME: &str = "scripting.d.ts";

/// Preferred entry file opened in the editor after a successful push.
pub const ENTRY_FILE_NAME: &str = "main.ts";

/// Extensions that produce change notifications from the watcher.
pub const SYNCABLE_EXTENSIONS: &[&str] = &[
    "ts", "js", "json", "md", "txt", "xml", "html", "css",
];

/// Window during which rapid edits to the same file coalesce into a single
/// change notification (milliseconds).
pub const WATCH_DEBOUNCE_MS: u64 = 200;

/// Upper bound on how long a pending change may be held back while edits
/// keep arriving (milliseconds). A file written more often than the debounce
/// window still notifies at this cadence.
pub const WATCH_MAX_COALESCE_MS: u64 = 1_000;

/// Delay before the external editor open fires after a push, so the
/// acknowledgment is flushed to the client first (milliseconds).
pub const EDITOR_OPEN_DELAY_MS: u64 = 1_000;

/// Default port for the HTTP bridge.
pub const DEFAULT_PORT: u16 = 9317;

/// Minimum length of a script name.
pub const MIN_SCRIPT_NAME_LEN: usize = 2;

/// Whether a file extension is in the syncable set.
pub fn is_syncable_extension(ext: &str) -> bool {
    let ext = ext.to_ascii_lowercase();
    SYNCABLE_EXTENSIONS.iter().any(|e| *e == ext)
}
