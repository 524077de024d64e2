//! Wire payload shapes shared by the socket transport and the HTTP bridge.
//!
//! Request/response operations carry exactly one correlated acknowledgment;
//! the push-event shapes (`fileChange`, `deleteFile`) flow server-to-client
//! with no acknowledgment channel.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Client-to-server sync: the client sends the full file set of a script.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushRequest {
    pub script_name: String,
    /// relative path (forward slashes) -> full text content
    pub script_files: BTreeMap<String, String>,
    pub global_dts: String,
    pub scripting_dts: String,
}

/// Server-to-client sync: the client asks for a script already on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    pub script_name: String,
    pub global_dts: String,
    pub scripting_dts: String,
}

/// One file in a pull response: content plus the fingerprint the client uses
/// to decide what changed versus its local copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    pub hash: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullResponse {
    pub script_files: BTreeMap<String, RemoteFile>,
}

/// Server-to-client notification that a watched file changed on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChangeEvent {
    pub script_name: String,
    pub file_path: String,
    pub hash: String,
}

/// Server-to-client notification that a watched file or directory was removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFileEvent {
    pub script_name: String,
    pub file_path: String,
}

/// Fire-and-forget log relay from the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogMessage {
    pub script_name: String,
    pub content: String,
    pub is_error: bool,
}

/// Fire-and-forget request to open a script file in the desktop editor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenFileRequest {
    pub script_name: String,
    pub relative_path: String,
}
