//! Recursive script directory export.
//!
//! Produces a flat map of relative path -> content + fingerprint for a pull
//! response. This is a best-effort export: an unreadable individual file is
//! logged and omitted rather than failing the whole traversal.

use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use rayon::prelude::*;
use scriptsync_core::{fingerprint, paths};
use tracing::warn;
use walkdir::WalkDir;

/// One exported file at observation time. Never cached across operations;
/// each read recomputes the fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptFileEntry {
    pub content: String,
    pub hash: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("script directory '{0}' does not exist")]
    NotFound(Utf8PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Subtrees excluded from export and from change-event emission.
fn is_excluded(name: &str) -> bool {
    name.starts_with(".git") || name.starts_with(".vscode")
}

/// Recursively read every file under `root` into a relative-path keyed map.
pub fn read_all(root: &Utf8Path) -> Result<BTreeMap<String, ScriptFileEntry>, ReadError> {
    if !root.is_dir() {
        return Err(ReadError::NotFound(root.to_owned()));
    }

    let files: Vec<Utf8PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| {
            e.file_name()
                .to_str()
                .map(|n| !is_excluded(n))
                .unwrap_or(false)
        })
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| Utf8PathBuf::from_path_buf(e.path().to_path_buf()).ok())
        .collect();

    // Sibling files fan out in parallel; keys are unique by construction so
    // aggregation order does not matter.
    let entries: Vec<(String, ScriptFileEntry)> = files
        .par_iter()
        .filter_map(|path| {
            let rel = path.strip_prefix(root).ok()?;
            let rel = paths::normalize(rel.as_str());
            match std::fs::read_to_string(path) {
                Ok(content) => {
                    let hash = fingerprint(&content);
                    Some((rel, ScriptFileEntry { content, hash }))
                }
                Err(e) => {
                    warn!("Skipping unreadable file {}: {}", path, e);
                    None
                }
            }
        })
        .collect();

    Ok(entries.into_iter().collect())
}
