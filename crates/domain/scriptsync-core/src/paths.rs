//! Script name validation and path resolution under the managed root.

use camino::{Utf8Path, Utf8PathBuf};
use scriptsync_config::MIN_SCRIPT_NAME_LEN;

#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("invalid script name '{0}'")]
    InvalidName(String),
    #[error("relative path '{0}' escapes the script directory")]
    Traversal(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Standardize directory separators to forward slashes.
/// This is the wire format for script file map keys and change notifications.
pub fn normalize(path: &str) -> String {
    path.replace('\\', "/")
}

/// A script name is a letter followed by letters, digits, `-` or `_`.
pub fn is_valid_script_name(name: &str) -> bool {
    if name.len() < MIN_SCRIPT_NAME_LEN {
        return false;
    }
    let mut chars = name.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return false,
    };
    first.is_ascii_alphabetic()
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Reject relative paths that could resolve outside the script directory.
pub fn verify_safe(rel_path: &str) -> bool {
    let p = std::path::Path::new(rel_path);
    !p.is_absolute()
        && !p
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir))
}

/// The managed root directory all script directories live under.
///
/// Pure path arithmetic; directory creation is a separate, idempotent
/// operation invoked by callers.
#[derive(Debug, Clone)]
pub struct ScriptRoot {
    root: Utf8PathBuf,
}

impl ScriptRoot {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a script name to its absolute directory.
    pub fn script_dir(&self, script_name: &str) -> Result<Utf8PathBuf, PathError> {
        if !is_valid_script_name(script_name) {
            return Err(PathError::InvalidName(script_name.to_string()));
        }
        Ok(self.root.join(script_name))
    }

    /// Resolve a relative path inside a script directory.
    pub fn script_file(
        &self,
        script_name: &str,
        relative_path: &str,
    ) -> Result<Utf8PathBuf, PathError> {
        let dir = self.script_dir(script_name)?;
        let normalized = normalize(relative_path);
        if normalized.is_empty() || !verify_safe(&normalized) {
            return Err(PathError::Traversal(relative_path.to_string()));
        }
        Ok(dir.join(normalized))
    }

    /// Idempotent recursive mkdir.
    pub fn ensure_dir(path: &Utf8Path) -> Result<(), PathError> {
        std::fs::create_dir_all(path)?;
        Ok(())
    }
}
