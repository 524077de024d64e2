//! External desktop-editor collaborator.

use std::process::{Command, Stdio};

use camino::Utf8Path;
use scriptsync_session::EditorPort;
use tracing::debug;

/// Opens files by spawning a configurable editor command (default: `code`).
/// The spawn is detached; the session never waits on the editor process.
pub struct CommandEditor {
    program: String,
}

impl CommandEditor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for CommandEditor {
    fn default() -> Self {
        Self::new("code")
    }
}

impl EditorPort for CommandEditor {
    fn open(&self, path: &Utf8Path) -> anyhow::Result<()> {
        debug!("Opening {} with '{}'", path, self.program);
        Command::new(&self.program)
            .arg(path.as_str())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        Ok(())
    }
}
