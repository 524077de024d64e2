//! Shared declaration artifact store.
//!
//! Two named text blobs written to a fixed directory outside any script
//! directory, overwritten on every push and pull regardless of script
//! identity. Not versioned, not session-scoped; last writer wins.

use camino::Utf8PathBuf;
use scriptsync_config::{GLOBAL_DTS_FILE_NAME, SCRIPTING_DTS_FILE_NAME};
use std::fs;

#[derive(Debug, Clone)]
pub struct DtsStore {
    dir: Utf8PathBuf,
}

impl DtsStore {
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn global_path(&self) -> Utf8PathBuf {
        self.dir.join(GLOBAL_DTS_FILE_NAME)
    }

    pub fn scripting_path(&self) -> Utf8PathBuf {
        self.dir.join(SCRIPTING_DTS_FILE_NAME)
    }

    /// Overwrite both declaration files.
    pub fn write_all(&self, global_dts: &str, scripting_dts: &str) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.global_path(), global_dts)?;
        fs::write(self.scripting_path(), scripting_dts)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn utf8(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
    }

    #[test]
    fn writes_both_files_under_fixed_names() {
        let dir = TempDir::new().unwrap();
        let store = DtsStore::new(utf8(&dir).join("types"));
        store.write_all("global", "scripting").unwrap();

        assert_eq!(fs::read_to_string(store.global_path()).unwrap(), "global");
        assert_eq!(
            fs::read_to_string(store.scripting_path()).unwrap(),
            "scripting"
        );
    }

    #[test]
    fn overwrites_previous_content() {
        let dir = TempDir::new().unwrap();
        let store = DtsStore::new(utf8(&dir));
        store.write_all("v1", "v1").unwrap();
        store.write_all("v2", "v2").unwrap();

        assert_eq!(fs::read_to_string(store.global_path()).unwrap(), "v2");
    }
}
