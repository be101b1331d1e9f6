// File-backed persistence adapter

use crate::adapter::PersistenceAdapter;
use crate::codec;
use crate::models::Note;
use eyre::{Context, Result};
use fs2::FileExt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CURRENT_VERSION: u32 = 1;
const STORE_DIR: &str = ".notestore";
const NOTES_FILE: &str = "notes.json";
const LOCK_FILE: &str = ".lock";

/// Persists the collection as a JSON array in `<base>/.notestore/notes.json`
#[derive(Debug)]
pub struct FileAdapter {
    base_path: PathBuf,
}

impl FileAdapter {
    /// Open or create the adapter directory under the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let base_path = path.as_ref().join(STORE_DIR);

        fs::create_dir_all(&base_path).context("Failed to create store directory")?;

        let adapter = Self { base_path };
        adapter.write_version()?;

        debug!(path = ?adapter.base_path, "Opened file adapter");
        Ok(adapter)
    }

    /// Directory holding the notes file
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Path of the JSON notes file
    pub fn notes_path(&self) -> PathBuf {
        self.base_path.join(NOTES_FILE)
    }

    fn write_version(&self) -> Result<()> {
        let version_path = self.base_path.join(".version");
        if !version_path.exists() {
            fs::write(version_path, CURRENT_VERSION.to_string()).context("Failed to write version file")?;
        }
        Ok(())
    }
}

impl PersistenceAdapter for FileAdapter {
    fn load(&mut self) -> Result<Option<Vec<Note>>> {
        let path = self.notes_path();
        if !path.exists() {
            // Nothing saved yet
            return Ok(None);
        }

        let data = fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        let notes = codec::decode_notes(&data)?;

        info!(file = ?path, count = notes.len(), "Loaded notes from file");
        Ok(Some(notes))
    }

    fn save(&mut self, notes: &[Note]) -> Result<()> {
        let data = codec::encode_notes(notes)?;

        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.base_path.join(LOCK_FILE))
            .context("Failed to open lock file")?;

        // Acquire exclusive lock before writing
        lock.lock_exclusive().context("Failed to acquire file lock")?;

        // Write to a sibling file, then rename over the old one
        let path = self.notes_path();
        let tmp_path = self.base_path.join(format!("{}.tmp", NOTES_FILE));
        {
            let mut file = fs::File::create(&tmp_path).context("Failed to create temporary notes file")?;
            file.write_all(data.as_bytes()).context("Failed to write notes file")?;
            file.sync_all().context("Failed to sync notes file")?;
        }
        fs::rename(&tmp_path, &path).context("Failed to replace notes file")?;

        debug!(file = ?path, count = notes.len(), "Saved notes to file");

        // Lock is automatically released when file is dropped
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::note_at;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_directory() {
        let temp = TempDir::new().unwrap();

        let adapter = FileAdapter::open(temp.path()).unwrap();
        let store_path = temp.path().join(".notestore");
        assert!(store_path.exists());
        assert!(store_path.join(".version").exists());
        assert_eq!(adapter.base_path(), store_path);
    }

    #[test]
    fn test_load_without_file() {
        let temp = TempDir::new().unwrap();
        let mut adapter = FileAdapter::open(temp.path()).unwrap();

        assert!(adapter.load().unwrap().is_none());
    }

    #[test]
    fn test_save_and_reopen() {
        let temp = TempDir::new().unwrap();
        let notes = vec![note_at("a", "Disk", 1_000), note_at("b", "Backed", 2_000)];

        let mut adapter = FileAdapter::open(temp.path()).unwrap();
        adapter.save(&notes).unwrap();

        let content = fs::read_to_string(adapter.notes_path()).unwrap();
        assert!(content.starts_with('['));
        assert!(content.contains("\"createdAt\":\"1970-01-01T00:00:01.000Z\""));
        assert!(!temp.path().join(".notestore/notes.json.tmp").exists());

        let mut reopened = FileAdapter::open(temp.path()).unwrap();
        assert_eq!(reopened.load().unwrap().unwrap(), notes);
    }

    #[test]
    fn test_save_overwrites_previous_collection() {
        let temp = TempDir::new().unwrap();
        let mut adapter = FileAdapter::open(temp.path()).unwrap();

        adapter.save(&[note_at("a", "One", 1), note_at("b", "Two", 2)]).unwrap();
        adapter.save(&[note_at("b", "Two", 2)]).unwrap();

        let loaded = adapter.load().unwrap().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id(), "b");
    }

    #[test]
    fn test_save_error_names_failed_step() {
        let temp = TempDir::new().unwrap();
        let mut adapter = FileAdapter::open(temp.path()).unwrap();

        // A directory where the notes file should go makes the final rename fail
        fs::create_dir_all(adapter.notes_path().join("blocker")).unwrap();

        let err = adapter.save(&[note_at("a", "One", 1)]).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to replace notes file"));
    }

    #[test]
    fn test_load_malformed_file() {
        let temp = TempDir::new().unwrap();
        let mut adapter = FileAdapter::open(temp.path()).unwrap();
        fs::write(adapter.notes_path(), "{malformed json}").unwrap();

        assert!(adapter.load().is_err());
    }
}
