use chrono::{DateTime, Utc};
use relative_path::RelativePath;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid state file: {0}")]
    StateParse(#[from] toml::de::Error),
    #[error("Could not encode state: {0}")]
    StateEncode(#[from] toml::ser::Error),
}

/// Read a file under `root`
pub fn read_file(relative_path: &RelativePath, root: &Path) -> Result<String, IoError> {
    let absolute_path = relative_path.to_path(root);
    if !absolute_path.exists() {
        return Err(IoError::NotFound(absolute_path));
    }
    fs::read_to_string(&absolute_path).map_err(IoError::Io)
}

/// Write a file under `root`, creating parent directories
pub fn write_file(relative_path: &RelativePath, root: &Path, content: &str) -> Result<(), IoError> {
    let absolute_path = relative_path.to_path(root);

    if let Some(parent) = absolute_path.parent() {
        fs::create_dir_all(parent).map_err(IoError::Io)?;
    }

    fs::write(&absolute_path, content).map_err(IoError::Io)
}

/// The two documents kept in a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    Config,
    Keywords,
}

impl BufferKind {
    pub fn file_name(self) -> &'static str {
        match self {
            BufferKind::Config => "config.yaml",
            BufferKind::Keywords => "frequency_words.txt",
        }
    }
}

const STATE_FILE: &str = "state.toml";

/// Save timestamps, persisted next to the documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_saved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords_saved_at: Option<DateTime<Utc>>,
}

impl SavedState {
    pub fn saved_at(&self, kind: BufferKind) -> Option<DateTime<Utc>> {
        match kind {
            BufferKind::Config => self.config_saved_at,
            BufferKind::Keywords => self.keywords_saved_at,
        }
    }

    fn set(&mut self, kind: BufferKind, at: DateTime<Utc>) {
        match kind {
            BufferKind::Config => self.config_saved_at = Some(at),
            BufferKind::Keywords => self.keywords_saved_at = Some(at),
        }
    }
}

/// Directory-backed store for the last-saved texts and their timestamps.
#[derive(Debug, Clone)]
pub struct StateStore {
    root: PathBuf,
}

impl StateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Last saved text, or `None` if it was never saved.
    pub fn load(&self, kind: BufferKind) -> Result<Option<String>, IoError> {
        match read_file(RelativePath::new(kind.file_name()), &self.root) {
            Ok(text) => Ok(Some(text)),
            Err(IoError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn save(&self, kind: BufferKind, text: &str, at: DateTime<Utc>) -> Result<(), IoError> {
        write_file(RelativePath::new(kind.file_name()), &self.root, text)?;
        let mut state = self.state()?;
        state.set(kind, at);
        write_file(
            RelativePath::new(STATE_FILE),
            &self.root,
            &toml::to_string(&state)?,
        )?;
        log::info!("saved {} ({} bytes)", kind.file_name(), text.len());
        Ok(())
    }

    pub fn state(&self) -> Result<SavedState, IoError> {
        match read_file(RelativePath::new(STATE_FILE), &self.root) {
            Ok(text) => Ok(toml::from_str(&text)?),
            Err(IoError::NotFound(_)) => Ok(SavedState::default()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{create_test_file, create_test_store_dir};
    use chrono::TimeZone;

    #[test]
    fn test_read_file_not_found() {
        let dir = create_test_store_dir();
        let result = read_file(RelativePath::new("nonexistent.yaml"), dir.path());
        assert!(matches!(result, Err(IoError::NotFound(_))));
    }

    #[test]
    fn test_write_file_creates_parent_directories() {
        let dir = create_test_store_dir();
        let relative_path = RelativePath::new("nested/deeper/config.yaml");

        write_file(relative_path, dir.path(), "app: {}\n").unwrap();

        assert_eq!(read_file(relative_path, dir.path()).unwrap(), "app: {}\n");
        assert!(dir.path().join("nested").join("deeper").is_dir());
    }

    #[test]
    fn test_missing_documents_load_as_none() {
        let dir = create_test_store_dir();
        let store = StateStore::new(dir.path());
        assert_eq!(store.load(BufferKind::Config).unwrap(), None);
        assert_eq!(store.state().unwrap(), SavedState::default());
    }

    #[test]
    fn test_save_records_timestamp() {
        let dir = create_test_store_dir();
        let store = StateStore::new(dir.path().join("store"));
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap();

        store.save(BufferKind::Keywords, "[WORD_GROUPS]\n", at).unwrap();

        assert_eq!(
            store.load(BufferKind::Keywords).unwrap().as_deref(),
            Some("[WORD_GROUPS]\n")
        );
        let state = store.state().unwrap();
        assert_eq!(state.saved_at(BufferKind::Keywords), Some(at));
        assert_eq!(state.saved_at(BufferKind::Config), None);

        let raw = std::fs::read_to_string(dir.path().join("store").join(STATE_FILE)).unwrap();
        assert!(raw.contains("2026-03-01T12:30:00Z"));
    }

    #[test]
    fn test_corrupt_state_is_an_error() {
        let dir = create_test_store_dir();
        create_test_file(&dir, STATE_FILE, "config_saved_at = [");
        let store = StateStore::new(dir.path());
        assert!(matches!(store.state(), Err(IoError::StateParse(_))));
    }
}
