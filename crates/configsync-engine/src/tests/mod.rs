use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Create a temporary store directory
pub fn create_test_store_dir() -> TempDir {
    tempfile::tempdir().unwrap()
}

/// Create a file with content inside a test store directory
pub fn create_test_file(store_dir: &TempDir, filename: &str, content: &str) -> PathBuf {
    let file_path = store_dir.path().join(filename);
    fs::write(&file_path, content).unwrap();
    file_path
}
