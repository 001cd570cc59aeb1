// File system operations for backups
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid backup file name: {0}")]
    InvalidFileName(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Ensure a directory exists and return it
pub fn ensure_dir(dir: &Path) -> StorageResult<PathBuf> {
    fs::create_dir_all(dir)?;
    Ok(dir.to_path_buf())
}

/// Backup file name for a point in time, e.g. `IdeaJar_Backup_20240131_235959.json`
pub fn backup_file_name(at: DateTime<Utc>) -> String {
    format!("IdeaJar_Backup_{}.json", at.format("%Y%m%d_%H%M%S"))
}

/// Store a backup file in `dir` and return its path and SHA256 hash
pub fn store_backup(dir: &Path, filename: &str, data: &[u8]) -> StorageResult<(PathBuf, String)> {
    if filename.is_empty() || filename.contains(['/', '\\']) {
        return Err(StorageError::InvalidFileName(filename.to_string()));
    }

    let dir = ensure_dir(dir)?;
    let file_path = dir.join(filename);

    let mut file = fs::File::create(&file_path)?;
    file.write_all(data)?;
    file.sync_all()?;

    Ok((file_path, calculate_sha256(data)))
}

/// Read a file from disk
pub fn read_file(path: &Path) -> StorageResult<Vec<u8>> {
    Ok(fs::read(path)?)
}

/// Calculate SHA256 hash of data
pub fn calculate_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    #[test]
    fn test_calculate_sha256() {
        let data = b"hello world";
        let hash = calculate_sha256(data);
        assert_eq!(
            hash,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_backup_file_name() {
        let at = Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 58).unwrap();
        assert_eq!(backup_file_name(at), "IdeaJar_Backup_20240131_235958.json");
    }

    #[test]
    fn test_store_and_read_backup() {
        let dir = tempdir().unwrap();
        let backups = dir.path().join("backups");

        let (path, hash) = store_backup(&backups, "b.json", b"{}").unwrap();
        assert_eq!(path, backups.join("b.json"));
        assert_eq!(hash, calculate_sha256(b"{}"));
        assert_eq!(read_file(&path).unwrap(), b"{}");
    }

    #[test]
    fn test_rejects_path_like_names() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            store_backup(dir.path(), "../escape.json", b"{}"),
            Err(StorageError::InvalidFileName(_))
        ));
    }
}
