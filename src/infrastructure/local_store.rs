use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::ports::{FileStore, UploadedFile};

/// Stores uploads as flat files under a fixed directory; the reference is the
/// generated file name, served publicly under `/uploads/<reference>`.
pub struct LocalFileStore {
    dir: PathBuf,
}

impl LocalFileStore {
    /// Creates the upload directory if it does not exist yet.
    pub fn new(dir: &Path) -> io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Millisecond timestamp plus a random component, keeping the original
    /// extension so the file is served with the right content type.
    fn unique_name(original: &str) -> String {
        let ext = Path::new(original)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();
        format!(
            "{}_{}{}",
            Utc::now().timestamp_millis(),
            Uuid::new_v4().simple(),
            ext
        )
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn store(&self, files: Vec<UploadedFile>) -> Result<Vec<String>, DomainError> {
        let mut refs = Vec::with_capacity(files.len());
        for file in files {
            let name = Self::unique_name(&file.name);
            tokio::fs::write(self.dir.join(&name), &file.bytes)
                .await
                .map_err(|e| DomainError::Storage(format!("failed to write '{}': {}", name, e)))?;
            refs.push(name);
        }
        Ok(refs)
    }

    async fn delete(&self, reference: &str) -> Result<(), DomainError> {
        // References are bare generated file names; anything that could
        // escape the upload directory is rejected outright.
        if reference.is_empty()
            || reference.contains("..")
            || reference.contains('/')
            || reference.contains('\\')
        {
            return Err(DomainError::Storage(format!(
                "invalid file reference '{}'",
                reference
            )));
        }

        match tokio::fs::remove_file(self.dir.join(reference)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DomainError::Storage(format!(
                "failed to remove '{}': {}",
                reference, e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_writes_one_file_per_payload() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = LocalFileStore::new(tmp.path()).expect("store");

        let refs = store
            .store(vec![
                UploadedFile {
                    name: "photo.jpg".to_string(),
                    bytes: vec![1, 2, 3],
                },
                UploadedFile {
                    name: "scan.png".to_string(),
                    bytes: vec![4, 5],
                },
            ])
            .await
            .expect("store failed");

        assert_eq!(refs.len(), 2);
        assert!(refs[0].ends_with(".jpg"));
        assert!(refs[1].ends_with(".png"));
        assert_ne!(refs[0], refs[1]);
        assert_eq!(std::fs::read(tmp.path().join(&refs[0])).unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn name_without_extension_is_still_generated() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = LocalFileStore::new(tmp.path()).expect("store");

        let refs = store
            .store(vec![UploadedFile {
                name: "noext".to_string(),
                bytes: vec![0],
            }])
            .await
            .expect("store failed");
        assert!(!refs[0].contains('.'));
        assert!(tmp.path().join(&refs[0]).exists());
    }

    #[tokio::test]
    async fn delete_removes_file_and_tolerates_absence() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = LocalFileStore::new(tmp.path()).expect("store");

        let refs = store
            .store(vec![UploadedFile {
                name: "photo.jpg".to_string(),
                bytes: vec![1],
            }])
            .await
            .expect("store failed");

        store.delete(&refs[0]).await.expect("delete failed");
        assert!(!tmp.path().join(&refs[0]).exists());

        // Second delete of the same reference is a no-op, not an error.
        store.delete(&refs[0]).await.expect("repeat delete failed");
    }

    #[tokio::test]
    async fn delete_rejects_path_traversal() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = LocalFileStore::new(tmp.path()).expect("store");

        for bad in ["../etc/passwd", "a/b.jpg", "a\\b.jpg", ""] {
            assert!(store.delete(bad).await.is_err(), "accepted '{}'", bad);
        }
    }
}
