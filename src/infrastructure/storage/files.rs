use std::path::PathBuf;

use async_trait::async_trait;
use mockall::automock;

use crate::errors::AppError;

/// Physical blob storage. Deletes are best-effort at every call site: a
/// failure is logged and must never block the owning record's deletion.
#[automock]
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn delete(&self, key: &str) -> Result<(), AppError>;
}

pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalFileStore { root: root.into() }
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn delete(&self, key: &str) -> Result<(), AppError> {
        // Keys migrated from external hosting are URLs; nothing to delete
        // locally for those.
        if key.starts_with("http://") || key.starts_with("https://") {
            return Ok(());
        }

        let path = self.root.join(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::InternalError(format!(
                "Failed to delete blob {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deleting_a_missing_blob_is_a_no_op() {
        let store = LocalFileStore::new(std::env::temp_dir());
        store.delete("no-such-blob.bin").await.unwrap();
    }

    #[tokio::test]
    async fn url_shaped_keys_are_skipped() {
        let store = LocalFileStore::new("/definitely/not/a/dir");
        store.delete("https://cdn.example.com/a.png").await.unwrap();
    }
}
