use crate::core::Storage;
use crate::utils::error::Result;
use std::io::ErrorKind;
use std::path::Path;

/// Writes output documents under a local directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }
}

impl Storage for LocalStorage {
    fn root(&self) -> &str {
        &self.base_path
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let full_path = Path::new(&self.base_path).join(path);
        Ok(tokio::fs::try_exists(full_path).await?)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = Path::new(&self.base_path).join(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(full_path, data).await?;
        Ok(())
    }

    async fn remove_root(&self) -> Result<()> {
        match tokio::fs::remove_dir_all(&self.base_path).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::TopologyError;
    use tempfile::{NamedTempFile, TempDir};

    #[tokio::test]
    async fn test_write_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("out");
        let storage = LocalStorage::new(root.to_string_lossy().to_string());

        assert!(!storage.exists("").await.unwrap());
        storage.write_file("data/trigger_init.json", b"{}").await.unwrap();
        assert!(storage.exists("data/trigger_init.json").await.unwrap());
        assert!(storage.exists("").await.unwrap());

        storage.remove_root().await.unwrap();
        assert!(!root.exists());
        // 已不存在也算成功
        storage.remove_root().await.unwrap();
    }

    #[tokio::test]
    async fn test_exists_reports_io_errors() {
        // 父路徑是一般檔案，stat 回傳 ENOTDIR 而非 NotFound
        let file = NamedTempFile::new().unwrap();
        let root = file.path().join("out");
        let storage = LocalStorage::new(root.to_string_lossy().to_string());

        let err = storage.exists("").await.unwrap_err();
        assert!(matches!(err, TopologyError::IoError(_)));
    }
}
