//! Local filesystem storage implementation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::storage::ItemStorage;

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
    extension: String,
}

impl LocalStorage {
    /// Open storage rooted at `root_dir`, creating the directory if needed.
    ///
    /// Items are stored as `{id}.{extension}`.
    pub async fn open(root_dir: impl Into<PathBuf>, extension: impl Into<String>) -> Result<Self> {
        let root_dir = root_dir.into();
        tokio::fs::create_dir_all(&root_dir).await?;
        Ok(Self {
            root_dir,
            extension: extension.into(),
        })
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".part");
        let tmp = PathBuf::from(tmp);

        let written: std::io::Result<()> = async {
            let mut file = tokio::fs::File::create(&tmp).await?;
            file.write_all(bytes).await?;
            file.flush().await?;
            drop(file);
            tokio::fs::rename(&tmp, path).await
        }
        .await;

        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl ItemStorage for LocalStorage {
    fn path_for(&self, id: &str) -> PathBuf {
        let id = id.replace(['/', '\\'], "_");
        self.root_dir.join(format!("{}.{}", id, self.extension))
    }

    async fn contains(&self, id: &str) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.path_for(id)).await?)
    }

    async fn store(&self, id: &str, body: &[u8]) -> Result<PathBuf> {
        let path = self.path_for(id);
        self.write_bytes(&path, body).await?;
        log::trace!("Stored {} bytes at {}", body.len(), path.display());
        Ok(path)
    }
}
