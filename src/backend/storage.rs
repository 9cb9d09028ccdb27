//! Attachment file storage
//!
//! The sync writes downloaded attachments through [`FileStore`]; the hosted
//! deployment plugs in its object store, development and tests use
//! [`LocalFileStore`].

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;

use crate::backend::error::BackendError;

#[async_trait]
pub trait FileStore: Send + Sync {
    /// Store `data` at the relative `path`, returning the stored size in bytes
    async fn put(&self, path: &str, data: Bytes, content_type: Option<&str>) -> Result<u64, BackendError>;

    async fn exists(&self, path: &str) -> Result<bool, BackendError>;
}

/// Files under a root directory on the local disk
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, BackendError> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if path.is_empty() || escapes {
            return Err(BackendError::invalid(format!("invalid storage path '{}'", path)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn put(&self, path: &str, data: Bytes, _content_type: Option<&str>) -> Result<u64, BackendError> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, &data).await?;
        tracing::debug!("Stored {} bytes at {}", data.len(), target.display());
        Ok(data.len() as u64)
    }

    async fn exists(&self, path: &str) -> Result<bool, BackendError> {
        let target = self.resolve(path)?;
        Ok(tokio::fs::try_exists(target).await?)
    }
}

/// Reduce a remote file name to characters safe in a storage path
///
/// Anything outside `[A-Za-z0-9._-]` becomes `_`; an empty result becomes
/// `file`.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}
