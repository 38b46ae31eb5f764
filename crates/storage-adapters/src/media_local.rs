//! # Local media storage
//!
//! Writes uploads under a root directory and serves them through a public
//! URL prefix (the API mounts the same directory with `ServeDir`).

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use mime::Mime;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use domains::{DomainError, DomainResult, MediaStorage, ProgressCallback};

/// Bytes written between progress reports
const CHUNK_SIZE: usize = 64 * 1024;

pub struct LocalMediaStorage {
    /// Root directory for all uploads (e.g., "./data/media")
    root_path: PathBuf,
    /// Public URL prefix (e.g., "/media")
    url_prefix: String,
}

impl LocalMediaStorage {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        let url_prefix: String = url_prefix.into();
        Self {
            root_path: root.into(),
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        }
    }

    /// Resolves a storage key to a file under the root, refusing anything
    /// that could escape it.
    fn resolve(&self, key: &str) -> DomainResult<PathBuf> {
        let relative = Path::new(key);
        let clean = !key.is_empty()
            && relative
                .components()
                .all(|part| matches!(part, Component::Normal(_)));
        if !clean {
            return Err(DomainError::Validation(format!("invalid media key: {key}")));
        }
        Ok(self.root_path.join(relative))
    }

    fn key_for_url<'a>(&self, url: &'a str) -> DomainResult<&'a str> {
        url.strip_prefix(&self.url_prefix)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| DomainError::Validation(format!("not a local media url: {url}")))
    }
}

#[async_trait]
impl MediaStorage for LocalMediaStorage {
    async fn put_object(
        &self,
        key: &str,
        content_type: &Mime,
        data: Bytes,
        progress: Option<ProgressCallback>,
    ) -> DomainResult<String> {
        let target = self.resolve(key)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await.map_err(DomainError::internal)?;
        }

        let mut file = fs::File::create(&target).await.map_err(DomainError::internal)?;
        let total = data.len();
        let mut written = 0usize;
        for chunk in data.chunks(CHUNK_SIZE) {
            file.write_all(chunk).await.map_err(DomainError::internal)?;
            written += chunk.len();
            if let Some(report) = &progress {
                report(written as f32 / total as f32 * 100.0);
            }
        }
        file.flush().await.map_err(DomainError::internal)?;
        if total == 0 {
            if let Some(report) = &progress {
                report(100.0);
            }
        }

        debug!(%key, %content_type, size = total, "media written");
        Ok(format!("{}/{}", self.url_prefix, key))
    }

    async fn delete_object(&self, url: &str) -> DomainResult<()> {
        let target = self.resolve(self.key_for_url(url)?)?;
        match fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                warn!(%url, "media already gone");
                Ok(())
            }
            Err(err) => Err(DomainError::internal(err)),
        }
    }
}
