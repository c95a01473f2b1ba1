//! Local filesystem image store

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use tracing::{debug, warn};

use crate::domain::DomainError;

/// Public URL prefix under which stored images are served
pub const PUBLIC_PREFIX: &str = "/images";

/// Storage for uploaded binary images
#[async_trait]
pub trait ImageStore: Send + Sync + std::fmt::Debug {
    /// Persist an upload and return its public relative path
    async fn save(&self, original_name: &str, data: Bytes) -> Result<String, DomainError>;

    /// Remove a previously saved image by its public path
    async fn delete(&self, public_path: &str) -> Result<bool, DomainError>;
}

/// Writes uploads as `<unix-millis>-<sanitized name>` into one directory
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    dir: PathBuf,
    max_bytes: usize,
}

impl LocalImageStore {
    pub fn new(dir: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            dir: dir.into(),
            max_bytes,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn save(&self, original_name: &str, data: Bytes) -> Result<String, DomainError> {
        if data.is_empty() {
            return Err(DomainError::validation("Uploaded image is empty"));
        }

        if data.len() > self.max_bytes {
            return Err(DomainError::validation(format!(
                "Uploaded image exceeds {} bytes",
                self.max_bytes
            )));
        }

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to create upload dir: {}", e)))?;

        let file_name = format!(
            "{}-{}",
            Utc::now().timestamp_millis(),
            sanitize_file_name(original_name)
        );

        tokio::fs::write(self.dir.join(&file_name), &data)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to write image: {}", e)))?;

        debug!(file = %file_name, bytes = data.len(), "Image stored");
        Ok(format!("{}/{}", PUBLIC_PREFIX, file_name))
    }

    async fn delete(&self, public_path: &str) -> Result<bool, DomainError> {
        let Some(name) = public_path.strip_prefix(PUBLIC_PREFIX).map(|n| n.trim_start_matches('/'))
        else {
            return Ok(false);
        };

        if name.is_empty() || name != sanitize_file_name(name) {
            warn!(path = %public_path, "Refusing to delete image outside upload dir");
            return Ok(false);
        }

        match tokio::fs::remove_file(self.dir.join(name)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(DomainError::storage(format!("Failed to delete image: {}", e))),
        }
    }
}

/// Keep the last path component and only `[A-Za-z0-9._-]`
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(|c| c == '/' || c == '\\').next().unwrap_or("");

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}
