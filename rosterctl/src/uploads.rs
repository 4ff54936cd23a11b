//! Profile image storage.
//!
//! Images are written under the configured uploads directory with generated
//! names (`<uuid>.<ext>`), so client-supplied filenames never touch the
//! filesystem. The store hands back the public `/uploads/<name>` path that is
//! persisted on the user record and served by the static file route.

use std::path::PathBuf;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::api::extract::ImagePart;
use crate::config::UploadConfig;
use crate::errors::{Error, Result};

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Public URL prefix under which stored images are served.
pub const PUBLIC_PREFIX: &str = "/uploads/";

#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
    max_bytes: u64,
}

fn extension_from(part: &ImagePart) -> Option<String> {
    if let Some(name) = &part.file_name
        && let Some((_, ext)) = name.rsplit_once('.')
    {
        return Some(ext.to_ascii_lowercase());
    }
    // Fall back to the declared content type for clients that upload blobs
    match part.content_type.as_deref() {
        Some("image/jpeg") => Some("jpg".to_string()),
        Some("image/png") => Some("png".to_string()),
        Some("image/gif") => Some("gif".to_string()),
        Some("image/webp") => Some("webp".to_string()),
        _ => None,
    }
}

impl UploadStore {
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            root: config.dir.clone(),
            max_bytes: config.max_file_size,
        }
    }

    /// Store an uploaded image and return its public path.
    #[instrument(skip(self, part), fields(size = part.data.len()), err)]
    pub async fn store_image(&self, part: &ImagePart) -> Result<String> {
        if part.data.len() as u64 > self.max_bytes {
            return Err(Error::PayloadTooLarge {
                message: format!("Image exceeds maximum allowed size of {} bytes", self.max_bytes),
            });
        }
        if part.data.is_empty() {
            return Err(Error::BadRequest {
                message: "Uploaded image is empty".to_string(),
            });
        }

        let extension = extension_from(part)
            .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
            .ok_or_else(|| Error::BadRequest {
                message: "Only image files are allowed (jpg, jpeg, png, gif, webp)".to_string(),
            })?;

        let name = format!("{}.{extension}", Uuid::new_v4());

        tokio::fs::create_dir_all(&self.root).await.map_err(|e| Error::Internal {
            operation: format!("create uploads directory: {e}"),
        })?;
        tokio::fs::write(self.root.join(&name), part.data.clone())
            .await
            .map_err(|e| Error::Internal {
                operation: format!("write uploaded image: {e}"),
            })?;

        Ok(format!("{PUBLIC_PREFIX}{name}"))
    }

    /// Remove a stored image by its public path. Best effort: a missing file
    /// is not an error, and failures are logged rather than surfaced since
    /// removal always accompanies a larger operation that already succeeded.
    #[instrument(skip(self))]
    pub async fn remove(&self, public_path: &str) {
        let Some(name) = public_path.strip_prefix(PUBLIC_PREFIX) else {
            return;
        };
        // Stored names are generated UUIDs; anything with a path separator
        // did not come from this store.
        if name.contains('/') || name.contains("..") {
            return;
        }
        if let Err(e) = tokio::fs::remove_file(self.root.join(name)).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!("Failed to remove uploaded image {public_path}: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn store(dir: &std::path::Path) -> UploadStore {
        UploadStore {
            root: dir.to_path_buf(),
            max_bytes: 1024,
        }
    }

    fn image(file_name: Option<&str>, content_type: Option<&str>, data: &[u8]) -> ImagePart {
        ImagePart {
            file_name: file_name.map(str::to_string),
            content_type: content_type.map(str::to_string),
            data: Bytes::copy_from_slice(data),
        }
    }

    #[tokio::test]
    async fn test_store_and_remove_image() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        let path = store.store_image(&image(Some("avatar.PNG"), None, b"fake-png")).await.unwrap();
        assert!(path.starts_with("/uploads/"));
        assert!(path.ends_with(".png"));

        let name = path.strip_prefix("/uploads/").unwrap();
        assert!(dir.path().join(name).exists());

        store.remove(&path).await;
        assert!(!dir.path().join(name).exists());
    }

    #[tokio::test]
    async fn test_extension_fallback_to_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        let path = store.store_image(&image(None, Some("image/jpeg"), b"fake-jpg")).await.unwrap();
        assert!(path.ends_with(".jpg"));
    }

    #[tokio::test]
    async fn test_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        let err = store.store_image(&image(Some("payload.exe"), None, b"bytes")).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_rejects_oversized_image() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        let big = vec![0u8; 2048];
        let err = store.store_image(&image(Some("big.png"), None, &big)).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_remove_ignores_foreign_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        // Neither of these should panic or touch anything outside the root
        store.remove("/etc/passwd").await;
        store.remove("/uploads/../escape.png").await;
        store.remove("/uploads/does-not-exist.png").await;
    }
}
