//! Uploaded attachment storage on the local filesystem.
//!
//! Files are kept under their original (sanitized) name inside a
//! per-field directory and served back from `/storage`.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Extensions accepted for image uploads.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "avif", "bmp"];

/// Errors that can occur when storing an upload.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("file name is empty or invalid")]
    InvalidFileName,

    #[error("the file must be an image")]
    NotAnImage,

    #[error("the file is empty")]
    Empty,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Local attachment store rooted at a public directory.
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store an image upload in `directory`, returning its path relative
    /// to the storage root (e.g. `form-attachment/shoe.png`).
    ///
    /// An existing file of the same name is replaced.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the upload is not an image or cannot be
    /// written.
    pub async fn store_image(
        &self,
        directory: &str,
        file_name: &str,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<String, StorageError> {
        let name = sanitize_file_name(file_name)?;
        if !is_image(&name, content_type) {
            return Err(StorageError::NotAnImage);
        }
        if bytes.is_empty() {
            return Err(StorageError::Empty);
        }

        let dir = self.root.join(directory);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&name), bytes).await?;

        let relative = format!("{directory}/{name}");
        tracing::info!(path = %relative, size = bytes.len(), "Stored upload");
        Ok(relative)
    }
}

/// Reduce an uploaded file name to a safe single path segment.
///
/// Directory parts are dropped and anything outside `[A-Za-z0-9._-]`
/// becomes `-`.
///
/// # Errors
///
/// Returns `StorageError::InvalidFileName` if nothing usable is left.
pub fn sanitize_file_name(file_name: &str) -> Result<String, StorageError> {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
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
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.' || c == '-') {
        return Err(StorageError::InvalidFileName);
    }
    Ok(cleaned)
}

/// Whether the extension and declared content type both look like an image.
fn is_image(name: &str, content_type: Option<&str>) -> bool {
    let extension_ok = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
    let type_ok = content_type.is_none_or(|t| t.starts_with("image/"));
    extension_ok && type_ok
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("shoe.png").unwrap(), "shoe.png");
        assert_eq!(sanitize_file_name("../../etc/passwd").unwrap(), "passwd");
        assert_eq!(sanitize_file_name("C:\\pics\\red shoe.JPG").unwrap(), "red-shoe.JPG");
        assert_eq!(sanitize_file_name(".hidden.gif").unwrap(), "hidden.gif");
        assert!(matches!(
            sanitize_file_name(".."),
            Err(StorageError::InvalidFileName)
        ));
        assert!(matches!(sanitize_file_name(""), Err(StorageError::InvalidFileName)));
    }

    #[test]
    fn test_is_image() {
        assert!(is_image("a.webp", Some("image/webp")));
        assert!(is_image("a.JPEG", None));
        assert!(!is_image("a.pdf", Some("application/pdf")));
        assert!(!is_image("a.png", Some("text/html")));
        assert!(!is_image("png", None));
    }

    #[tokio::test]
    async fn test_store_image_writes_under_directory() {
        let root = std::env::temp_dir().join(format!("catalog-storage-{}", std::process::id()));
        let storage = Storage::new(&root);
        let path = storage
            .store_image("form-attachment", "shoe.png", Some("image/png"), b"png")
            .await
            .unwrap();
        assert_eq!(path, "form-attachment/shoe.png");
        assert_eq!(tokio::fs::read(root.join(&path)).await.unwrap(), b"png");

        let err = storage
            .store_image("form-attachment", "notes.txt", Some("text/plain"), b"x")
            .await;
        assert!(matches!(err, Err(StorageError::NotAnImage)));
        let _ = tokio::fs::remove_dir_all(&root).await;
    }
}
