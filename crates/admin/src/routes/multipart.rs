//! Multipart form bodies.
//!
//! Forms post as `multipart/form-data` so image fields can carry files.
//! Text parts become `(name, value)` pairs for [`FormState::from_pairs`];
//! file parts are kept aside and only written to storage on submit.

use axum::body::Bytes;
use axum::extract::Multipart;

use crate::error::AppError;
use crate::resource::{FieldErrors, FieldKind, FormSchema, FormState};
use crate::services::{Storage, StorageError};

/// A file part.
#[derive(Debug)]
pub struct Upload {
    pub field: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// A parsed form body.
#[derive(Debug, Default)]
pub struct Submitted {
    pub pairs: Vec<(String, String)>,
    pub uploads: Vec<Upload>,
}

impl Submitted {
    /// Read every part. File inputs left empty are dropped.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if the body is not valid multipart.
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut submitted = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            let Some(name) = field.name().map(ToString::to_string) else {
                continue;
            };
            if let Some(file_name) = field.file_name().map(ToString::to_string) {
                let content_type = field.content_type().map(ToString::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                submitted.uploads.push(Upload {
                    field: name,
                    file_name,
                    content_type,
                    bytes,
                });
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                submitted.pairs.push((name, value));
            }
        }
        Ok(submitted)
    }

    /// First value of a control key such as `_changed`.
    #[must_use]
    pub fn control(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty())
    }

    /// Write uploads for the schema's image fields and record their stored
    /// paths as the field values. Refused files become field errors;
    /// uploads for unknown fields are ignored.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Upload` if a file cannot be written.
    pub async fn store_uploads(
        &mut self,
        schema: &FormSchema,
        storage: &Storage,
    ) -> Result<FieldErrors, AppError> {
        let mut errors = FieldErrors::new();
        for upload in std::mem::take(&mut self.uploads) {
            let Some(field) = schema.field(&upload.field) else {
                continue;
            };
            let FieldKind::Image { directory } = field.kind else {
                continue;
            };
            match storage
                .store_image(
                    directory,
                    &upload.file_name,
                    upload.content_type.as_deref(),
                    &upload.bytes,
                )
                .await
            {
                Ok(path) => self.pairs.push((upload.field, path)),
                Err(StorageError::Io(e)) => return Err(StorageError::Io(e).into()),
                Err(e) => errors.add(field.name, upload_message(&field.label, &e)),
            }
        }
        Ok(errors)
    }

    /// Form values, without control keys.
    #[must_use]
    pub fn state(&self) -> FormState {
        FormState::from_pairs(&self.pairs)
    }
}

fn upload_message(label: &str, error: &StorageError) -> String {
    let label = label.to_lowercase();
    match error {
        StorageError::NotAnImage => format!("The {label} field must be an image."),
        StorageError::Empty => format!("The {label} field must not be empty."),
        StorageError::InvalidFileName | StorageError::Io(_) => {
            format!("The {label} field failed to upload.")
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::resource::SlugPolicy;
    use crate::resources;

    fn upload(field: &str, file_name: &str, content_type: &str, bytes: &'static [u8]) -> Upload {
        Upload {
            field: field.to_string(),
            file_name: file_name.to_string(),
            content_type: Some(content_type.to_string()),
            bytes: Bytes::from_static(bytes),
        }
    }

    #[test]
    fn test_control_skips_empty_values() {
        let submitted = Submitted {
            pairs: vec![
                ("_changed".to_string(), String::new()),
                ("_operation".to_string(), "edit".to_string()),
            ],
            uploads: Vec::new(),
        };
        assert_eq!(submitted.control("_changed"), None);
        assert_eq!(submitted.control("_operation"), Some("edit"));
    }

    #[tokio::test]
    async fn test_store_uploads_sets_paths_and_rejects_non_images() {
        let root = std::env::temp_dir().join(format!("catalog-upload-{}", std::process::id()));
        let storage = Storage::new(&root);
        let panel = resources::panel(SlugPolicy::Always).unwrap();
        let products = panel.get(crate::resource::ResourceKind::Products).unwrap();

        let mut submitted = Submitted {
            pairs: vec![("name".to_string(), "Shoe".to_string())],
            uploads: vec![
                upload("image", "shoe.png", "image/png", b"\x89PNG"),
                upload("unknown", "x.png", "image/png", b"\x89PNG"),
            ],
        };
        let errors = submitted.store_uploads(&products.form, &storage).await.unwrap();
        assert!(errors.is_empty());
        assert_eq!(submitted.state().text("image"), Some("form-attachment/shoe.png"));
        assert!(!submitted.state().contains("unknown"));

        let mut rejected = Submitted {
            pairs: Vec::new(),
            uploads: vec![upload("image", "notes.txt", "text/plain", b"hello")],
        };
        let errors = rejected.store_uploads(&products.form, &storage).await.unwrap();
        assert_eq!(errors.first("image"), Some("The image field must be an image."));

        let _ = tokio::fs::remove_dir_all(&root).await;
    }
}
