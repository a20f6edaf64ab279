use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

use crate::domain::errors::DomainError;
use crate::domain::ports::{FileStore, UploadedFile};

/// Formats the image host accepts.
const ALLOWED_FORMATS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif"];

/// Logical folder every upload lands in on the host.
const UPLOAD_FOLDER: &str = "orders";

/// Forwards uploads to an external image-host API; the reference is the
/// access URL the host returns. Objects are never deleted from the host:
/// rows referencing them simply drop the URL, and the orphaned objects are
/// accepted as a cost/simplicity tradeoff.
pub struct RemoteImageStore {
    client: reqwest::Client,
    upload_url: String,
    api_key: String,
    api_secret: String,
}

impl RemoteImageStore {
    pub fn new(api_base: &str, account: &str, api_key: String, api_secret: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            upload_url: format!("{}/{}/image/upload", api_base.trim_end_matches('/'), account),
            api_key,
            api_secret,
        }
    }

    fn check_format(name: &str) -> Result<(), DomainError> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        if ALLOWED_FORMATS.contains(&ext.as_str()) {
            Ok(())
        } else {
            Err(DomainError::Storage(format!(
                "unsupported image format '{}' (allowed: {})",
                name,
                ALLOWED_FORMATS.join(", ")
            )))
        }
    }
}

#[async_trait]
impl FileStore for RemoteImageStore {
    async fn store(&self, files: Vec<UploadedFile>) -> Result<Vec<String>, DomainError> {
        for file in &files {
            Self::check_format(&file.name)?;
        }

        let mut refs = Vec::with_capacity(files.len());
        for file in files {
            let mime = mime_guess::from_path(&file.name)
                .first_or_octet_stream()
                .to_string();
            let part = Part::bytes(file.bytes)
                .file_name(file.name.clone())
                .mime_str(&mime)
                .map_err(|e| DomainError::Storage(e.to_string()))?;
            let form = Form::new()
                .part("file", part)
                .text("folder", UPLOAD_FOLDER)
                .text("api_key", self.api_key.clone());

            let resp = self
                .client
                .post(&self.upload_url)
                .basic_auth(&self.api_key, Some(&self.api_secret))
                .multipart(form)
                .send()
                .await
                .map_err(|e| DomainError::Storage(format!("upload request failed: {}", e)))?;

            if !resp.status().is_success() {
                return Err(DomainError::Storage(format!(
                    "image host rejected upload with status {}",
                    resp.status()
                )));
            }

            let body: serde_json::Value = resp
                .json()
                .await
                .map_err(|e| DomainError::Storage(format!("invalid upload response: {}", e)))?;
            let url = body
                .get("secure_url")
                .or_else(|| body.get("url"))
                .and_then(|v| v.as_str())
                .ok_or_else(|| {
                    DomainError::Storage("upload response missing access url".to_string())
                })?;

            refs.push(url.to_string());
        }
        Ok(refs)
    }

    async fn delete(&self, reference: &str) -> Result<(), DomainError> {
        // Remote objects are left in place; see the type-level docs.
        log::debug!("leaving remote object in place: {}", reference);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> RemoteImageStore {
        RemoteImageStore::new(
            "https://images.example.test",
            "acct",
            "key".to_string(),
            "secret".to_string(),
        )
    }

    #[tokio::test]
    async fn rejects_disallowed_format_before_any_request() {
        let err = store()
            .store(vec![UploadedFile {
                name: "notes.txt".to_string(),
                bytes: vec![1, 2],
            }])
            .await
            .expect_err("txt should be rejected");
        assert!(err.to_string().contains("unsupported image format"));
    }

    #[tokio::test]
    async fn extension_check_is_case_insensitive() {
        assert!(RemoteImageStore::check_format("photo.JPG").is_ok());
        assert!(RemoteImageStore::check_format("photo").is_err());
    }

    #[tokio::test]
    async fn delete_is_a_successful_no_op() {
        store()
            .delete("https://images.example.test/acct/orders/x.jpg")
            .await
            .expect("remote delete must not fail");
    }

    #[test]
    fn upload_url_is_derived_from_base_and_account() {
        assert_eq!(
            store().upload_url,
            "https://images.example.test/acct/image/upload"
        );
    }
}
