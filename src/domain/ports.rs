use async_trait::async_trait;

use super::errors::DomainError;
use super::order::{OrderDraft, OrderPatch, OrderView};

/// One uploaded file payload with its client-supplied name.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

pub trait OrderRepository: Send + Sync + 'static {
    /// Insert one row; `images` is the already-joined reference list.
    /// Returns the assigned id.
    fn insert(&self, draft: OrderDraft, images: String) -> Result<i32, DomainError>;

    /// All rows, newest first.
    fn list(&self) -> Result<Vec<OrderView>, DomainError>;

    /// Apply a partial update inside a single transaction. Returns the image
    /// references the row no longer needs (non-empty only when the patch
    /// replaced them); `NotFound` when the id does not exist.
    fn update(&self, id: i32, patch: OrderPatch) -> Result<Vec<String>, DomainError>;

    /// Delete one row, returning the image references it held. A missing row
    /// is not an error and yields an empty list.
    fn delete(&self, id: i32) -> Result<Vec<String>, DomainError>;
}

/// Capability interface over interchangeable image stores.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Persist the payloads and return one durable reference per file, in
    /// input order.
    async fn store(&self, files: Vec<UploadedFile>) -> Result<Vec<String>, DomainError>;

    /// Remove a previously stored file. An already-absent file is success so
    /// that delete/update stay idempotent.
    async fn delete(&self, reference: &str) -> Result<(), DomainError>;
}
