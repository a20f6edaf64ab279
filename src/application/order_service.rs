use std::sync::Arc;

use crate::domain::errors::DomainError;
use crate::domain::order::{join_references, OrderDraft, OrderPatch, OrderView};
use crate::domain::ports::{FileStore, OrderRepository, UploadedFile};

/// Orchestrates file storage and persistence for the four order operations.
///
/// Repository calls are synchronous (Diesel) and run on the blocking pool;
/// file-store calls are async. File cleanup always happens after the row
/// change has committed, using the reference list the repository captured
/// inside its transaction, so a failed update never leaves half-updated rows
/// and a successful one never orphans replaced files.
pub struct OrderService<R> {
    repo: Arc<R>,
    store: Arc<dyn FileStore>,
}

impl<R: OrderRepository> OrderService<R> {
    pub fn new(repo: Arc<R>, store: Arc<dyn FileStore>) -> Self {
        Self { repo, store }
    }

    pub async fn create_order(
        &self,
        draft: OrderDraft,
        files: Vec<UploadedFile>,
    ) -> Result<i32, DomainError> {
        let refs = if files.is_empty() {
            Vec::new()
        } else {
            self.store.store(files).await?
        };
        let images = join_references(&refs)?;

        let repo = Arc::clone(&self.repo);
        run_blocking(move || repo.insert(draft, images)).await
    }

    pub async fn list_orders(&self) -> Result<Vec<OrderView>, DomainError> {
        let repo = Arc::clone(&self.repo);
        run_blocking(move || repo.list()).await
    }

    pub async fn update_order(
        &self,
        id: i32,
        mut patch: OrderPatch,
        files: Vec<UploadedFile>,
    ) -> Result<(), DomainError> {
        let new_refs = if files.is_empty() {
            None
        } else {
            Some(self.store.store(files).await?)
        };
        patch.images = new_refs.clone();

        let repo = Arc::clone(&self.repo);
        match run_blocking(move || repo.update(id, patch)).await {
            Ok(replaced) => {
                self.discard_references(&replaced).await;
                Ok(())
            }
            Err(e) => {
                // The row was not touched; drop the files stored for this
                // request so they cannot become orphans.
                if let Some(refs) = new_refs {
                    self.discard_references(&refs).await;
                }
                Err(e)
            }
        }
    }

    pub async fn delete_order(&self, id: i32) -> Result<(), DomainError> {
        let repo = Arc::clone(&self.repo);
        let removed = run_blocking(move || repo.delete(id)).await?;
        self.discard_references(&removed).await;
        Ok(())
    }

    /// Best-effort removal; a failure here must not fail the operation the
    /// row change already committed for.
    async fn discard_references(&self, refs: &[String]) {
        for reference in refs {
            if let Err(e) = self.store.delete(reference).await {
                log::warn!("could not remove stored file '{}': {}", reference, e);
            }
        }
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, DomainError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, DomainError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| DomainError::Internal(e.to_string()))?
}
