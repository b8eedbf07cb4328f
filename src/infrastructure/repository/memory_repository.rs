use std::sync::Arc;
use async_trait::async_trait;

use crate::domain::entity::{TableEntity, TableId, UpdateTableRequest};
use crate::domain::page::{Page, PageRequest};
use crate::domain::repository::{RepositoryError, TableRepository};
use crate::infrastructure::storage::{MemoryStorage, StorageError};

/// インメモリリポジトリの実装
pub struct MemoryTableRepository {
    storage: Arc<MemoryStorage>,
}

impl MemoryTableRepository {
    pub fn new(storage: Arc<MemoryStorage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl TableRepository for MemoryTableRepository {
    async fn insert(&self, entity: TableEntity) -> Result<TableEntity, RepositoryError> {
        self.storage.insert_row(entity)
            .map_err(|e: StorageError| RepositoryError::from(e))
    }

    async fn find_by_id(&self, id: TableId) -> Result<Option<TableEntity>, RepositoryError> {
        self.storage.get_row(id)
            .map_err(|e: StorageError| RepositoryError::from(e))
    }

    async fn update(&self, id: TableId, request: UpdateTableRequest) -> Result<TableEntity, RepositoryError> {
        self.storage.update_row(id, request)
            .map_err(|e: StorageError| RepositoryError::from(e))
    }

    async fn find_page(&self, request: &PageRequest) -> Result<Page<TableEntity>, RepositoryError> {
        let (rows, total) = self.storage.select_rows(request.offset(), request.size())
            .map_err(|e: StorageError| RepositoryError::from(e))?;

        Ok(Page::new(rows, request, total))
    }

    async fn delete(&self, id: TableId) -> Result<bool, RepositoryError> {
        self.storage.delete_row(id)
            .map_err(|e: StorageError| RepositoryError::from(e))
    }
}

impl From<StorageError> for RepositoryError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::RowNotFound(id) => RepositoryError::NotFound(id),
            StorageError::UniqueViolation { value, .. } => RepositoryError::DuplicateName(value),
            StorageError::PrimaryKeyViolation(id) =>
                RepositoryError::StorageError(format!("PRIMARY KEY constraint violation for id {}", id)),
            StorageError::SequenceExhausted =>
                RepositoryError::StorageError("identifier sequence exhausted".to_string()),
            StorageError::Entity(e) => RepositoryError::Entity(e),
            StorageError::Internal(msg) => RepositoryError::InternalError(msg),
        }
    }
}
