use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::entity::{CreateTableRequest, Table, TableEntity, TableId, UpdateTableRequest};
use crate::domain::page::{Page, PageRequest};
use crate::domain::repository::{RepositoryError, TableRepository};
use crate::{Error, Result};

/// Tableリソースに対する永続化操作（HTTP層と永続化層の境界）
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TableService: Send + Sync {
    async fn create_table(&self, request: CreateTableRequest) -> Result<Table>;

    async fn update_table(&self, id: TableId, request: UpdateTableRequest) -> Result<Table>;

    async fn find_table(&self, id: TableId) -> Result<Table>;

    async fn find_all_tables(&self, request: PageRequest) -> Result<Page<Table>>;

    /// 削除した行の識別子を返す。存在しなければ`Error::NotFound`
    async fn delete_table(&self, id: TableId) -> Result<TableId>;
}

/// リポジトリを使う標準のサービス実装
pub struct DefaultTableService {
    repository: Arc<dyn TableRepository>,
}

impl DefaultTableService {
    pub fn new(repository: Arc<dyn TableRepository>) -> Self {
        Self { repository }
    }

    async fn load(&self, id: TableId) -> Result<TableEntity> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(id).into())
    }
}

fn to_view(entity: &TableEntity) -> Result<Table> {
    entity
        .to_view()
        .map_err(|e| Error::from(RepositoryError::from(e)))
}

#[async_trait]
impl TableService for DefaultTableService {
    async fn create_table(&self, request: CreateTableRequest) -> Result<Table> {
        let saved = self
            .repository
            .insert(TableEntity::from_request(request))
            .await?;
        let table = to_view(&saved)?;
        info!(id = table.id, name = %table.name, "table created");
        Ok(table)
    }

    async fn update_table(&self, id: TableId, request: UpdateTableRequest) -> Result<Table> {
        let saved = self.repository.update(id, request).await?;
        let table = to_view(&saved)?;
        info!(id = table.id, name = %table.name, "table updated");
        Ok(table)
    }

    async fn find_table(&self, id: TableId) -> Result<Table> {
        let entity = self.load(id).await?;
        debug!(id, "table found");
        to_view(&entity)
    }

    async fn find_all_tables(&self, request: PageRequest) -> Result<Page<Table>> {
        let page = self.repository.find_page(&request).await?;
        debug!(
            page = page.page,
            size = page.size,
            total = page.total_elements,
            "tables listed"
        );
        page.try_map(|entity| to_view(&entity))
    }

    async fn delete_table(&self, id: TableId) -> Result<TableId> {
        if !self.repository.delete(id).await? {
            return Err(RepositoryError::NotFound(id).into());
        }
        info!(id, "table deleted");
        Ok(id)
    }
}
