use async_trait::async_trait;
use crate::domain::entity::{EntityError, TableEntity, TableId, UpdateTableRequest};
use crate::domain::page::{Page, PageRequest};
use crate::Error;

// テーブルリポジトリエラー
#[derive(thiserror::Error, Debug)]
pub enum RepositoryError {
    #[error("Table {0} not found")]
    NotFound(TableId),

    #[error("Table with name '{0}' already exists")]
    DuplicateName(String),

    #[error("Entity error: {0}")]
    Entity(#[from] EntityError),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<RepositoryError> for Error {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => Error::NotFound(format!("Table {} not found", id)),
            RepositoryError::DuplicateName(name) => {
                Error::Conflict(format!("Table with name '{}' already exists", name))
            }
            RepositoryError::Entity(e) => Error::Internal(e.to_string()),
            RepositoryError::StorageError(msg) => Error::Storage(msg),
            RepositoryError::InternalError(msg) => Error::Internal(msg),
        }
    }
}

// Tableリポジトリ - TableEntityの永続化と取得のための抽象インターフェース
#[async_trait]
pub trait TableRepository: Send + Sync {
    /// 識別子を採番してレコードを保存し、保存後のレコードを返す
    async fn insert(&self, entity: TableEntity) -> Result<TableEntity, RepositoryError>;

    /// 識別子でレコードを取得する
    async fn find_by_id(&self, id: TableId) -> Result<Option<TableEntity>, RepositoryError>;

    /// 既存レコードに更新リクエストを適用する（読み出しと書き戻しは1つの操作）
    async fn update(&self, id: TableId, request: UpdateTableRequest) -> Result<TableEntity, RepositoryError>;

    /// 主キー順にページ単位で取得する
    async fn find_page(&self, request: &PageRequest) -> Result<Page<TableEntity>, RepositoryError>;

    /// レコードを削除する。存在しなければ`false`
    async fn delete(&self, id: TableId) -> Result<bool, RepositoryError>;
}
