use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::entity::{Entity, EntityError, TableEntity, TableId, UpdateTableRequest};
use thiserror::Error;
use tracing::debug;

/// ストレージエラー
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Row {0} not found")]
    RowNotFound(TableId),

    #[error("Unique constraint violation for column {column}: {value}")]
    UniqueViolation { column: &'static str, value: String },

    #[error("Primary key constraint violation: {0}")]
    PrimaryKeyViolation(TableId),

    #[error("Identifier sequence exhausted")]
    SequenceExhausted,

    #[error(transparent)]
    Entity(#[from] EntityError),

    #[error("Internal storage error: {0}")]
    Internal(String),
}

/// テーブルのデータを保持する構造体
#[derive(Debug)]
struct TableData {
    // 主キー順に並ぶ行
    rows: BTreeMap<TableId, TableEntity>,
    // 次に採番する識別子
    next_id: TableId,
}

impl TableData {
    fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }

    fn check_unique_name(&self, name: &str, except: Option<TableId>) -> Result<(), StorageError> {
        let duplicate = self
            .rows
            .iter()
            .any(|(id, row)| Some(*id) != except && row.name == name);
        if duplicate {
            return Err(StorageError::UniqueViolation {
                column: "name",
                value: name.to_string(),
            });
        }
        Ok(())
    }

    fn allocate_id(&mut self) -> Result<TableId, StorageError> {
        let id = self.next_id;
        self.next_id = id.checked_add(1).ok_or(StorageError::SequenceExhausted)?;
        Ok(id)
    }

    fn insert_row(&mut self, mut row: TableEntity) -> Result<TableEntity, StorageError> {
        self.check_unique_name(&row.name, None)?;

        let id = match row.id().copied() {
            Some(id) => {
                if self.rows.contains_key(&id) {
                    return Err(StorageError::PrimaryKeyViolation(id));
                }
                // 外部から指定された識別子は以降の採番と衝突させない
                if id >= self.next_id {
                    self.next_id = id.checked_add(1).ok_or(StorageError::SequenceExhausted)?;
                }
                id
            }
            None => {
                let id = self.allocate_id()?;
                row.assign_id(id)?;
                id
            }
        };

        self.rows.insert(id, row.clone());
        Ok(row)
    }

    fn update_row(&mut self, id: TableId, request: UpdateTableRequest) -> Result<TableEntity, StorageError> {
        let mut row = self
            .rows
            .get(&id)
            .cloned()
            .ok_or(StorageError::RowNotFound(id))?;
        row.apply(request);
        self.check_unique_name(&row.name, Some(id))?;

        self.rows.insert(id, row.clone());
        Ok(row)
    }
}

/// インメモリストレージの実装
///
/// 各変更操作は書き込みロックの中で完結するため、1操作が1トランザクションに相当する。
#[derive(Debug)]
pub struct MemoryStorage {
    table: RwLock<TableData>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(TableData::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, TableData>, StorageError> {
        self.table
            .read()
            .map_err(|e| StorageError::Internal(format!("lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, TableData>, StorageError> {
        self.table
            .write()
            .map_err(|e| StorageError::Internal(format!("lock poisoned: {}", e)))
    }

    /// 行を挿入する。識別子が未設定なら採番する
    pub fn insert_row(&self, row: TableEntity) -> Result<TableEntity, StorageError> {
        let inserted = self.write()?.insert_row(row)?;
        debug!(id = ?inserted.id(), "row inserted");
        Ok(inserted)
    }

    /// 識別子で行を取得する
    pub fn get_row(&self, id: TableId) -> Result<Option<TableEntity>, StorageError> {
        Ok(self.read()?.rows.get(&id).cloned())
    }

    /// 既存の行に更新リクエストを適用する
    ///
    /// 読み出しから書き戻しまで同じ書き込みロックの中で行う。
    pub fn update_row(&self, id: TableId, request: UpdateTableRequest) -> Result<TableEntity, StorageError> {
        let updated = self.write()?.update_row(id, request)?;
        debug!(id, "row updated");
        Ok(updated)
    }

    /// 行を削除する
    pub fn delete_row(&self, id: TableId) -> Result<bool, StorageError> {
        Ok(self.write()?.rows.remove(&id).is_some())
    }

    /// 主キー順に範囲を取得し、総件数と一緒に返す
    pub fn select_rows(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<TableEntity>, u64), StorageError> {
        let table = self.read()?;
        let total = table.rows.len() as u64;
        let rows = table
            .rows
            .values()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok((rows, total))
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{AbstractEntity, CreateTableRequest};
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn row(name: &str) -> TableEntity {
        TableEntity::from_request(CreateTableRequest::new(name))
    }

    #[test]
    fn insert_assigns_sequential_ids() {
        let storage = MemoryStorage::new();
        let a = storage.insert_row(row("a")).unwrap();
        let b = storage.insert_row(row("b")).unwrap();
        assert_eq!(a.id(), Some(&1));
        assert_eq!(b.id(), Some(&2));
        assert_eq!(storage.select_rows(0, 10).unwrap().1, 2);
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let storage = MemoryStorage::new();
        storage.insert_row(row("a")).unwrap();
        assert!(storage.delete_row(1).unwrap());
        assert!(!storage.delete_row(1).unwrap());
        let b = storage.insert_row(row("b")).unwrap();
        assert_eq!(b.id(), Some(&2));
    }

    #[test]
    fn externally_assigned_id_is_kept() {
        let storage = MemoryStorage::new();
        let mut preset = row("preset");
        preset.assign_id(10).unwrap();
        storage.insert_row(preset.clone()).unwrap();

        assert!(matches!(
            storage.insert_row(preset),
            Err(StorageError::UniqueViolation { .. })
        ));
        let mut same_key = row("other");
        same_key.assign_id(10).unwrap();
        assert!(matches!(
            storage.insert_row(same_key),
            Err(StorageError::PrimaryKeyViolation(10))
        ));
        assert_eq!(storage.insert_row(row("next")).unwrap().id(), Some(&11));
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let storage = MemoryStorage::new();
        storage.insert_row(row("a")).unwrap();
        let b = storage.insert_row(row("b")).unwrap();
        assert!(matches!(
            storage.insert_row(row("a")),
            Err(StorageError::UniqueViolation { column: "name", .. })
        ));

        let id = *b.id().unwrap();
        assert!(matches!(
            storage.update_row(id, UpdateTableRequest::name("a")),
            Err(StorageError::UniqueViolation { column: "name", .. })
        ));
        assert_eq!(storage.get_row(id).unwrap().unwrap().name, "b");
    }

    #[test]
    fn update_requires_existing_row() {
        let storage = MemoryStorage::new();
        assert!(matches!(
            storage.update_row(5, UpdateTableRequest::name("ghost")),
            Err(StorageError::RowNotFound(5))
        ));
        assert!(storage.get_row(5).unwrap().is_none());
    }

    #[test]
    fn concurrent_partial_updates_are_both_kept() {
        for _ in 0..50 {
            let storage = Arc::new(MemoryStorage::new());
            let id = *storage.insert_row(row("alpha")).unwrap().id().unwrap();
            let barrier = Arc::new(Barrier::new(2));

            let requests = [
                UpdateTableRequest::name("beta"),
                UpdateTableRequest::description("patio"),
            ];
            let handles: Vec<_> = requests
                .into_iter()
                .map(|request| {
                    let storage = Arc::clone(&storage);
                    let barrier = Arc::clone(&barrier);
                    thread::spawn(move || {
                        barrier.wait();
                        storage.update_row(id, request).unwrap()
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }

            let stored = storage.get_row(id).unwrap().unwrap();
            assert_eq!(stored.name, "beta");
            assert_eq!(stored.description.as_deref(), Some("patio"));
        }
    }

    #[test]
    fn select_rows_orders_by_primary_key() {
        let storage = MemoryStorage::new();
        for i in 0..5 {
            storage.insert_row(row(&format!("t{}", i))).unwrap();
        }
        let (rows, total) = storage.select_rows(2, 2).unwrap();
        assert_eq!(total, 5);
        let ids: Vec<_> = rows.iter().map(|r| *r.id().unwrap()).collect();
        assert_eq!(ids, vec![3, 4]);

        let (rows, _) = storage.select_rows(10, 2).unwrap();
        assert!(rows.is_empty());
        let found = storage.get_row(3).unwrap().unwrap();
        assert_eq!(found.base(), &AbstractEntity::with_id(3));
        assert!(storage.get_row(42).unwrap().is_none());
    }
}
