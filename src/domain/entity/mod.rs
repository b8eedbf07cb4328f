pub mod abstract_entity;
pub mod table;
// src/domain/entity/mod.rs

pub use abstract_entity::{AbstractEntity, Entity, EntityError, EntityId};
pub use table::{CreateTableRequest, Table, TableEntity, TableId, UpdateTableRequest};
