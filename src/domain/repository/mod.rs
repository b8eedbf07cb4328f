pub mod table_repository;

pub use table_repository::{RepositoryError, TableRepository};
