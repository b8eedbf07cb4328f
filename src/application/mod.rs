pub mod table_service;

pub use table_service::{DefaultTableService, TableService};
