pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod interface;
pub mod client;

// TableDB version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Service result type
pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum  Error {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
