pub mod auth;
pub mod error;
pub mod handler;
pub mod server;

pub use auth::{Authenticator, Principal, StaticTokenAuthenticator};
pub use error::{ApiError, FieldError, Problem};
pub use server::{router, serve, start_server, AppState, ServerConfig, ServerError};
