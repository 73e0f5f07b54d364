// albctl-api: Async Rust client for the Avi controller REST API

pub mod auth;
pub mod error;
pub mod models;
pub mod refs;
pub mod session;
pub mod transport;

pub use auth::Credentials;
pub use error::Error;
pub use models::{JsonPatch, ListPage, PatchOp};
pub use session::{ApiSession, MAX_RETRIES, RequestOptions};
pub use transport::{TlsMode, TransportConfig};
