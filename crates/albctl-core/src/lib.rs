// albctl-core: Operational workflows between albctl-api and the CLI.

pub mod config;
pub mod controller;
pub mod error;
pub mod glob;
pub mod ops;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{AuthCredentials, ControllerConfig, TlsVerification, controller_url};
pub use controller::Controller;
pub use error::CoreError;
pub use glob::Glob;
