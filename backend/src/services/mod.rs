// services/mod.rs
pub mod backend;
pub mod memory;
pub mod auth;
pub mod email;

// Ré-exports pour faciliter l'import
pub use backend::{BackendClient, Query, RowStore};
pub use memory::MemoryStore;
pub use auth::{AuthClient, AuthProvider, AuthUser, Session, SignUpOutcome};
pub use email::{EmailFunctionClient, LogMailer, OtpMailer};
