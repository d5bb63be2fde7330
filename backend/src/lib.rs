// backend/src/lib.rs
// Modules principaux
pub mod models;
pub mod api;
pub mod core;
pub mod services;
pub mod utils;

// Version de l'application
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = "Disha Student Guidance";

// Types communs
pub use utils::error::{AppError, Result};
pub use uuid::Uuid;
