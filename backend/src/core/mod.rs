// core/mod.rs
pub mod recommendation;
pub mod catalog_service;
pub mod profile_service;
pub mod otp_service;
pub mod consultation_service;

// Ré-exports pour faciliter l'import
pub use recommendation::{filter_exams_by_age, recommend, recommend_for_profile, Recommendations};
pub use catalog_service::{CatalogFilter, CatalogService, SearchResults, SyncReport};
pub use profile_service::ProfileService;
pub use otp_service::OtpService;
pub use consultation_service::ConsultationService;
