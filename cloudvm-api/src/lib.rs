// Library entry point for tests and external usage

pub mod api_docs;
pub mod app;
pub mod handlers;
pub mod repository;
pub mod routes;
pub mod service;
pub mod settings;

// Re-export commonly used types
pub use app::AppState;
pub use repository::{InsertOutcome, StorageFailurePolicy, StoreError, VmRepository};
pub use service::{ProvisioningService, ServiceError};
pub use settings::Settings;
