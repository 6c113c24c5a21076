// Versioned provisioning and inventory routes
use crate::app::AppState;
use axum::routing::{get, post, put};
use axum::Router;
use std::sync::Arc;

use crate::handlers::{providers, provision, vms};

/// Create /api/v1 routes router
pub fn create_api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Providers
        .route("/api/v1/providers", get(providers::list_providers))
        // Provisioning
        .route("/api/v1/vm/provision", post(provision::provision_vm))
        // Inventory
        .route("/api/v1/vms", get(vms::list_vms))
        .route(
            "/api/v1/vms/provider/{provider_type}",
            get(vms::list_vms_by_provider),
        )
        .route("/api/v1/vms/status/{status}", get(vms::list_vms_by_status))
        .route("/api/v1/vms/{vm_id}", get(vms::get_vm))
        .route("/api/v1/vms/{vm_id}/status", put(vms::update_vm_status))
        // Statistics
        .route("/api/v1/vms-summary", get(vms::get_summary))
}
