use axum::{extract::State, Json};
use cloudvm_common::{ProvisionRequest, ProvisionResult};
use std::sync::Arc;

use crate::app::AppState;

/// Provision a VM on any registered provider.
///
/// Required parameters per provider:
/// - aws: instance_type, region, vpc, ami
/// - azure: vm_size, resource_group, location
/// - gcp: machine_type, zone, project_id
/// - on_premise: cpu_cores, ram_gb, storage_gb
///
/// Validation and provider failures are reported in the body (`status: "error"`),
/// never as an HTTP error.
#[utoipa::path(
    post,
    path = "/api/v1/vm/provision",
    tag = "Provisioning",
    request_body = ProvisionRequest,
    responses(
        (status = 200, description = "Provisioning outcome", body = ProvisionResult)
    )
)]
pub async fn provision_vm(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ProvisionRequest>,
) -> Json<ProvisionResult> {
    tracing::info!("Provisioning request received for {}", request.provider_type);

    let result = state.service.provision(&request).await;

    if result.is_success() {
        tracing::info!(
            "VM created: {}",
            result.vm_id.as_deref().unwrap_or_default()
        );
    } else {
        tracing::error!(
            "VM creation failed: {}",
            result.error_message.as_deref().unwrap_or_default()
        );
    }
    Json(result)
}
