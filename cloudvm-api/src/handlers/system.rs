use axum::Json;
use serde_json::{json, Value};

pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "VM Provisioning Multi-Cloud API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Unified virtual machine provisioning across cloud providers",
        "endpoints": {
            "provision": "POST /api/v1/vm/provision",
            "providers": "GET /api/v1/providers",
            "all_vms": "GET /api/v1/vms",
            "vms_by_provider": "GET /api/v1/vms/provider/{provider_type}",
            "vms_by_status": "GET /api/v1/vms/status/{status}",
            "vm_by_id": "GET /api/v1/vms/{vm_id}",
            "update_status": "PUT /api/v1/vms/{vm_id}/status",
            "vms_summary": "GET /api/v1/vms-summary",
            "health": "GET /health"
        }
    }))
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is up")
    )
)]
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "vm_provisioning",
        "timestamp": chrono::Utc::now(),
    }))
}
