use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cloudvm_common::{ProviderVmsResponse, VmListResponse, VmRecord, VmStatus, VmSummary};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use utoipa::IntoParams;

use crate::app::AppState;
use crate::handlers::{detail, service_error_response};

pub const DEFAULT_PAGE_LIMIT: usize = 100;
pub const MAX_PAGE_LIMIT: usize = 1000;

#[derive(Deserialize, IntoParams)]
pub struct ListVmsParams {
    /// Page size, 1..=1000 (default 100)
    pub limit: Option<usize>,
    /// Number of records to skip (default 0)
    pub offset: Option<usize>,
}

#[derive(Deserialize, IntoParams)]
pub struct ProviderVmsParams {
    /// Optional status filter: running|stopped|pending|terminated
    pub status: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct UpdateStatusParams {
    /// running|stopped|pending|terminated
    pub new_status: String,
}

fn parse_status(raw: &str) -> Result<VmStatus, Response> {
    VmStatus::parse(raw).ok_or_else(|| {
        detail(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!(
                "Invalid status '{}'. Expected one of: running, stopped, pending, terminated",
                raw
            ),
        )
    })
}

#[utoipa::path(
    get,
    path = "/api/v1/vms",
    tag = "VMs",
    params(ListVmsParams),
    responses(
        (status = 200, description = "All VMs, most recent first, with per-provider counts", body = VmListResponse),
        (status = 422, description = "Invalid pagination")
    )
)]
pub async fn list_vms(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListVmsParams>,
) -> Response {
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    if limit == 0 || limit > MAX_PAGE_LIMIT {
        return detail(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("limit must be between 1 and {}", MAX_PAGE_LIMIT),
        );
    }
    let offset = params.offset.unwrap_or(0);

    match state.service.list_all_vms().await {
        Ok(mut response) => {
            // Counts describe the whole inventory; only the list is paged.
            response.vms = response.vms.into_iter().skip(offset).take(limit).collect();
            Json(response).into_response()
        }
        Err(e) => service_error_response(e),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/vms/provider/{provider_type}",
    tag = "VMs",
    params(
        ("provider_type" = String, Path, description = "Provider tag or display name, e.g. aws or AWS"),
        ProviderVmsParams
    ),
    responses(
        (status = 200, description = "VMs created through the provider", body = ProviderVmsResponse),
        (status = 404, description = "Unknown provider")
    )
)]
pub async fn list_vms_by_provider(
    State(state): State<Arc<AppState>>,
    Path(provider_type): Path<String>,
    Query(params): Query<ProviderVmsParams>,
) -> Response {
    let Some((_, display_name)) = state.service.factory().resolve_name(&provider_type) else {
        let available: Vec<String> = state
            .service
            .list_available_providers()
            .into_keys()
            .collect();
        return (
            StatusCode::NOT_FOUND,
            Json(json!({
                "detail": format!(
                    "Provider {} not found. Available providers: {}",
                    provider_type,
                    available.join(", ")
                ),
            })),
        )
            .into_response();
    };

    let status_filter = match params.status.as_deref().map(parse_status) {
        Some(Ok(status)) => Some(status),
        Some(Err(resp)) => return resp,
        None => None,
    };

    match state.service.list_vms_by_provider(&display_name).await {
        Ok(mut response) => {
            if let Some(status) = status_filter {
                response.vms.retain(|vm| vm.status == status);
                response.total_vms = response.vms.len();
            }
            Json(response).into_response()
        }
        Err(e) => service_error_response(e),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/vms/status/{status}",
    tag = "VMs",
    params(("status" = String, Path, description = "running|stopped|pending|terminated")),
    responses(
        (status = 200, description = "VMs in the given status", body = VmListResponse),
        (status = 422, description = "Unknown status")
    )
)]
pub async fn list_vms_by_status(
    State(state): State<Arc<AppState>>,
    Path(status): Path<String>,
) -> Response {
    let status = match parse_status(&status) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    match state.service.list_vms_by_status(status).await {
        Ok(vms) => Json(VmListResponse::from_vms(vms)).into_response(),
        Err(e) => service_error_response(e),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/vms/{vm_id}",
    tag = "VMs",
    params(("vm_id" = String, Path, description = "Provider-generated VM id")),
    responses(
        (status = 200, description = "VM details", body = VmRecord),
        (status = 404, description = "VM not found")
    )
)]
pub async fn get_vm(State(state): State<Arc<AppState>>, Path(vm_id): Path<String>) -> Response {
    match state.service.get_vm_by_id(&vm_id).await {
        Ok(vm) => Json(vm).into_response(),
        Err(e) => service_error_response(e),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/vms-summary",
    tag = "Statistics",
    responses(
        (status = 200, description = "Aggregated inventory view", body = VmSummary)
    )
)]
pub async fn get_summary(State(state): State<Arc<AppState>>) -> Response {
    match state.service.get_summary().await {
        Ok(summary) => Json(summary).into_response(),
        Err(e) => service_error_response(e),
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/vms/{vm_id}/status",
    tag = "VMs",
    params(
        ("vm_id" = String, Path, description = "Provider-generated VM id"),
        UpdateStatusParams
    ),
    responses(
        (status = 200, description = "Status updated"),
        (status = 404, description = "VM not found"),
        (status = 422, description = "Unknown status")
    )
)]
pub async fn update_vm_status(
    State(state): State<Arc<AppState>>,
    Path(vm_id): Path<String>,
    Query(params): Query<UpdateStatusParams>,
) -> Response {
    let new_status = match parse_status(&params.new_status) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match state.service.update_vm_status(&vm_id, new_status).await {
        Ok(true) => Json(json!({
            "message": format!("VM {} status updated to {}", vm_id, new_status),
            "vm_id": vm_id,
            "new_status": new_status,
            "timestamp": chrono::Utc::now(),
        }))
        .into_response(),
        Ok(false) => detail(
            StatusCode::NOT_FOUND,
            format!("VM with ID {} not found", vm_id),
        ),
        Err(e) => service_error_response(e),
    }
}
