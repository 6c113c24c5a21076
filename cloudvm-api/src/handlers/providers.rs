use axum::{extract::State, Json};
use cloudvm_common::ProviderInfo;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::app::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/providers",
    tag = "Providers",
    responses(
        (status = 200, description = "Supported providers and their required parameters", body = BTreeMap<String, ProviderInfo>)
    )
)]
pub async fn list_providers(
    State(state): State<Arc<AppState>>,
) -> Json<BTreeMap<String, ProviderInfo>> {
    Json(state.service.list_available_providers())
}
