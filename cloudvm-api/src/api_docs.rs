use crate::handlers::{providers, provision, system, vms};
use cloudvm_common::{
    ProviderInfo, ProviderVmsResponse, ProvisionOutcome, ProvisionRequest, ProvisionResult,
    VmListResponse, VmRecord, VmStatus, VmSummary,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        system::health,
        providers::list_providers,
        provision::provision_vm,
        vms::list_vms,
        vms::list_vms_by_provider,
        vms::list_vms_by_status,
        vms::get_vm,
        vms::get_summary,
        vms::update_vm_status
    ),
    components(
        schemas(
            ProvisionRequest,
            ProvisionResult,
            ProvisionOutcome,
            ProviderInfo,
            VmRecord,
            VmStatus,
            VmListResponse,
            ProviderVmsResponse,
            VmSummary
        )
    ),
    tags(
        (name = "cloudvm", description = "Multi-cloud VM provisioning API")
    )
)]
pub struct ApiDoc;
