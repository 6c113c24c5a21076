use crate::repository::{InsertOutcome, StoreError, VmRepository};
use anyhow::anyhow;
use cloudvm_common::sanitize::sanitize_parameters;
use cloudvm_common::{
    first_param_text, short_hex_id, ProviderInfo, ProviderVmsResponse, ProvisionRequest,
    ProvisionResult, VmListResponse, VmRecord, VmStatus, VmSummary,
};
use cloudvm_providers::{ProviderError, ProviderFactory};
use futures_util::FutureExt;
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;

const INSTANCE_TYPE_KEYS: [&str; 3] = ["instance_type", "vm_size", "machine_type"];
const REGION_KEYS: [&str; 3] = ["region", "location", "zone"];

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("VM with ID {0} not found")]
    NotFound(String),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Orchestrates factory -> provider -> repository and serves inventory queries.
pub struct ProvisioningService {
    factory: Arc<ProviderFactory>,
    repository: VmRepository,
}

impl ProvisioningService {
    pub fn new(factory: Arc<ProviderFactory>, repository: VmRepository) -> Self {
        Self {
            factory,
            repository,
        }
    }

    pub fn factory(&self) -> &ProviderFactory {
        &self.factory
    }

    /// Never fails: unsupported providers, bad parameters, internal errors and
    /// panics all come back as an error-shaped result.
    pub async fn provision(&self, request: &ProvisionRequest) -> ProvisionResult {
        let provider_tag = request.provider_type.as_str().to_string();
        match AssertUnwindSafe(self.try_provision(request))
            .catch_unwind()
            .await
        {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                let message = match e.downcast_ref::<ProviderError>() {
                    Some(provider_err) => provider_err.to_string(),
                    None => format!("internal error: {}", e),
                };
                tracing::warn!("Provisioning on '{}' failed: {}", provider_tag, message);
                ProvisionResult::error(format!("error_{}", short_hex_id()), provider_tag, message)
            }
            Err(panic) => {
                let message = format!("internal error: {}", panic_message(panic.as_ref()));
                tracing::error!("Provisioning on '{}' panicked: {}", provider_tag, message);
                ProvisionResult::error(format!("error_{}", short_hex_id()), provider_tag, message)
            }
        }
    }

    async fn try_provision(&self, request: &ProvisionRequest) -> anyhow::Result<ProvisionResult> {
        let provider = self.factory.create(&request.provider_type)?;
        let result = provider.create_vm(&request.parameters).await;
        if !result.is_success() {
            return Ok(result);
        }

        let vm_id = result
            .vm_id
            .clone()
            .ok_or_else(|| anyhow!("provider reported success without a VM id"))?;
        let record = VmRecord {
            vm_id: vm_id.clone(),
            provider_type: result.provider_type.clone(),
            status: VmStatus::Running,
            instance_type: first_param_text(&request.parameters, &INSTANCE_TYPE_KEYS),
            region: first_param_text(&request.parameters, &REGION_KEYS),
            created_at: result.timestamp,
            parameters: sanitize_parameters(&request.parameters),
        };

        match self.repository.insert_new(record).await {
            Ok(InsertOutcome::Inserted) => {
                tracing::info!("VM {} recorded ({})", vm_id, result.provider_type)
            }
            Ok(InsertOutcome::NotPersisted) => {
                tracing::warn!("VM {} created but not recorded in inventory", vm_id)
            }
            Ok(InsertOutcome::IdTaken) => {
                tracing::error!("VM id {} collides with an existing record", vm_id);
                return Ok(ProvisionResult::error(
                    result.request_id,
                    result.provider_type,
                    format!("VM id {} is already recorded; existing record kept", vm_id),
                ));
            }
            Err(e) => {
                tracing::error!("VM {} created but could not be recorded: {}", vm_id, e);
                return Ok(ProvisionResult::error(
                    result.request_id,
                    result.provider_type,
                    format!("VM {} was created but could not be recorded: {}", vm_id, e),
                ));
            }
        }
        Ok(result)
    }

    pub async fn list_all_vms(&self) -> Result<VmListResponse, ServiceError> {
        let vms = self.repository.list_all().await?;
        Ok(VmListResponse::from_vms(vms))
    }

    /// No existence check on `provider`; an unknown name yields an empty list.
    pub async fn list_vms_by_provider(
        &self,
        provider: &str,
    ) -> Result<ProviderVmsResponse, ServiceError> {
        let vms = self.repository.list_by_provider(provider).await?;
        Ok(ProviderVmsResponse {
            provider_type: provider.to_string(),
            total_vms: vms.len(),
            vms,
        })
    }

    pub async fn list_vms_by_status(
        &self,
        status: VmStatus,
    ) -> Result<Vec<VmRecord>, ServiceError> {
        Ok(self.repository.list_by_status(status).await?)
    }

    pub async fn get_vm_by_id(&self, vm_id: &str) -> Result<VmRecord, ServiceError> {
        self.repository
            .get_by_id(vm_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(vm_id.to_string()))
    }

    pub async fn get_summary(&self) -> Result<VmSummary, ServiceError> {
        Ok(self.repository.summary().await?)
    }

    pub async fn update_vm_status(
        &self,
        vm_id: &str,
        status: VmStatus,
    ) -> Result<bool, ServiceError> {
        Ok(self.repository.update_status(vm_id, status).await?)
    }

    pub fn list_available_providers(&self) -> BTreeMap<String, ProviderInfo> {
        self.factory.list_available()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::StorageFailurePolicy;
    use async_trait::async_trait;
    use cloudvm_common::sanitize::PARAM_REDACTION;
    use cloudvm_common::{Parameters, ProviderKind};
    use cloudvm_providers::VmProvider;
    use serde_json::json;
    use tempfile::TempDir;

    async fn service_with(policy: StorageFailurePolicy) -> (TempDir, ProvisioningService) {
        let dir = tempfile::tempdir().unwrap();
        let repo = VmRepository::open(dir.path().join("vm_storage.json"), policy)
            .await
            .unwrap();
        (dir, ProvisioningService::new(Arc::new(ProviderFactory::new()), repo))
    }

    fn request(kind: ProviderKind, pairs: &[(&str, serde_json::Value)]) -> ProvisionRequest {
        let parameters: Parameters = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        ProvisionRequest::new(kind, parameters)
    }

    fn aws_request() -> ProvisionRequest {
        request(
            ProviderKind::Aws,
            &[
                ("instance_type", json!("t2.micro")),
                ("region", json!("us-east-1")),
                ("vpc", json!("vpc-1")),
                ("ami", json!("ami-1")),
            ],
        )
    }

    fn azure_request() -> ProvisionRequest {
        request(
            ProviderKind::Azure,
            &[
                ("vm_size", json!("Standard_B1s")),
                ("resource_group", json!("rg-1")),
                ("location", json!("eastus")),
                ("admin_password", json!("hunter2")),
            ],
        )
    }

    struct PanickingProvider;

    #[async_trait]
    impl VmProvider for PanickingProvider {
        fn name(&self) -> &str {
            "Broken"
        }

        fn required_parameters(&self) -> &'static [&'static str] {
            &[]
        }

        async fn launch(
            &self,
            _request_id: &str,
            _parameters: &Parameters,
        ) -> anyhow::Result<String> {
            panic!("sdk exploded")
        }
    }

    /// Always hands out the same id.
    struct FixedIdProvider;

    #[async_trait]
    impl VmProvider for FixedIdProvider {
        fn name(&self) -> &str {
            "Fixed"
        }

        fn required_parameters(&self) -> &'static [&'static str] {
            &["size"]
        }

        async fn launch(
            &self,
            _request_id: &str,
            _parameters: &Parameters,
        ) -> anyhow::Result<String> {
            Ok("fixed-vm-00000001".to_string())
        }
    }

    #[tokio::test]
    async fn successful_provision_is_recorded() {
        let (_dir, service) = service_with(StorageFailurePolicy::Degrade).await;
        let result = service.provision(&aws_request()).await;

        assert!(result.is_success());
        assert_eq!(result.provider_type, "AWS");
        let vm_id = result.vm_id.clone().unwrap();
        let suffix = vm_id.strip_prefix("i-").unwrap();
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));

        let record = service.get_vm_by_id(&vm_id).await.unwrap();
        assert_eq!(record.vm_id, vm_id);
        assert_eq!(record.status, VmStatus::Running);
        assert_eq!(record.created_at, result.timestamp);
        assert_eq!(record.instance_type.as_deref(), Some("t2.micro"));
        assert_eq!(record.region.as_deref(), Some("us-east-1"));
    }

    #[tokio::test]
    async fn invalid_parameters_record_nothing() {
        let (_dir, service) = service_with(StorageFailurePolicy::Degrade).await;
        let result = service
            .provision(&request(ProviderKind::Aws, &[("region", json!("us-east-1"))]))
            .await;

        assert!(!result.is_success());
        assert!(result.vm_id.is_none());
        assert!(result
            .error_message
            .unwrap_or_default()
            .contains("invalid parameters"));
        assert_eq!(service.list_all_vms().await.unwrap().total_vms, 0);
    }

    #[tokio::test]
    async fn unsupported_provider_is_an_error_result() {
        let (_dir, service) = service_with(StorageFailurePolicy::Degrade).await;
        let result = service
            .provision(&request(ProviderKind::parse("oracle"), &[]))
            .await;

        assert!(!result.is_success());
        assert_eq!(result.provider_type, "oracle");
        assert!(result.request_id.starts_with("error_"));
        assert_eq!(
            result.error_message.as_deref(),
            Some("unsupported provider: oracle")
        );
    }

    #[tokio::test]
    async fn panicking_provider_is_contained() {
        let (_dir, service) = service_with(StorageFailurePolicy::Degrade).await;
        let broken = ProviderKind::parse("broken");
        service
            .factory()
            .register(broken.clone(), || Box::new(PanickingProvider));

        let result = service.provision(&request(broken, &[])).await;
        assert!(!result.is_success());
        assert_eq!(
            result.error_message.as_deref(),
            Some("internal error: sdk exploded")
        );
        assert_eq!(service.get_summary().await.unwrap().total_vms, 0);
    }

    #[tokio::test]
    async fn colliding_vm_id_keeps_existing_record() {
        let (_dir, service) = service_with(StorageFailurePolicy::Degrade).await;
        let fixed = ProviderKind::parse("fixed");
        service
            .factory()
            .register(fixed.clone(), || Box::new(FixedIdProvider));

        let first = service
            .provision(&request(fixed.clone(), &[("size", json!("small"))]))
            .await;
        assert!(first.is_success());

        let second = service
            .provision(&request(fixed, &[("size", json!("large"))]))
            .await;
        assert!(!second.is_success());
        assert!(second
            .error_message
            .unwrap_or_default()
            .contains("already recorded"));

        let all = service.list_all_vms().await.unwrap();
        assert_eq!(all.total_vms, 1);
        assert_eq!(all.vms[0].parameters["size"], json!("small"));
    }

    #[tokio::test]
    async fn secrets_are_redacted_before_storage() {
        let (_dir, service) = service_with(StorageFailurePolicy::Degrade).await;
        let result = service.provision(&azure_request()).await;
        let record = service
            .get_vm_by_id(result.vm_id.as_deref().unwrap())
            .await
            .unwrap();

        assert_eq!(record.parameters["admin_password"], json!(PARAM_REDACTION));
        assert_eq!(record.parameters["vm_size"], json!("Standard_B1s"));
        assert_eq!(record.instance_type.as_deref(), Some("Standard_B1s"));
        assert_eq!(record.region.as_deref(), Some("eastus"));
    }

    #[tokio::test]
    async fn provider_listing_and_summary() {
        let (_dir, service) = service_with(StorageFailurePolicy::Degrade).await;
        let aws = service.provision(&aws_request()).await;
        let azure = service.provision(&azure_request()).await;

        let by_provider = service.list_vms_by_provider("Azure").await.unwrap();
        assert_eq!(by_provider.provider_type, "Azure");
        assert_eq!(by_provider.total_vms, 1);
        assert_eq!(by_provider.vms[0].vm_id, azure.vm_id.clone().unwrap());

        let summary = service.get_summary().await.unwrap();
        assert_eq!(summary.total_vms, 2);
        assert_eq!(summary.vms_by_provider.get("AWS"), Some(&1));
        assert_eq!(summary.vms_by_provider.get("Azure"), Some(&1));

        let all = service.list_all_vms().await.unwrap();
        assert_eq!(all.total_vms, 2);
        assert_eq!(all.vms.len(), 2);
        assert!(all.vms.iter().any(|vm| Some(&vm.vm_id) == aws.vm_id.as_ref()));
    }

    #[tokio::test]
    async fn unknown_vm_is_not_found() {
        let (_dir, service) = service_with(StorageFailurePolicy::Degrade).await;
        assert!(!service
            .update_vm_status("nonexistent-id", VmStatus::Terminated)
            .await
            .unwrap());
        assert!(matches!(
            service.get_vm_by_id("nonexistent-id").await,
            Err(ServiceError::NotFound(id)) if id == "nonexistent-id"
        ));
    }

    #[tokio::test]
    async fn status_update_is_visible_in_filters() {
        let (_dir, service) = service_with(StorageFailurePolicy::Degrade).await;
        let vm_id = service.provision(&aws_request()).await.vm_id.unwrap();

        assert!(service
            .update_vm_status(&vm_id, VmStatus::Stopped)
            .await
            .unwrap());
        assert_eq!(
            service.get_vm_by_id(&vm_id).await.unwrap().status,
            VmStatus::Stopped
        );
        assert_eq!(
            service
                .list_vms_by_status(VmStatus::Stopped)
                .await
                .unwrap()
                .len(),
            1
        );
        assert!(service
            .list_vms_by_status(VmStatus::Running)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn persistence_failure_surfaces_when_failing_loud() {
        let (dir, service) = service_with(StorageFailurePolicy::FailLoud).await;
        std::fs::write(dir.path().join("vm_storage.json"), "garbage").unwrap();

        let result = service.provision(&aws_request()).await;
        assert!(!result.is_success());
        assert!(result.vm_id.is_none());
        assert!(result
            .error_message
            .unwrap_or_default()
            .contains("could not be recorded"));
        assert!(matches!(
            service.list_all_vms().await,
            Err(ServiceError::Storage(_))
        ));
    }

    #[tokio::test]
    async fn persistence_failure_is_swallowed_when_degrading() {
        let (dir, service) = service_with(StorageFailurePolicy::Degrade).await;
        std::fs::write(dir.path().join("vm_storage.json"), "garbage").unwrap();

        let result = service.provision(&aws_request()).await;
        assert!(result.is_success());
        assert_eq!(service.list_all_vms().await.unwrap().total_vms, 0);
    }

    #[tokio::test]
    async fn providers_are_listed() {
        let (_dir, service) = service_with(StorageFailurePolicy::Degrade).await;
        let keys: Vec<String> = service.list_available_providers().into_keys().collect();
        assert_eq!(keys, vec!["aws", "azure", "gcp", "on_premise"]);
    }
}
