use crate::{generate_vm_id, log_provisioning, VmProvider};
use anyhow::Result;
use async_trait::async_trait;
use cloudvm_common::{param_text, Parameters};

/// Google Compute Engine (simulated).
#[derive(Debug, Default, Clone)]
pub struct GcpProvider;

impl GcpProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl VmProvider for GcpProvider {
    fn name(&self) -> &str {
        "GCP"
    }

    fn required_parameters(&self) -> &'static [&'static str] {
        &["machine_type", "zone", "project_id"]
    }

    async fn launch(&self, request_id: &str, parameters: &Parameters) -> Result<String> {
        let zone = param_text(parameters, "zone").unwrap_or_else(|| "us-central1-a".to_string());

        let vm_id = generate_vm_id("gcp-vm-");

        log_provisioning(request_id, &format!("VM {} created in zone {}", vm_id, zone));
        Ok(vm_id)
    }
}
