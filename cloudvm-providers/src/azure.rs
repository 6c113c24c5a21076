use crate::{generate_vm_id, log_provisioning, VmProvider};
use anyhow::Result;
use async_trait::async_trait;
use cloudvm_common::{param_text, Parameters};

/// Azure Virtual Machines (simulated).
#[derive(Debug, Default, Clone)]
pub struct AzureProvider;

impl AzureProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl VmProvider for AzureProvider {
    fn name(&self) -> &str {
        "Azure"
    }

    fn required_parameters(&self) -> &'static [&'static str] {
        &["vm_size", "resource_group", "location"]
    }

    async fn launch(&self, request_id: &str, parameters: &Parameters) -> Result<String> {
        let resource_group =
            param_text(parameters, "resource_group").unwrap_or_else(|| "default-rg".to_string());

        let vm_id = generate_vm_id("az-vm-");

        log_provisioning(
            request_id,
            &format!("VM {} created in resource group {}", vm_id, resource_group),
        );
        Ok(vm_id)
    }
}
