use crate::{generate_vm_id, log_provisioning, VmProvider};
use anyhow::Result;
use async_trait::async_trait;
use cloudvm_common::{param_text, Parameters};

/// In-house hypervisor pool (simulated).
#[derive(Debug, Default, Clone)]
pub struct OnPremiseProvider;

impl OnPremiseProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl VmProvider for OnPremiseProvider {
    fn name(&self) -> &str {
        "OnPremise"
    }

    fn required_parameters(&self) -> &'static [&'static str] {
        &["cpu_cores", "ram_gb", "storage_gb"]
    }

    async fn launch(&self, request_id: &str, parameters: &Parameters) -> Result<String> {
        let cpu_cores = param_text(parameters, "cpu_cores").unwrap_or_else(|| "2".to_string());
        let ram_gb = param_text(parameters, "ram_gb").unwrap_or_else(|| "4".to_string());

        let vm_id = generate_vm_id("onprem-vm-");

        log_provisioning(
            request_id,
            &format!("VM {} created with {} CPUs and {}GB RAM", vm_id, cpu_cores, ram_gb),
        );
        Ok(vm_id)
    }
}
