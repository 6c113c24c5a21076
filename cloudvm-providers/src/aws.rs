use crate::{generate_vm_id, log_provisioning, VmProvider};
use anyhow::Result;
use async_trait::async_trait;
use cloudvm_common::{param_text, Parameters};

/// AWS EC2 (simulated).
#[derive(Debug, Default, Clone)]
pub struct AwsProvider;

impl AwsProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl VmProvider for AwsProvider {
    fn name(&self) -> &str {
        "AWS"
    }

    fn required_parameters(&self) -> &'static [&'static str] {
        &["instance_type", "region", "vpc", "ami"]
    }

    async fn launch(&self, request_id: &str, parameters: &Parameters) -> Result<String> {
        let instance_type =
            param_text(parameters, "instance_type").unwrap_or_else(|| "t2.micro".to_string());
        let region = param_text(parameters, "region").unwrap_or_else(|| "us-east-1".to_string());

        // A real implementation would call RunInstances here.
        let vm_id = generate_vm_id("i-");

        log_provisioning(
            request_id,
            &format!("VM {} ({}) created in {}", vm_id, instance_type, region),
        );
        Ok(vm_id)
    }
}
