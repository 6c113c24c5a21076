use anyhow::Result;
use async_trait::async_trait;
use cloudvm_common::sanitize::sanitize_log_text;
use cloudvm_common::{short_hex_id, Parameters, ProviderInfo, ProvisionResult};

pub mod aws;
pub mod azure;
pub mod factory;
pub mod gcp;
pub mod on_premise;

pub use aws::AwsProvider;
pub use azure::AzureProvider;
pub use factory::{ProviderConstructor, ProviderError, ProviderFactory};
pub use gcp::GcpProvider;
pub use on_premise::OnPremiseProvider;

/// A provisioning target: validates a parameter bag and (simulates) creating a VM.
///
/// Implementors only describe themselves and how to launch; `create_vm` wraps
/// `launch` with validation, request ids, logging and error capture, so every
/// call yields a well-formed `ProvisionResult`.
#[async_trait]
pub trait VmProvider: Send + Sync {
    /// Display name, e.g. "AWS".
    fn name(&self) -> &str;

    /// Fixed, ordered list of parameter names this provider requires.
    fn required_parameters(&self) -> &'static [&'static str];

    /// Create the VM and return its provider id. Parameters are already validated.
    /// Stands in for the cloud SDK call.
    async fn launch(&self, request_id: &str, parameters: &Parameters) -> Result<String>;

    /// Required names absent from `parameters`, in declaration order.
    fn missing_parameters(&self, parameters: &Parameters) -> Vec<&'static str> {
        self.required_parameters()
            .iter()
            .copied()
            .filter(|name| !parameters.contains_key(*name))
            .collect()
    }

    /// Presence check only: values and extra keys are not inspected.
    fn validate(&self, parameters: &Parameters) -> bool {
        self.missing_parameters(parameters).is_empty()
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: self.name().to_string(),
            supported: true,
            required_parameters: self
                .required_parameters()
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    async fn create_vm(&self, parameters: &Parameters) -> ProvisionResult {
        let request_id = format!("req_{}", short_hex_id());
        log_provisioning(
            &request_id,
            &format!("Starting VM creation on {}", self.name()),
        );

        let missing = self.missing_parameters(parameters);
        if !missing.is_empty() {
            log_provisioning(
                &request_id,
                &format!("Rejected request, missing: {}", missing.join(", ")),
            );
            return ProvisionResult::error(
                request_id,
                self.name(),
                format!(
                    "invalid parameters for {}: missing {}",
                    self.name(),
                    missing.join(", ")
                ),
            );
        }

        match self.launch(&request_id, parameters).await {
            Ok(vm_id) => ProvisionResult::success(request_id, self.name(), vm_id),
            Err(e) => {
                log_provisioning(&request_id, &format!("Error on {}: {}", self.name(), e));
                ProvisionResult::error(request_id, self.name(), e.to_string())
            }
        }
    }
}

/// Emit a provisioning log line with secret-looking words scrubbed.
pub fn log_provisioning(request_id: &str, message: &str) {
    tracing::info!("[{}] {}", request_id, sanitize_log_text(message));
}

/// Provider-shaped id: `<prefix><8 hex>`.
pub(crate) fn generate_vm_id(prefix: &str) -> String {
    format!("{}{}", prefix, short_hex_id())
}

#[cfg(test)]
pub(crate) mod test_support {
    use cloudvm_common::Parameters;
    use serde_json::json;

    pub fn params(pairs: &[(&str, serde_json::Value)]) -> Parameters {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    pub fn strings(pairs: &[(&str, &str)]) -> Parameters {
        pairs.iter().map(|(k, v)| (k.to_string(), json!(v))).collect()
    }

    /// Suffix after `prefix` is eight lowercase hex chars.
    pub fn has_hex_suffix(id: &str, prefix: &str) -> bool {
        match id.strip_prefix(prefix) {
            Some(rest) => {
                rest.len() == 8
                    && rest
                        .chars()
                        .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
            }
            None => false,
        }
    }
}
