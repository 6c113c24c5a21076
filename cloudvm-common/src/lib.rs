use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

pub mod sanitize;

/// Free-form, provider-specific provisioning parameters.
pub type Parameters = HashMap<String, serde_json::Value>;

/// Eight random lowercase hex characters, used for request and VM ids.
pub fn short_hex_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

/// Text form of a parameter value: strings unquoted, other JSON rendered.
/// Null and empty strings count as absent.
pub fn param_text(parameters: &Parameters, name: &str) -> Option<String> {
    match parameters.get(name)? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) if s.is_empty() => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// First of `names` that carries a value.
pub fn first_param_text(parameters: &Parameters, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| param_text(parameters, name))
}

// --- Enums ---

/// Which validation/creation rules apply to a request.
///
/// The four built-in kinds are always known; `Custom` carries the tag of a
/// provider registered at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProviderKind {
    Aws,
    Azure,
    Gcp,
    OnPremise,
    Custom(String),
}

impl ProviderKind {
    pub const BUILTIN: [ProviderKind; 4] = [
        ProviderKind::Aws,
        ProviderKind::Azure,
        ProviderKind::Gcp,
        ProviderKind::OnPremise,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            ProviderKind::Aws => "aws",
            ProviderKind::Azure => "azure",
            ProviderKind::Gcp => "gcp",
            ProviderKind::OnPremise => "on_premise",
            ProviderKind::Custom(tag) => tag.as_str(),
        }
    }

    /// Case-insensitive; `-` is accepted in place of `_`.
    pub fn parse(s: &str) -> Self {
        let tag = s.trim().to_ascii_lowercase().replace('-', "_");
        match tag.as_str() {
            "aws" => ProviderKind::Aws,
            "azure" => ProviderKind::Azure,
            "gcp" => ProviderKind::Gcp,
            "on_premise" | "onpremise" => ProviderKind::OnPremise,
            _ => ProviderKind::Custom(tag),
        }
    }
}

impl From<String> for ProviderKind {
    fn from(s: String) -> Self {
        ProviderKind::parse(&s)
    }
}

impl From<ProviderKind> for String {
    fn from(kind: ProviderKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum VmStatus {
    Running,
    Stopped,
    Pending,
    Terminated,
}

impl VmStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VmStatus::Running => "running",
            VmStatus::Stopped => "stopped",
            VmStatus::Pending => "pending",
            VmStatus::Terminated => "terminated",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "running" => Some(VmStatus::Running),
            "stopped" => Some(VmStatus::Stopped),
            "pending" => Some(VmStatus::Pending),
            "terminated" => Some(VmStatus::Terminated),
            _ => None,
        }
    }
}

impl fmt::Display for VmStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProvisionOutcome {
    Success,
    Error,
}

// --- Requests / Results ---

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ProvisionRequest {
    #[schema(value_type = String, example = "aws")]
    pub provider_type: ProviderKind,
    #[schema(value_type = Object)]
    pub parameters: Parameters,
}

impl ProvisionRequest {
    pub fn new(provider_type: ProviderKind, parameters: Parameters) -> Self {
        Self {
            provider_type,
            parameters,
        }
    }
}

/// Outcome of a single creation attempt. Always well-formed: `vm_id` is set
/// iff the outcome is success, `error_message` iff it is an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ProvisionResult {
    pub request_id: String,
    #[serde(rename = "status")]
    pub outcome: ProvisionOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub provider_type: String,
    pub timestamp: DateTime<Utc>,
}

impl ProvisionResult {
    pub fn success(
        request_id: impl Into<String>,
        provider_type: impl Into<String>,
        vm_id: impl Into<String>,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            outcome: ProvisionOutcome::Success,
            vm_id: Some(vm_id.into()),
            error_message: None,
            provider_type: provider_type.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn error(
        request_id: impl Into<String>,
        provider_type: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            outcome: ProvisionOutcome::Error,
            vm_id: None,
            error_message: Some(message.into()),
            provider_type: provider_type.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == ProvisionOutcome::Success
    }
}

// --- Inventory ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct VmRecord {
    pub vm_id: String,
    /// Display name of the provider that created the VM (e.g. "AWS").
    pub provider_type: String,
    pub status: VmStatus,
    pub instance_type: Option<String>,
    pub region: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Sanitized copy of the provisioning parameters.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub parameters: Parameters,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ProviderInfo {
    pub name: String,
    pub supported: bool,
    pub required_parameters: Vec<String>,
}

// --- Aggregates ---

/// Count records per provider display name.
pub fn count_by_provider(vms: &[VmRecord]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for vm in vms {
        *counts.entry(vm.provider_type.clone()).or_insert(0) += 1;
    }
    counts
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct VmListResponse {
    pub total_vms: usize,
    pub vms_by_provider: BTreeMap<String, usize>,
    pub vms: Vec<VmRecord>,
}

impl VmListResponse {
    /// Build the response for an arbitrary list, counting over that list.
    pub fn from_vms(vms: Vec<VmRecord>) -> Self {
        Self {
            total_vms: vms.len(),
            vms_by_provider: count_by_provider(&vms),
            vms,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ProviderVmsResponse {
    pub provider_type: String,
    pub total_vms: usize,
    pub vms: Vec<VmRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct VmSummary {
    pub total_vms: usize,
    pub vms_by_provider: BTreeMap<String, usize>,
    pub vms_by_status: BTreeMap<String, usize>,
    /// At most ten records, most recent first.
    pub recent_vms: Vec<VmRecord>,
}

pub const RECENT_VMS_LIMIT: usize = 10;

impl VmSummary {
    /// Aggregate over a list already ordered most recent first.
    pub fn from_sorted(vms: &[VmRecord]) -> Self {
        let mut vms_by_status = BTreeMap::new();
        for vm in vms {
            *vms_by_status.entry(vm.status.as_str().to_string()).or_insert(0) += 1;
        }
        Self {
            total_vms: vms.len(),
            vms_by_provider: count_by_provider(vms),
            vms_by_status,
            recent_vms: vms.iter().take(RECENT_VMS_LIMIT).cloned().collect(),
        }
    }
}
