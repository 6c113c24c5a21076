use crate::{AwsProvider, AzureProvider, GcpProvider, OnPremiseProvider, VmProvider};
use cloudvm_common::{ProviderInfo, ProviderKind};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unsupported provider: {0}")]
    Unsupported(ProviderKind),
}

/// Builds a fresh provider instance per call.
pub type ProviderConstructor = Arc<dyn Fn() -> Box<dyn VmProvider> + Send + Sync>;

/// Registration table mapping a provider kind to its constructor.
///
/// Shared process-wide (behind an `Arc`); `register` takes the write lock so
/// it may be called while requests are being served.
pub struct ProviderFactory {
    registry: RwLock<HashMap<ProviderKind, ProviderConstructor>>,
}

impl Default for ProviderFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderFactory {
    /// Factory with the four built-in providers registered.
    pub fn new() -> Self {
        let factory = Self::empty();
        factory.register(ProviderKind::Aws, || Box::new(AwsProvider::new()));
        factory.register(ProviderKind::Azure, || Box::new(AzureProvider::new()));
        factory.register(ProviderKind::Gcp, || Box::new(GcpProvider::new()));
        factory.register(ProviderKind::OnPremise, || {
            Box::new(OnPremiseProvider::new())
        });
        factory
    }

    pub fn empty() -> Self {
        Self {
            registry: RwLock::new(HashMap::new()),
        }
    }

    /// Insert or replace the constructor for `kind`.
    ///
    /// Custom tags are normalized the way request tags are, so "My-Cloud"
    /// is stored and looked up as "my_cloud".
    pub fn register<F>(&self, kind: ProviderKind, constructor: F)
    where
        F: Fn() -> Box<dyn VmProvider> + Send + Sync + 'static,
    {
        let kind = normalize(&kind);
        let mut registry = self.registry.write().unwrap_or_else(|e| e.into_inner());
        if registry.insert(kind.clone(), Arc::new(constructor)).is_some() {
            tracing::info!("Provider '{}' re-registered", kind);
        } else {
            tracing::debug!("Provider '{}' registered", kind);
        }
    }

    pub fn create(&self, kind: &ProviderKind) -> Result<Box<dyn VmProvider>, ProviderError> {
        // Clone the constructor out so the lock is not held while it runs.
        let constructor = {
            let registry = self.registry.read().unwrap_or_else(|e| e.into_inner());
            registry.get(&normalize(kind)).cloned()
        };
        match constructor {
            Some(build) => Ok(build()),
            None => Err(ProviderError::Unsupported(normalize(kind))),
        }
    }

    pub fn is_registered(&self, kind: &ProviderKind) -> bool {
        let registry = self.registry.read().unwrap_or_else(|e| e.into_inner());
        registry.contains_key(&normalize(kind))
    }

    /// Provider metadata keyed by kind tag. Instantiates each provider to read it.
    pub fn list_available(&self) -> BTreeMap<String, ProviderInfo> {
        let entries: Vec<(ProviderKind, ProviderConstructor)> = {
            let registry = self.registry.read().unwrap_or_else(|e| e.into_inner());
            registry
                .iter()
                .map(|(k, c)| (k.clone(), Arc::clone(c)))
                .collect()
        };
        entries
            .into_iter()
            .map(|(kind, build)| (kind.as_str().to_string(), build().info()))
            .collect()
    }

    /// Resolve a user-supplied provider name, given either as a kind tag
    /// ("on_premise") or a display name ("OnPremise"), case-insensitively.
    /// Returns the kind and its display name.
    pub fn resolve_name(&self, name: &str) -> Option<(ProviderKind, String)> {
        let kind = ProviderKind::parse(name);
        if self.is_registered(&kind) {
            let display = self.create(&kind).ok()?.name().to_string();
            return Some((kind, display));
        }
        self.list_available()
            .into_iter()
            .find(|(_, info)| info.name.eq_ignore_ascii_case(name.trim()))
            .map(|(tag, info)| (ProviderKind::parse(&tag), info.name))
    }
}

fn normalize(kind: &ProviderKind) -> ProviderKind {
    match kind {
        ProviderKind::Custom(tag) => ProviderKind::parse(tag),
        builtin => builtin.clone(),
    }
}
