use crate::repository::StorageFailurePolicy;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_STORAGE_FILE: &str = "vm_storage.json";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

/// Process configuration, read from the environment (after `.env` is loaded).
#[derive(Debug, Clone)]
pub struct Settings {
    pub storage_file: PathBuf,
    pub bind_addr: SocketAddr,
    pub storage_failure_policy: StorageFailurePolicy,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from any variable source. Unparseable values fall back
    /// to defaults with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let storage_file = read("VM_STORAGE_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_FILE));

        let default_addr: SocketAddr = ([0, 0, 0, 0], 8000).into();
        let bind_addr = match read("CLOUDVM_BIND_ADDR") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(
                    "Invalid CLOUDVM_BIND_ADDR '{}', using {}",
                    raw,
                    DEFAULT_BIND_ADDR
                );
                default_addr
            }),
            None => default_addr,
        };

        let storage_failure_policy = match read("STORAGE_FAILURE_POLICY") {
            Some(raw) => StorageFailurePolicy::parse(&raw).unwrap_or_else(|| {
                tracing::warn!("Invalid STORAGE_FAILURE_POLICY '{}', using degrade", raw);
                StorageFailurePolicy::Degrade
            }),
            None => StorageFailurePolicy::Degrade,
        };

        Self {
            storage_file,
            bind_addr,
            storage_failure_policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Settings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let s = settings(&[]);
        assert_eq!(s.storage_file, PathBuf::from(DEFAULT_STORAGE_FILE));
        assert_eq!(s.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(s.storage_failure_policy, StorageFailurePolicy::Degrade);
    }

    #[test]
    fn values_are_read() {
        let s = settings(&[
            ("VM_STORAGE_FILE", "/var/lib/cloudvm/store.json"),
            ("CLOUDVM_BIND_ADDR", "127.0.0.1:9090"),
            ("STORAGE_FAILURE_POLICY", "fail_loud"),
        ]);
        assert_eq!(s.storage_file, PathBuf::from("/var/lib/cloudvm/store.json"));
        assert_eq!(s.bind_addr.port(), 9090);
        assert_eq!(s.storage_failure_policy, StorageFailurePolicy::FailLoud);
    }

    #[test]
    fn bad_values_fall_back() {
        let s = settings(&[
            ("CLOUDVM_BIND_ADDR", "not-an-addr"),
            ("STORAGE_FAILURE_POLICY", "sometimes"),
            ("VM_STORAGE_FILE", "   "),
        ]);
        assert_eq!(s.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(s.storage_failure_policy, StorageFailurePolicy::Degrade);
        assert_eq!(s.storage_file, PathBuf::from(DEFAULT_STORAGE_FILE));
    }
}
