//! VM inventory backed by a single JSON document.
//!
//! Layout on disk: `{"vms": {"<vm_id>": {vm_id, provider_type, status, ...}}}`.
//! Every access reads or rewrites the whole document. Mutations are
//! serialized through a per-store lock and land via write-to-temp + rename,
//! so readers never observe a half-written file.

use cloudvm_common::{VmRecord, VmStatus, VmSummary};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// What to do when the backing document cannot be read or written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageFailurePolicy {
    /// Log the failure; reads return empty results, writes report `false`.
    #[default]
    Degrade,
    /// Propagate the failure to the caller.
    FailLoud,
}

impl StorageFailurePolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "degrade" => Some(StorageFailurePolicy::Degrade),
            "fail_loud" | "strict" => Some(StorageFailurePolicy::FailLoud),
            _ => None,
        }
    }
}

/// Result of [`VmRepository::insert_new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// Degraded write; the record is not in the store.
    NotPersisted,
    /// A record with the same `vm_id` already exists and was left untouched.
    IdTaken,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    vms: BTreeMap<String, VmRecord>,
}

pub struct VmRepository {
    path: PathBuf,
    policy: StorageFailurePolicy,
    write_lock: Mutex<()>,
}

impl VmRepository {
    /// Open the store at `path`, creating an empty document if none exists.
    pub async fn open(
        path: impl AsRef<Path>,
        policy: StorageFailurePolicy,
    ) -> Result<Self, StoreError> {
        let repo = Self {
            path: path.as_ref().to_path_buf(),
            policy,
            write_lock: Mutex::new(()),
        };
        if !fs::try_exists(&repo.path).await? {
            if let Some(parent) = repo.path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).await?;
                }
            }
            repo.persist(&StoreDocument::default()).await?;
            tracing::info!("Initialized empty VM store at {}", repo.path.display());
        }
        Ok(repo)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> StorageFailurePolicy {
        self.policy
    }

    async fn load(&self) -> Result<StoreDocument, StoreError> {
        let content = fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    async fn persist(&self, doc: &StoreDocument) -> Result<(), StoreError> {
        let tmp = PathBuf::from(format!("{}.tmp", self.path.display()));
        let content = serde_json::to_string_pretty(doc)?;
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, &self.path).await?;
        tracing::debug!("Persisted VM store with {} records", doc.vms.len());
        Ok(())
    }

    fn on_read_failure<T: Default>(&self, op: &str, err: StoreError) -> Result<T, StoreError> {
        match self.policy {
            StorageFailurePolicy::Degrade => {
                tracing::error!("VM store {} failed, returning empty result: {}", op, err);
                Ok(T::default())
            }
            StorageFailurePolicy::FailLoud => Err(err),
        }
    }

    fn on_write_failure(&self, op: &str, err: StoreError) -> Result<bool, StoreError> {
        match self.policy {
            StorageFailurePolicy::Degrade => {
                tracing::error!("VM store {} failed: {}", op, err);
                Ok(false)
            }
            StorageFailurePolicy::FailLoud => Err(err),
        }
    }

    /// Insert or replace a record by `vm_id`. Returns whether it was persisted.
    pub async fn save(&self, record: VmRecord) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        let vm_id = record.vm_id.clone();
        let outcome = async {
            let mut doc = self.load().await?;
            doc.vms.insert(record.vm_id.clone(), record);
            self.persist(&doc).await
        }
        .await;
        match outcome {
            Ok(()) => {
                tracing::debug!("Saved VM {}", vm_id);
                Ok(true)
            }
            Err(e) => self.on_write_failure("save", e),
        }
    }

    /// Insert `record` only if its `vm_id` is free. The check and the write
    /// happen under the same lock.
    pub async fn insert_new(&self, record: VmRecord) -> Result<InsertOutcome, StoreError> {
        let _guard = self.write_lock.lock().await;
        let vm_id = record.vm_id.clone();
        let outcome = async {
            let mut doc = self.load().await?;
            if doc.vms.contains_key(&record.vm_id) {
                return Ok(InsertOutcome::IdTaken);
            }
            doc.vms.insert(record.vm_id.clone(), record);
            self.persist(&doc).await?;
            Ok::<InsertOutcome, StoreError>(InsertOutcome::Inserted)
        }
        .await;
        match outcome {
            Ok(InsertOutcome::IdTaken) => {
                tracing::warn!("VM {} already recorded, refusing to overwrite", vm_id);
                Ok(InsertOutcome::IdTaken)
            }
            Ok(inserted) => {
                tracing::debug!("Inserted VM {}", vm_id);
                Ok(inserted)
            }
            Err(e) => self
                .on_write_failure("insert", e)
                .map(|_| InsertOutcome::NotPersisted),
        }
    }

    /// Every record, most recent first.
    pub async fn list_all(&self) -> Result<Vec<VmRecord>, StoreError> {
        match self.load().await {
            Ok(doc) => {
                let mut vms: Vec<VmRecord> = doc.vms.into_values().collect();
                vms.sort_by(|a, b| {
                    b.created_at
                        .cmp(&a.created_at)
                        .then_with(|| a.vm_id.cmp(&b.vm_id))
                });
                Ok(vms)
            }
            Err(e) => self.on_read_failure("read", e),
        }
    }

    /// Case-insensitive match on the provider name, ordering preserved.
    pub async fn list_by_provider(&self, provider: &str) -> Result<Vec<VmRecord>, StoreError> {
        let vms = self.list_all().await?;
        Ok(vms
            .into_iter()
            .filter(|vm| vm.provider_type.eq_ignore_ascii_case(provider))
            .collect())
    }

    pub async fn list_by_status(&self, status: VmStatus) -> Result<Vec<VmRecord>, StoreError> {
        let vms = self.list_all().await?;
        Ok(vms.into_iter().filter(|vm| vm.status == status).collect())
    }

    pub async fn get_by_id(&self, vm_id: &str) -> Result<Option<VmRecord>, StoreError> {
        match self.load().await {
            Ok(mut doc) => Ok(doc.vms.remove(vm_id)),
            Err(e) => self.on_read_failure("lookup", e),
        }
    }

    /// `Ok(false)` when `vm_id` is unknown; only `status` is touched.
    pub async fn update_status(&self, vm_id: &str, status: VmStatus) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        let outcome = async {
            let mut doc = self.load().await?;
            match doc.vms.get_mut(vm_id) {
                Some(record) => record.status = status,
                None => return Ok(false),
            }
            self.persist(&doc).await?;
            Ok::<bool, StoreError>(true)
        }
        .await;
        match outcome {
            Ok(updated) => {
                if updated {
                    tracing::info!("VM {} status set to {}", vm_id, status);
                }
                Ok(updated)
            }
            Err(e) => self.on_write_failure("status update", e),
        }
    }

    pub async fn summary(&self) -> Result<VmSummary, StoreError> {
        let vms = self.list_all().await?;
        Ok(VmSummary::from_sorted(&vms))
    }
}
