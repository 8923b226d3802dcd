//! Key-value media the portal stores persist to.
//!
//! [`StorageMedium`] is the whole surface the rest of the crate sees: string
//! keys, string values, a write that can fail on capacity. Two media ship:
//!
//! - [`LmdbMedium`] keeps everything in one named LMDB database. Each write
//!   runs in its own read-write transaction, so a failed write never leaves a
//!   half-written value behind.
//! - [`MemoryMedium`] keeps everything in a map, optionally capped at a byte
//!   quota. Tests and throwaway sessions use it.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use lmdb::{Cursor, Database, DatabaseFlags, Environment, Error as LmdbError, Transaction, WriteFlags};
use log::{debug, info, warn};

use crate::app_response::AppResponse;
use crate::portal_config::PortalConfig;

const STORE_DB_NAME: &str = "portal_store";

pub trait StorageMedium: Send + Sync {
    /// Returns the stored value, or `None` when the key was never written.
    fn get(&self, key: &str) -> Result<Option<String>, AppResponse>;

    /// Replaces the value under `key`. Fails with
    /// [`AppResponse::StorageFailure`] when the medium rejects the write.
    fn set(&self, key: &str, value: &str) -> Result<(), AppResponse>;

    /// Deletes `key`; `Ok(false)` when there was nothing to delete.
    fn remove(&self, key: &str) -> Result<bool, AppResponse>;

    /// Keys starting with `prefix`, in ascending byte order.
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, AppResponse>;
}

fn check_key(key: &str) -> Result<(), AppResponse> {
    if key.is_empty() {
        return Err(AppResponse::BadRequest("storage key must not be empty".to_string()));
    }
    Ok(())
}

/// In-memory medium with an optional byte quota over keys plus values.
#[derive(Debug, Default)]
pub struct MemoryMedium {
    entries: Mutex<BTreeMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        MemoryMedium {
            entries: Mutex::new(BTreeMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, String>>, AppResponse> {
        self.entries
            .lock()
            .map_err(|_| AppResponse::StorageFailure("memory medium lock poisoned".to_string()))
    }

    pub fn used_bytes(&self) -> Result<usize, AppResponse> {
        let entries = self.lock()?;
        Ok(entries.iter().map(|(k, v)| k.len() + v.len()).sum())
    }
}

impl StorageMedium for MemoryMedium {
    fn get(&self, key: &str) -> Result<Option<String>, AppResponse> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppResponse> {
        check_key(key)?;
        let mut entries = self.lock()?;

        if let Some(quota) = self.quota_bytes {
            let used: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = used + key.len() + value.len();
            if needed > quota {
                warn!("Rejecting write to '{}': {} bytes needed, quota is {}", key, needed, quota);
                return Err(AppResponse::StorageFailure(format!(
                    "storage quota exceeded writing '{}'",
                    key
                )));
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, AppResponse> {
        Ok(self.lock()?.remove(key).is_some())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, AppResponse> {
        let entries = self.lock()?;
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }
}

/// LMDB-backed medium. The environment lives in a directory named by
/// [`PortalConfig::storage_path`].
pub struct LmdbMedium {
    env: Environment,
    db: Database,
    path: PathBuf,
}

impl LmdbMedium {
    pub fn init(config: &PortalConfig) -> Result<Self, AppResponse> {
        let path = PathBuf::from(&config.storage_path);

        if !path.exists() {
            info!("Creating storage directory at: {}", path.display());
            fs::create_dir_all(&path).map_err(|e| {
                AppResponse::StorageFailure(format!(
                    "cannot create storage directory {}: {}",
                    path.display(),
                    e
                ))
            })?;
        }

        let env = Environment::new()
            .set_max_dbs(4)
            .set_map_size(config.map_size_bytes)
            .open(&path)?;
        let db = env.create_db(Some(STORE_DB_NAME), DatabaseFlags::empty())?;

        info!("Opened LMDB store at {} ({} bytes map)", path.display(), config.map_size_bytes);
        Ok(LmdbMedium { env, db, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes every key, returning how many were there.
    pub fn clear_all(&self) -> Result<usize, AppResponse> {
        let count = self.keys_with_prefix("")?.len();
        let mut txn = self.env.begin_rw_txn()?;
        txn.clear_db(self.db)?;
        txn.commit()?;
        info!("Cleared {} keys from {}", count, self.path.display());
        Ok(count)
    }

    /// Flushes committed writes to disk.
    pub fn sync(&self) -> Result<(), AppResponse> {
        self.env.sync(true)?;
        info!("Synced LMDB store at {}", self.path.display());
        Ok(())
    }
}

impl StorageMedium for LmdbMedium {
    fn get(&self, key: &str) -> Result<Option<String>, AppResponse> {
        let txn = self.env.begin_ro_txn()?;
        match txn.get(self.db, &key) {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(bytes).into_owned())),
            Err(LmdbError::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppResponse> {
        check_key(key)?;
        let mut txn = self.env.begin_rw_txn()?;
        if let Err(e) = txn.put(self.db, &key, &value, WriteFlags::empty()) {
            warn!("Write to '{}' rejected: {}", key, e);
            return Err(e.into());
        }
        txn.commit()?;
        debug!("Wrote {} bytes to '{}'", value.len(), key);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, AppResponse> {
        let mut txn = self.env.begin_rw_txn()?;
        match txn.del(self.db, &key, None) {
            Ok(()) => {
                txn.commit()?;
                Ok(true)
            }
            Err(LmdbError::NotFound) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, AppResponse> {
        let txn = self.env.begin_ro_txn()?;
        let mut cursor = txn.open_ro_cursor(self.db)?;
        let prefix = prefix.as_bytes();

        // `iter_from`/`iter_start` panic on an empty range; a plain walk does not.
        let keys: Vec<String> = cursor
            .iter()
            .map(|(key, _)| key)
            .skip_while(|key| *key < prefix)
            .take_while(|key| key.starts_with(prefix))
            .map(|key| String::from_utf8_lossy(key).into_owned())
            .collect();
        Ok(keys)
    }
}
