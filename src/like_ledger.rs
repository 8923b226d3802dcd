//! Likes on birthday cards, one partition per year.
//!
//! Every mutation loads the whole partition, changes it and writes it back.
//! Within one ledger the sequence is serialized by `write_lock`; two ledgers
//! over the same medium (two browser tabs, two processes) are not
//! coordinated and the later save wins.

use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, info};

use crate::app_response::AppResponse;
use crate::portal_model::Like;
use crate::record_store::{KeyedRecordStore, PartitionKey};
use crate::storage_medium::StorageMedium;

pub struct LikeLedger {
    store: KeyedRecordStore<Like>,
    write_lock: Mutex<()>,
}

impl LikeLedger {
    pub fn new(medium: Arc<dyn StorageMedium>, domain: &str) -> Self {
        Self::with_partition(medium, PartitionKey::yearly(domain))
    }

    pub fn with_partition(medium: Arc<dyn StorageMedium>, partition: PartitionKey) -> Self {
        LikeLedger {
            store: KeyedRecordStore::new(medium, partition),
            write_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &KeyedRecordStore<Like> {
        &self.store
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>, AppResponse> {
        self.write_lock
            .lock()
            .map_err(|_| AppResponse::StorageFailure("like ledger lock poisoned".to_string()))
    }

    /// Likes on `subject_id` in insertion order.
    pub fn get_likes(&self, subject_id: &str, year: i32) -> Vec<Like> {
        self.store
            .load_partition(year)
            .into_iter()
            .filter(|like| like.subject_id == subject_id)
            .collect()
    }

    pub fn count_likes(&self, subject_id: &str, year: i32) -> usize {
        self.get_likes(subject_id, year).len()
    }

    pub fn has_liked(&self, subject_id: &str, author_id: &str, year: i32) -> bool {
        self.store
            .load_partition(year)
            .iter()
            .any(|like| like.matches(subject_id, author_id, year))
    }

    /// Records a like. A second like by the same author is a silent no-op.
    pub fn add_like(&self, subject_id: &str, author_id: &str, year: i32) -> Result<(), AppResponse> {
        let _guard = self.lock()?;
        let mut likes = self.store.load_partition(year);

        if likes.iter().any(|like| like.matches(subject_id, author_id, year)) {
            debug!("Like {} -> {} ({}) already present", author_id, subject_id, year);
            return Ok(());
        }

        likes.push(Like::new(subject_id, author_id, year));
        self.store.save_partition(year, &likes)?;
        info!("Like added: {} -> {} ({})", author_id, subject_id, year);
        Ok(())
    }

    /// Drops the author's like on `subject_id`, if any. Always saves.
    pub fn remove_like(&self, subject_id: &str, author_id: &str, year: i32) -> Result<(), AppResponse> {
        let _guard = self.lock()?;
        let mut likes = self.store.load_partition(year);
        let before = likes.len();

        likes.retain(|like| !like.matches(subject_id, author_id, year));
        self.store.save_partition(year, &likes)?;

        if likes.len() != before {
            info!("Like removed: {} -> {} ({})", author_id, subject_id, year);
        }
        Ok(())
    }

    /// Flips the author's like and reports whether it is now set.
    pub fn toggle_like(&self, subject_id: &str, author_id: &str, year: i32) -> Result<bool, AppResponse> {
        if self.has_liked(subject_id, author_id, year) {
            self.remove_like(subject_id, author_id, year)?;
            Ok(false)
        } else {
            self.add_like(subject_id, author_id, year)?;
            Ok(true)
        }
    }
}
