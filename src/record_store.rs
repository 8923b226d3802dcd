//! Year-partitioned collections of records over a [`StorageMedium`].
//!
//! A partition is one storage key holding a JSON array. The key is produced
//! by the store's [`PartitionKey`] (by default `<domain>_<year>`), so
//! `birthday_likes_2026` and `birthday_likes_2025` are independent values
//! that can be archived separately.
//!
//! Loading never fails. A missing key is an empty collection, a payload that
//! is not a JSON array is an empty collection, and inside an array every
//! element is decoded on its own: elements that do not fit the record shape
//! are dropped and logged while the rest are kept in order.

use std::marker::PhantomData;
use std::sync::Arc;

use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::app_response::AppResponse;
use crate::storage_medium::StorageMedium;

/// Maps a year to the storage key of its partition.
pub struct PartitionKey {
    domain: String,
    naming: Box<dyn Fn(&str, i32) -> String + Send + Sync>,
}

impl PartitionKey {
    /// `<domain>_<year>`.
    pub fn yearly(domain: impl Into<String>) -> Self {
        PartitionKey {
            domain: domain.into(),
            naming: Box::new(|domain: &str, year: i32| format!("{}_{}", domain, year)),
        }
    }

    pub fn custom(
        domain: impl Into<String>,
        naming: impl Fn(&str, i32) -> String + Send + Sync + 'static,
    ) -> Self {
        PartitionKey {
            domain: domain.into(),
            naming: Box::new(naming),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn key_for(&self, year: i32) -> String {
        (self.naming)(&self.domain, year)
    }
}

/// Result of decoding one stored array element.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T> {
    Valid(T),
    Malformed(String),
}

/// Decodes a raw partition payload element by element.
///
/// Returns `None` when the payload is not a JSON array at all.
pub fn decode_payload<T: DeserializeOwned>(raw: &str) -> Option<Vec<Decoded<T>>> {
    let items = match serde_json::from_str::<JsonValue>(raw) {
        Ok(JsonValue::Array(items)) => items,
        Ok(_) | Err(_) => return None,
    };

    Some(
        items
            .into_iter()
            .map(|item| match serde_json::from_value::<T>(item) {
                Ok(record) => Decoded::Valid(record),
                Err(e) => Decoded::Malformed(e.to_string()),
            })
            .collect(),
    )
}

pub struct KeyedRecordStore<T> {
    medium: Arc<dyn StorageMedium>,
    partition: PartitionKey,
    _records: PhantomData<fn() -> T>,
}

impl<T> KeyedRecordStore<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(medium: Arc<dyn StorageMedium>, partition: PartitionKey) -> Self {
        KeyedRecordStore {
            medium,
            partition,
            _records: PhantomData,
        }
    }

    pub fn key_for(&self, year: i32) -> String {
        self.partition.key_for(year)
    }

    pub fn domain(&self) -> &str {
        self.partition.domain()
    }

    /// Loads the collection stored under `key`; never fails.
    pub fn load(&self, key: &str) -> Vec<T> {
        let raw = match self.medium.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Reading '{}' failed, treating as empty: {}", key, e);
                return Vec::new();
            }
        };

        let Some(decoded) = decode_payload::<T>(&raw) else {
            warn!("Malformed payload under '{}', treating as empty", key);
            return Vec::new();
        };

        let mut records = Vec::with_capacity(decoded.len());
        for (index, item) in decoded.into_iter().enumerate() {
            match item {
                Decoded::Valid(record) => records.push(record),
                Decoded::Malformed(reason) => {
                    warn!("Dropping malformed record #{} under '{}': {}", index, key, reason);
                }
            }
        }
        records
    }

    /// Writes the whole collection under `key`.
    pub fn save(&self, key: &str, records: &[T]) -> Result<(), AppResponse> {
        let payload = serde_json::to_string(records)?;
        self.medium.set(key, &payload)?;
        debug!("Saved {} records under '{}'", records.len(), key);
        Ok(())
    }

    pub fn load_partition(&self, year: i32) -> Vec<T> {
        self.load(&self.key_for(year))
    }

    pub fn save_partition(&self, year: i32, records: &[T]) -> Result<(), AppResponse> {
        self.save(&self.key_for(year), records)
    }

    /// Years that currently have a stored partition, ascending.
    ///
    /// Only meaningful with [`PartitionKey::yearly`] naming; keys that do not
    /// end in a year are skipped.
    pub fn partition_years(&self) -> Result<Vec<i32>, AppResponse> {
        let prefix = format!("{}_", self.domain());
        let mut years: Vec<i32> = self
            .medium
            .keys_with_prefix(&prefix)?
            .iter()
            .filter_map(|key| key[prefix.len()..].parse::<i32>().ok())
            .collect();
        years.sort_unstable();
        years.dedup();
        Ok(years)
    }

    /// Removes a year's partition and hands back what it held.
    pub fn archive_partition(&self, year: i32) -> Result<Vec<T>, AppResponse> {
        let key = self.key_for(year);
        let records = self.load(&key);
        if self.medium.remove(&key)? {
            info!("Archived {} records from '{}'", records.len(), key);
        }
        Ok(records)
    }
}
