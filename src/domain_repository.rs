//! Whole-collection repositories for portal data that other screens watch
//! (vacation balances, requests). Every successful rewrite is announced on
//! the [`ChangeBus`] under the record type's topic.

use std::sync::{Arc, Mutex, MutexGuard};

use log::info;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use crate::app_response::AppResponse;
use crate::change_bus::{ChangeBus, REQUESTS_CHANGED, VACATION_BALANCES_CHANGED};
use crate::portal_model::{PortalRequest, RequestStatus, VacationBalance};
use crate::record_store::{KeyedRecordStore, PartitionKey};
use crate::storage_medium::StorageMedium;

pub trait DomainRecord: Serialize + DeserializeOwned + Clone {
    const STORAGE_KEY: &'static str;
    const TOPIC: &'static str;

    fn record_id(&self) -> String;
}

impl DomainRecord for VacationBalance {
    const STORAGE_KEY: &'static str = "vacation_balances";
    const TOPIC: &'static str = VACATION_BALANCES_CHANGED;

    fn record_id(&self) -> String {
        format!("{}_{}", self.employee_id, self.year)
    }
}

impl DomainRecord for PortalRequest {
    const STORAGE_KEY: &'static str = "portal_requests";
    const TOPIC: &'static str = REQUESTS_CHANGED;

    fn record_id(&self) -> String {
        self.id.clone()
    }
}

pub struct DomainRepository<T: DomainRecord> {
    store: KeyedRecordStore<T>,
    bus: Arc<ChangeBus>,
    write_lock: Mutex<()>,
}

impl<T: DomainRecord> DomainRepository<T> {
    pub fn new(medium: Arc<dyn StorageMedium>, bus: Arc<ChangeBus>) -> Self {
        let partition = PartitionKey::custom(T::STORAGE_KEY, |domain, _| domain.to_string());
        DomainRepository {
            store: KeyedRecordStore::new(medium, partition),
            bus,
            write_lock: Mutex::new(()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>, AppResponse> {
        self.write_lock
            .lock()
            .map_err(|_| AppResponse::StorageFailure(format!("{} lock poisoned", T::STORAGE_KEY)))
    }

    pub fn list(&self) -> Vec<T> {
        self.store.load(T::STORAGE_KEY)
    }

    pub fn get(&self, id: &str) -> Option<T> {
        self.list().into_iter().find(|r| r.record_id() == id)
    }

    fn write(&self, records: &[T]) -> Result<(), AppResponse> {
        self.store.save(T::STORAGE_KEY, records)?;
        self.bus.publish(
            T::TOPIC,
            &json!({ "key": T::STORAGE_KEY, "count": records.len() }),
        );
        Ok(())
    }

    /// Inserts or replaces the record with the same id.
    pub fn upsert(&self, record: T) -> Result<T, AppResponse> {
        let _guard = self.lock()?;
        let mut records = self.list();
        let id = record.record_id();

        match records.iter_mut().find(|r| r.record_id() == id) {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }
        self.write(&records)?;
        Ok(record)
    }

    pub fn remove(&self, id: &str) -> Result<(), AppResponse> {
        let _guard = self.lock()?;
        let mut records = self.list();
        let before = records.len();
        records.retain(|r| r.record_id() != id);

        if records.len() == before {
            return Err(AppResponse::NotFound(format!(
                "No {} record found with id: {}",
                T::STORAGE_KEY,
                id
            )));
        }
        self.write(&records)
    }

    /// Applies `change` to the record with `id` and writes the collection
    /// back, all under the repository lock.
    pub fn modify<F>(&self, id: &str, change: F) -> Result<T, AppResponse>
    where
        F: FnOnce(&mut T) -> Result<(), AppResponse>,
    {
        let _guard = self.lock()?;
        let mut records = self.list();
        let record = records
            .iter_mut()
            .find(|r| r.record_id() == id)
            .ok_or_else(|| AppResponse::NotFound(format!("No {} record found with id: {}", T::STORAGE_KEY, id)))?;

        change(record)?;
        let updated = record.clone();
        self.write(&records)?;
        Ok(updated)
    }

    pub fn replace_all(&self, records: Vec<T>) -> Result<(), AppResponse> {
        let _guard = self.lock()?;
        self.write(&records)?;
        info!("Replaced {} with {} records", T::STORAGE_KEY, records.len());
        Ok(())
    }
}

impl DomainRepository<VacationBalance> {
    /// Moves `days` from available to used.
    pub fn consume_days(&self, employee_id: &str, year: i32, days: u32) -> Result<VacationBalance, AppResponse> {
        let id = format!("{}_{}", employee_id, year);
        self.modify(&id, |balance| {
            if days > balance.available_days {
                return Err(AppResponse::InvalidInput(format!(
                    "requested {} days but only {} available",
                    days, balance.available_days
                )));
            }
            balance.available_days -= days;
            balance.used_days += days;
            Ok(())
        })
    }
}

impl DomainRepository<PortalRequest> {
    pub fn set_status(&self, id: &str, status: RequestStatus) -> Result<PortalRequest, AppResponse> {
        self.modify(id, |request| {
            request.status = status;
            Ok(())
        })
    }

    pub fn for_employee(&self, employee_id: &str) -> Vec<PortalRequest> {
        let mut requests: Vec<PortalRequest> = self
            .list()
            .into_iter()
            .filter(|r| r.employee_id == employee_id)
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        requests
    }
}
