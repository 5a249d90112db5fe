use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;

use super::client::RecordStore;
use super::error::StoreError;
use crate::model::{Driver, Job, Manifest, Vehicle};

/// HashMap-backed record store used by the demo command and unit tests.
/// Mirrors the HTTP store's semantics: `put_*` updates an existing row and
/// fails with [`StoreError::NotFound`] when the row is gone, `create_*`
/// inserts, and reads return `None` for missing ids.
#[derive(Default, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    jobs: HashMap<String, Job>,
    drivers: HashMap<String, Driver>,
    vehicles: HashMap<String, Vehicle>,
    manifests: HashMap<String, Manifest>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_job(&self, job: Job) {
        self.inner.lock().unwrap().jobs.insert(job.id.clone(), job);
    }

    pub fn seed_driver(&self, driver: Driver) {
        self.inner
            .lock()
            .unwrap()
            .drivers
            .insert(driver.id.clone(), driver);
    }

    pub fn seed_vehicle(&self, vehicle: Vehicle) {
        self.inner
            .lock()
            .unwrap()
            .vehicles
            .insert(vehicle.id.clone(), vehicle);
    }

    pub fn job(&self, id: &str) -> Option<Job> {
        self.inner.lock().unwrap().jobs.get(id).cloned()
    }

    pub fn manifest_count(&self) -> usize {
        self.inner.lock().unwrap().manifests.len()
    }
}

impl RecordStore for MemoryStore {
    async fn get_job(&self, id: &str) -> Result<Option<Job>, StoreError> {
        Ok(self.inner.lock().unwrap().jobs.get(id).cloned())
    }

    async fn put_job(&self, job: &Job) -> Result<Job, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.jobs.contains_key(&job.id) {
            return Err(StoreError::NotFound);
        }
        let mut row = job.clone();
        row.updated_at = Utc::now();
        inner.jobs.insert(row.id.clone(), row.clone());
        Ok(row)
    }

    async fn jobs_for_manifest(&self, manifest_id: &str) -> Result<Vec<Job>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut jobs: Vec<Job> = inner
            .jobs
            .values()
            .filter(|j| j.manifest_id.as_deref() == Some(manifest_id))
            .cloned()
            .collect();
        jobs.sort_by_key(|j| j.sequence_order);
        Ok(jobs)
    }

    async fn get_driver(&self, id: &str) -> Result<Option<Driver>, StoreError> {
        Ok(self.inner.lock().unwrap().drivers.get(id).cloned())
    }

    async fn get_vehicle(&self, id: &str) -> Result<Option<Vehicle>, StoreError> {
        Ok(self.inner.lock().unwrap().vehicles.get(id).cloned())
    }

    async fn get_manifest(&self, id: &str) -> Result<Option<Manifest>, StoreError> {
        Ok(self.inner.lock().unwrap().manifests.get(id).cloned())
    }

    async fn find_manifest_by_key(
        &self,
        dispatch_key: &str,
    ) -> Result<Option<Manifest>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .manifests
            .values()
            .find(|m| m.dispatch_key.as_deref() == Some(dispatch_key))
            .cloned())
    }

    async fn create_manifest(&self, manifest: &Manifest) -> Result<Manifest, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let mut row = manifest.clone();
        row.updated_at = Utc::now();
        inner.manifests.insert(row.id.clone(), row.clone());
        Ok(row)
    }

    async fn put_manifest(&self, manifest: &Manifest) -> Result<Manifest, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.manifests.contains_key(&manifest.id) {
            return Err(StoreError::NotFound);
        }
        let mut row = manifest.clone();
        row.updated_at = Utc::now();
        inner.manifests.insert(row.id.clone(), row.clone());
        Ok(row)
    }
}
