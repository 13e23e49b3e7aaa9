//! In-memory store with fault injection.
//!
//! Evaluates the KPIs with `kpi::compute`. Used by tests and local runs.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::kpi::{compute, DailyEnergy, Efficiency, Kpi, KpiFilter, MeanWindSpeed, TotalEnergy};
use crate::model::Reading;
use crate::store::{ReadingStore, StoreError};

#[derive(Default)]
pub struct MemoryStore {
    readings: Mutex<Vec<Reading>>,
    failing_kpis: Mutex<HashSet<Kpi>>,
    fail_appends: AtomicBool,
    fail_index: AtomicBool,
    index_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with `readings`.
    pub fn with_readings(readings: impl IntoIterator<Item = Reading>) -> Self {
        let store = Self::new();
        store.lock_readings().extend(readings);
        store
    }

    /// Snapshot of everything appended so far, in append order.
    pub fn readings(&self) -> Vec<Reading> {
        self.lock_readings().clone()
    }

    pub fn len(&self) -> usize {
        self.lock_readings().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// How many times `ensure_index` has been called.
    pub fn index_calls(&self) -> usize {
        self.index_calls.load(Ordering::SeqCst)
    }

    /// Make subsequent appends fail.
    pub fn set_fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent `ensure_index` calls fail.
    pub fn set_fail_index(&self, fail: bool) {
        self.fail_index.store(fail, Ordering::SeqCst);
    }

    /// Make queries for `kpi` fail until cleared.
    pub fn set_kpi_failure(&self, kpi: Kpi, fail: bool) {
        let mut failing = self
            .failing_kpis
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if fail {
            failing.insert(kpi);
        } else {
            failing.remove(&kpi);
        }
    }

    fn lock_readings(&self) -> MutexGuard<'_, Vec<Reading>> {
        self.readings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_kpi(&self, kpi: Kpi) -> Result<(), StoreError> {
        let failing = self
            .failing_kpis
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if failing.contains(&kpi) {
            return Err(StoreError::Unavailable(format!("{} query failed", kpi.name())));
        }
        Ok(())
    }
}

#[async_trait]
impl ReadingStore for MemoryStore {
    async fn ensure_index(&self) -> Result<(), StoreError> {
        self.index_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_index.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("index creation failed".into()));
        }
        Ok(())
    }

    async fn append(&self, reading: &Reading) -> Result<(), StoreError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("append failed".into()));
        }
        self.lock_readings().push(reading.clone());
        Ok(())
    }

    async fn mean_wind_speed(&self, filter: &KpiFilter) -> Result<Vec<MeanWindSpeed>, StoreError> {
        self.check_kpi(Kpi::MeanWindSpeed)?;
        Ok(compute::mean_wind_speed(self.lock_readings().iter(), filter))
    }

    async fn production_efficiency(
        &self,
        filter: &KpiFilter,
    ) -> Result<Vec<Efficiency>, StoreError> {
        self.check_kpi(Kpi::ProductionEfficiency)?;
        Ok(compute::production_efficiency(self.lock_readings().iter(), filter))
    }

    async fn daily_energy(
        &self,
        filter: &KpiFilter,
        limit: usize,
    ) -> Result<Vec<DailyEnergy>, StoreError> {
        self.check_kpi(Kpi::DailyEnergy)?;
        Ok(compute::daily_energy(self.lock_readings().iter(), filter, limit))
    }

    async fn total_energy(&self, filter: &KpiFilter) -> Result<TotalEnergy, StoreError> {
        self.check_kpi(Kpi::TotalEnergy)?;
        Ok(compute::total_energy(self.lock_readings().iter(), filter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn reading(source: &str, energy: f64) -> Reading {
        Reading {
            source_id: source.into(),
            sequence: None,
            captured_at: None,
            wind_speed: None,
            power: None,
            energy_export: energy,
            processed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_append_preserves_duplicates_and_order() {
        let store = MemoryStore::new();
        store.append(&reading("T1", 1.0)).await.unwrap();
        store.append(&reading("T1", 1.0)).await.unwrap();
        store.append(&reading("T2", 2.0)).await.unwrap();

        let stored = store.readings();
        assert_eq!(stored.len(), 3);
        assert_eq!(stored[2].source_id, "T2");
    }

    #[tokio::test]
    async fn test_fault_injection() {
        let store = MemoryStore::with_readings([reading("T1", 5.0)]);

        store.set_fail_appends(true);
        assert!(store.append(&reading("T1", 1.0)).await.is_err());
        assert_eq!(store.len(), 1);

        store.set_kpi_failure(Kpi::TotalEnergy, true);
        assert!(store.total_energy(&KpiFilter::all()).await.is_err());
        assert!(store.mean_wind_speed(&KpiFilter::all()).await.is_ok());

        store.set_kpi_failure(Kpi::TotalEnergy, false);
        assert_eq!(store.total_energy(&KpiFilter::all()).await.unwrap().grand_total, 5.0);
    }

    #[tokio::test]
    async fn test_ensure_index_is_repeatable() {
        let store = MemoryStore::new();
        store.ensure_index().await.unwrap();
        store.ensure_index().await.unwrap();
        assert_eq!(store.index_calls(), 2);

        store.set_fail_index(true);
        assert!(store.ensure_index().await.is_err());
    }
}
