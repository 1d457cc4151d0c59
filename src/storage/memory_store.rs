use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::Utc;
use futures_util::future::{self, BoxFuture, FutureExt};

use super::CalculationStore;
use crate::errors::StorageError;
use crate::models::calculation::{NewCalculation, StoredCalculation};

/// Transient ring buffer keeping the most recent `capacity` calculations.
///
/// Ids come from a counter that survives eviction, so they never repeat.
#[derive(Debug)]
pub struct MemoryStore {
    capacity: usize,
    inner: Mutex<Ring>,
}

#[derive(Debug)]
struct Ring {
    next_id: i64,
    records: VecDeque<StoredCalculation>,
}

impl MemoryStore {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            inner: Mutex::new(Ring {
                next_id: 1,
                records: VecDeque::with_capacity(capacity),
            }),
        }
    }

    fn with_ring<T>(&self, f: impl FnOnce(&mut Ring) -> T) -> Result<T, StorageError> {
        let mut ring = self
            .inner
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store lock poisoned".to_string()))?;
        Ok(f(&mut ring))
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.with_ring(|r| r.records.len()).unwrap_or(0)
    }
}

impl CalculationStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn save(&self, record: NewCalculation) -> BoxFuture<'_, Result<i64, StorageError>> {
        let saved = self.with_ring(|ring| {
            let id = ring.next_id;
            ring.next_id += 1;
            if ring.records.len() == self.capacity {
                ring.records.pop_front();
            }
            ring.records.push_back(StoredCalculation {
                id,
                input_data: record.input,
                result_data: record.result,
                language: record.language,
                created_at: Utc::now(),
            });
            id
        });
        future::ready(saved).boxed()
    }

    fn get(&self, id: i64) -> BoxFuture<'_, Result<Option<StoredCalculation>, StorageError>> {
        let found = self.with_ring(|ring| ring.records.iter().find(|c| c.id == id).cloned());
        future::ready(found).boxed()
    }

    fn list_recent(&self, limit: usize) -> BoxFuture<'_, Result<Vec<StoredCalculation>, StorageError>> {
        let recent = self.with_ring(|ring| ring.records.iter().rev().take(limit).cloned().collect());
        future::ready(recent).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::calculation::CalculationInput;
    use crate::services::solar_calculator;

    fn record(panel_count: u32) -> NewCalculation {
        let input = CalculationInput { panel_count, ..Default::default() };
        let result = solar_calculator::compute(&input).unwrap();
        NewCalculation { input, result, language: "en".to_string() }
    }

    #[tokio::test]
    async fn test_save_and_get() {
        let store = MemoryStore::new(10);
        let id = store.save(record(8)).await.unwrap();
        assert_eq!(id, 1);

        let stored = store.get(id).await.unwrap().expect("record should exist");
        assert_eq!(stored.input_data.panel_count, 8);
        assert_eq!(stored.result_data.technical.total_power, 3600.0);
        assert_eq!(stored.language, "en");

        assert!(store.get(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ids_strictly_increase_across_eviction() {
        let store = MemoryStore::new(3);
        let mut ids = Vec::new();
        for n in 1..=5 {
            ids.push(store.save(record(n)).await.unwrap());
        }
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(store.len(), 3);

        // oldest two were evicted
        assert!(store.get(1).await.unwrap().is_none());
        assert!(store.get(2).await.unwrap().is_none());
        assert!(store.get(3).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_list_recent_newest_first() {
        let store = MemoryStore::new(20);
        for n in 1..=12 {
            store.save(record(n)).await.unwrap();
        }
        let recent = store.list_recent(10).await.unwrap();
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].id, 12);
        assert_eq!(recent[9].id, 3);
        assert!(recent.windows(2).all(|w| w[0].id > w[1].id));

        assert!(store.list_recent(0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_zero_capacity_still_keeps_latest() {
        let store = MemoryStore::new(0);
        store.save(record(1)).await.unwrap();
        let id = store.save(record(2)).await.unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.list_recent(5).await.unwrap()[0].id, id);
    }
}
