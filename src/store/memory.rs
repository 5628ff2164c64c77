//! In-memory record store used by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{Fields, RecordFilter, RecordStore, StoreError};

/// A recorded store call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create { collection: String, fields: Fields },
    Update { collection: String, id: String, fields: Fields },
}

#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, Vec<Fields>>>,
    calls: Mutex<Vec<Call>>,
    next_id: AtomicUsize,
    failing: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail until reset.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Delay every write by `delay` before it takes effect.
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn creates(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Create { .. }))
            .count()
    }

    pub fn record(&self, collection: &str, id: &str) -> Option<Fields> {
        self.records
            .lock()
            .unwrap()
            .get(collection)?
            .iter()
            .find(|r| r.get("id").and_then(Value::as_str) == Some(id))
            .cloned()
    }

    async fn before_write(&self) -> Result<(), StoreError> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn create(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        self.before_write().await?;
        self.calls.lock().unwrap().push(Call::Create {
            collection: collection.to_string(),
            fields: fields.clone(),
        });

        let id = format!("rec-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let mut record = fields;
        record.insert("id".to_string(), Value::String(id.clone()));
        self.records
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .push(record);
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        self.before_write().await?;
        self.calls.lock().unwrap().push(Call::Update {
            collection: collection.to_string(),
            id: id.to_string(),
            fields: fields.clone(),
        });

        let mut records = self.records.lock().unwrap();
        let record = records
            .get_mut(collection)
            .and_then(|rows| {
                rows.iter_mut()
                    .find(|r| r.get("id").and_then(Value::as_str) == Some(id))
            })
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        record.extend(fields);
        Ok(())
    }

    async fn select(
        &self,
        collection: &str,
        filter: &RecordFilter,
    ) -> Result<Vec<Fields>, StoreError> {
        let records = self.records.lock().unwrap();
        Ok(records
            .get(collection)
            .map(|rows| {
                rows.iter()
                    .filter(|r| {
                        filter
                            .id
                            .as_deref()
                            .map_or(true, |id| r.get("id").and_then(Value::as_str) == Some(id))
                            && filter.status.as_deref().map_or(true, |s| {
                                r.get("status").and_then(Value::as_str) == Some(s)
                            })
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
