use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;
use crate::scoping::{DataClient, EntityKind, Filter, Query};

/// In-memory [`DataClient`] storing JSON records per entity kind.
///
/// Applies filters literally. It knows nothing about tenants: scoping is the
/// decorator's job, which keeps tests of the decorator honest.
#[derive(Debug, Default)]
pub struct InMemoryDataClient {
    inner: RwLock<HashMap<EntityKind, Vec<Value>>>,
    next_id: AtomicU64,
}

impl InMemoryDataClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn select(&self, kind: EntityKind, filter: &Filter, limit: Option<usize>) -> Result<Vec<Value>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        let rows = map.get(&kind).map(Vec::as_slice).unwrap_or_default();
        Ok(rows
            .iter()
            .filter(|r| filter.matches(r))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl DataClient for InMemoryDataClient {
    async fn find_many(&self, kind: EntityKind, query: Query) -> Result<Vec<Value>, StoreError> {
        self.select(kind, &query.filter, query.limit)
    }

    async fn find_first(&self, kind: EntityKind, query: Query) -> Result<Option<Value>, StoreError> {
        Ok(self.select(kind, &query.filter, Some(1))?.into_iter().next())
    }

    async fn count(&self, kind: EntityKind, filter: Filter) -> Result<usize, StoreError> {
        Ok(self.select(kind, &filter, None)?.len())
    }

    async fn create(&self, kind: EntityKind, mut record: Value) -> Result<Value, StoreError> {
        let obj = record.as_object_mut().ok_or(StoreError::InvalidRecord)?;
        if !obj.contains_key("id") {
            let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
            obj.insert("id".to_string(), Value::String(format!("{kind}-{n}")));
        }

        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        map.entry(kind).or_default().push(record.clone());
        Ok(record)
    }

    async fn update(&self, kind: EntityKind, filter: Filter, patch: Value) -> Result<usize, StoreError> {
        let patch = patch.as_object().ok_or(StoreError::InvalidRecord)?;

        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        let mut changed = 0;
        for row in map.entry(kind).or_default().iter_mut() {
            if !filter.matches(row) {
                continue;
            }
            if let Some(obj) = row.as_object_mut() {
                for (k, v) in patch {
                    obj.insert(k.clone(), v.clone());
                }
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn delete(&self, kind: EntityKind, filter: Filter) -> Result<usize, StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        let rows = map.entry(kind).or_default();
        let before = rows.len();
        rows.retain(|r| !filter.matches(r));
        Ok(before - rows.len())
    }
}
