//! Process-local cache implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::DashMap;

use super::{Cache, CacheValue, SubKey};
use crate::domain::PipelineId;
use crate::error::{Error, Result};

/// In-memory cache backed by a concurrent map.
///
/// Suitable for a single-node deployment. Entries live for the lifetime of
/// the process unless removed; retention policy belongs to the embedding
/// service, which calls [`InMemoryCache::remove`] when a result expires.
#[derive(Default)]
pub struct InMemoryCache {
    entries: DashMap<PipelineId, HashMap<SubKey, CacheValue>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every slot stored for a pipeline.
    pub fn remove(&self, id: PipelineId) {
        self.entries.remove(&id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, id: PipelineId, sub_key: SubKey) -> Result<CacheValue> {
        self.entries
            .get(&id)
            .and_then(|slots| slots.get(&sub_key).cloned())
            .ok_or(Error::CacheMiss { id, sub_key })
    }

    async fn set(&self, id: PipelineId, sub_key: SubKey, value: CacheValue) -> Result<()> {
        self.entries.entry(id).or_default().insert(sub_key, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Status;

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let cache = InMemoryCache::new();
        let id = PipelineId::new();

        cache
            .set(id, SubKey::RunOutput, CacheValue::from("hello"))
            .await
            .unwrap();

        let value = cache.get(id, SubKey::RunOutput).await.unwrap();
        assert_eq!(value, CacheValue::Text("hello".to_string()));
    }

    #[tokio::test]
    async fn absence_is_an_error() {
        let cache = InMemoryCache::new();
        let id = PipelineId::new();

        let result = cache.get(id, SubKey::Status).await;
        assert!(matches!(result, Err(Error::CacheMiss { .. })));
    }

    #[tokio::test]
    async fn set_overwrites_the_slot() {
        let cache = InMemoryCache::new();
        let id = PipelineId::new();

        cache
            .set(id, SubKey::Status, Status::Validating.into())
            .await
            .unwrap();
        cache
            .set(id, SubKey::Status, Status::Preparing.into())
            .await
            .unwrap();

        let value = cache.get(id, SubKey::Status).await.unwrap();
        assert_eq!(value.as_status(), Some(Status::Preparing));
    }

    #[tokio::test]
    async fn remove_drops_every_slot() {
        let cache = InMemoryCache::new();
        let id = PipelineId::new();

        cache
            .set(id, SubKey::Status, Status::Finished.into())
            .await
            .unwrap();
        cache
            .set(id, SubKey::RunOutput, CacheValue::from("out"))
            .await
            .unwrap();

        cache.remove(id);
        assert!(cache.get(id, SubKey::Status).await.is_err());
        assert!(cache.is_empty());
    }
}
