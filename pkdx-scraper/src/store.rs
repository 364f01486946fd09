//! In-memory entity store
//!
//! The only shared mutable state of a pipeline run. Every operation takes the
//! single lock for its own duration only; read-modify-write sequences are
//! composed by callers (get, mutate a local copy, put) and concurrent puts on
//! the same id are last-writer-wins.

use crate::models::Entity;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::Mutex;

/// id → entity map guarded by one exclusive lock
#[derive(Debug, Default)]
pub struct EntityStore {
    entities: Mutex<HashMap<u32, Entity>>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the entity stored at `id`
    pub async fn get(&self, id: u32) -> Option<Entity> {
        self.entities.lock().await.get(&id).cloned()
    }

    /// Insert or replace the entity at `id`
    pub async fn put(&self, id: u32, entity: Entity) {
        self.entities.lock().await.insert(id, entity);
    }

    /// Presence check used by the lineage filter
    pub async fn contains(&self, id: u32) -> bool {
        self.entities.lock().await.contains_key(&id)
    }

    pub async fn len(&self) -> usize {
        self.entities.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entities.lock().await.is_empty()
    }

    /// Ordered copy of every entity, for the snapshot writer
    pub async fn snapshot(&self) -> BTreeMap<u32, Entity> {
        self.entities
            .lock()
            .await
            .iter()
            .map(|(id, entity)| (*id, entity.clone()))
            .collect()
    }
}
