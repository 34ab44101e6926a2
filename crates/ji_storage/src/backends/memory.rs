use async_trait::async_trait;
use ji_core::{Record, RecordStore, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;
use crate::StorageBackend;

#[derive(Default)]
pub struct MemoryStore {
    collections: HashMap<String, Vec<(Uuid, Record)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delete_all(&mut self, collection: &str) -> u64 {
        self.collections
            .remove(collection)
            .map(|records| records.len() as u64)
            .unwrap_or(0)
    }

    pub fn insert_many(&mut self, collection: &str, records: &[Record]) -> usize {
        let entries = self.collections.entry(collection.to_string()).or_default();
        entries.extend(records.iter().map(|record| (Uuid::new_v4(), record.clone())));
        records.len()
    }

    pub fn count(&self, collection: &str) -> usize {
        self.collections.get(collection).map(Vec::len).unwrap_or(0)
    }

    pub fn find_all(&self, collection: &str) -> Vec<Record> {
        self.collections
            .get(collection)
            .map(|entries| entries.iter().map(|(_, record)| record.clone()).collect())
            .unwrap_or_default()
    }
}

pub struct MemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl MemoryStorage {
    pub async fn new() -> Result<Self> {
        Ok(Self {
            store: Arc::new(RwLock::new(MemoryStore::new())),
        })
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    async fn new() -> Result<Self> where Self: Sized {
        Self::new().await
    }
}

#[async_trait]
impl RecordStore for MemoryStorage {
    async fn delete_all(&self, collection: &str) -> Result<u64> {
        let mut store = self.store.write().await;
        Ok(store.delete_all(collection))
    }

    async fn insert_many(&self, collection: &str, records: &[Record]) -> Result<usize> {
        let mut store = self.store.write().await;
        Ok(store.insert_many(collection, records))
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let store = self.store.read().await;
        Ok(store.count(collection))
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<Record>> {
        let store = self.store.read().await;
        Ok(store.find_all(collection))
    }
}
