use ji_core::{Record, RecordKind, RecordStore, Result};
use tracing::{debug, info};

/// Records of one pipeline run, in discovery order.
#[derive(Debug, Clone)]
pub struct Accumulator {
    kind: RecordKind,
    records: Vec<Record>,
}

impl Accumulator {
    pub fn new(kind: RecordKind) -> Self {
        Self {
            kind,
            records: Vec::new(),
        }
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Replace the kind's collection with this run's records. The delete and
    /// the insert are separate store calls; a failure in between leaves the
    /// collection empty.
    pub async fn sync(&self, store: &dyn RecordStore) -> Result<usize> {
        let collection = self.kind.collection();
        let removed = store.delete_all(collection).await?;
        debug!("Removed {} records from {}", removed, collection);
        if self.records.is_empty() {
            info!("No records to store in {}", collection);
            return Ok(0);
        }
        let inserted = store.insert_many(collection, &self.records).await?;
        info!("Stored {} records in {}", inserted, collection);
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ji_storage::backends::memory::MemoryStorage;

    fn record(title: &str) -> Record {
        [("title", title)].into_iter().collect()
    }

    #[tokio::test]
    async fn test_sync_replaces_collection() {
        let store = MemoryStorage::new().await.unwrap();
        store.insert_many("news", &[record("stale")]).await.unwrap();

        let mut accumulator = Accumulator::new(RecordKind::News);
        accumulator.push(record("first"));
        accumulator.push(record("second"));
        assert_eq!(accumulator.sync(&store).await.unwrap(), 2);

        let stored = store.find_all("news").await.unwrap();
        assert_eq!(stored, vec![record("first"), record("second")]);
    }

    #[tokio::test]
    async fn test_empty_run_clears_collection() {
        let store = MemoryStorage::new().await.unwrap();
        store.insert_many("trainers", &[record("stale")]).await.unwrap();

        let accumulator = Accumulator::new(RecordKind::Trainers);
        assert_eq!(accumulator.sync(&store).await.unwrap(), 0);
        assert_eq!(store.count("trainers").await.unwrap(), 0);
    }
}
