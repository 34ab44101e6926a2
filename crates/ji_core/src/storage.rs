use async_trait::async_trait;
use crate::record::Record;
use crate::Result;

/// Document store holding one named collection per record kind.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Remove every record from a collection
    async fn delete_all(&self, collection: &str) -> Result<u64>;

    /// Append records to a collection, keeping their order
    async fn insert_many(&self, collection: &str, records: &[Record]) -> Result<usize>;

    /// Number of records in a collection
    async fn count(&self, collection: &str) -> Result<usize>;

    /// All records of a collection in insertion order, without any
    /// storage-internal identifier
    async fn find_all(&self, collection: &str) -> Result<Vec<Record>>;
}
