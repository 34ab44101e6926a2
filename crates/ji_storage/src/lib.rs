use std::sync::Arc;

use async_trait::async_trait;
use ji_core::{Error, RecordStore, Result};
use tracing::info;

pub mod backends;

pub use backends::*;

#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn new() -> Result<Self> where Self: Sized;
}

/// Names accepted by [`create_storage`].
pub fn available_backends() -> Vec<&'static str> {
    let mut names = vec!["memory"];
    if cfg!(feature = "sqlite") {
        names.push("sqlite");
    }
    names
}

/// Build a store from its CLI name. `backend_url` is backend specific: the
/// SQLite database path, ignored for the in-memory store.
pub async fn create_storage(name: &str, backend_url: Option<&str>) -> Result<Arc<dyn RecordStore>> {
    let storage: Arc<dyn RecordStore> = match name {
        "memory" => Arc::new(MemoryStorage::new().await?),
        #[cfg(feature = "sqlite")]
        "sqlite" => match backend_url {
            Some(path) => Arc::new(SQLiteStorage::new_with_path(&std::path::PathBuf::from(path)).await?),
            None => Arc::new(<SQLiteStorage as StorageBackend>::new().await?),
        },
        other => {
            return Err(Error::Config(format!(
                "Unknown storage backend '{}' (available: {})",
                other,
                available_backends().join(", ")
            )))
        }
    };
    if name == "memory" && backend_url.is_some() {
        info!("Ignoring backend URL for in-memory storage");
    }
    Ok(storage)
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_storage, StorageBackend};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_memory_storage() {
        let storage = create_storage("memory", None).await.unwrap();
        assert_eq!(storage.count("news").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_memory_backend_constructor() {
        let storage = <MemoryStorage as StorageBackend>::new().await.unwrap();
        assert!(storage.find_all("courses").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_unknown_storage() {
        let result = create_storage("mongodb", None).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
