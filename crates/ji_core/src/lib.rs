pub mod config;
pub mod error;
pub mod record;
pub mod storage;

pub use config::{PaginationStyle, PipelineConfig, SiteConfig};
pub use error::{Error, Result};
pub use record::{FieldValue, Record, RecordKind};
pub use storage::RecordStore;
