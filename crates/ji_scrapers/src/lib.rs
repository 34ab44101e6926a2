pub mod accumulator;
pub mod cli;
pub mod enrich;
pub mod export;
pub mod extract;
pub mod fetch;
pub mod logging;
pub mod manager;
pub mod pipeline;
pub mod scrapers;
pub mod walker;

pub use cli::{handle_command, HumanDuration, ScraperCommands};
pub use fetch::{HttpFetcher, PageFetcher};
pub use logging::{init_logging, Logger};
pub use manager::{PipelineInfo, RefreshOutcome, ScraperManager};
pub use pipeline::{Pipeline, PipelineRun, PipelineStats};

pub mod prelude {
    pub use super::scrapers::RecordExtractor;
    pub use super::{PageFetcher, ScraperManager};
    pub use ji_core::{Error, Record, RecordKind, Result};
}
