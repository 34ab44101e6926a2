use std::fmt;
use std::sync::Arc;

use ji_core::{PaginationStyle, Record, RecordKind, RecordStore, Result, SiteConfig};
use tracing::{error, info};

use crate::fetch::{HttpFetcher, PageFetcher};
use crate::pipeline::{Pipeline, PipelineRun};

/// Result of refreshing every collection in turn. Counts are listed for the
/// pipelines that completed before `error` stopped the refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub counts: Vec<(RecordKind, usize)>,
    pub error: Option<String>,
}

impl RefreshOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn count(&self, kind: RecordKind) -> Option<usize> {
        self.counts.iter().find(|(k, _)| *k == kind).map(|(_, n)| *n)
    }
}

/// How a pipeline walks its listing, for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineInfo {
    pub kind: RecordKind,
    pub listing_url: String,
    pub pagination: String,
    pub max_pages: Option<usize>,
}

impl fmt::Display for PipelineInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<9} {} ({}", self.kind, self.listing_url, self.pagination)?;
        match self.max_pages {
            Some(max) => write!(f, ", at most {} pages)", max),
            None => write!(f, ", no page limit)"),
        }
    }
}

pub struct ScraperManager {
    storage: Arc<dyn RecordStore>,
    fetcher: Arc<dyn PageFetcher>,
    config: SiteConfig,
}

impl ScraperManager {
    pub fn new(storage: Arc<dyn RecordStore>, config: SiteConfig) -> Result<Self> {
        let fetcher = Arc::new(HttpFetcher::from_config(&config)?);
        Ok(Self::with_fetcher(storage, fetcher, config))
    }

    pub fn with_fetcher(storage: Arc<dyn RecordStore>, fetcher: Arc<dyn PageFetcher>, config: SiteConfig) -> Self {
        Self {
            storage,
            fetcher,
            config,
        }
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Scrape one kind without touching the store.
    pub async fn scrape(&self, kind: RecordKind) -> Result<PipelineRun> {
        Pipeline::new(kind, &self.config, self.fetcher.as_ref())?.run().await
    }

    /// Scrape one kind and replace its collection with the result.
    pub async fn run_kind(&self, kind: RecordKind) -> Result<PipelineRun> {
        let run = self.scrape(kind).await?;
        if let Err(e) = run.accumulator.sync(self.storage.as_ref()).await {
            error!("Failed to store {}: {}", kind, e);
            return Err(e);
        }
        Ok(run)
    }

    /// Run news, courses and trainers in order, syncing each collection as
    /// soon as its run finishes. The first failure stops the refresh.
    pub async fn refresh_all(&self) -> RefreshOutcome {
        let mut outcome = RefreshOutcome::default();
        for kind in RecordKind::ALL {
            match self.run_kind(kind).await {
                Ok(run) => outcome.counts.push((kind, run.accumulator.len())),
                Err(e) => {
                    error!("Refresh stopped at {}: {}", kind, e);
                    outcome.error = Some(e.to_string());
                    return outcome;
                }
            }
        }
        info!("Refresh complete: {:?}", outcome.counts);
        outcome
    }

    pub async fn counts(&self) -> Result<Vec<(RecordKind, usize)>> {
        let mut counts = Vec::with_capacity(RecordKind::ALL.len());
        for kind in RecordKind::ALL {
            counts.push((kind, self.storage.count(kind.collection()).await?));
        }
        Ok(counts)
    }

    pub async fn records(&self, kind: RecordKind) -> Result<Vec<Record>> {
        self.storage.find_all(kind.collection()).await
    }

    pub fn list_pipelines(&self) -> Vec<PipelineInfo> {
        RecordKind::ALL
            .into_iter()
            .map(|kind| {
                let pipeline = self.config.pipeline(kind);
                let pagination = match &pipeline.pagination {
                    PaginationStyle::NextLink { next_selector } => format!("next link '{}'", next_selector),
                    PaginationStyle::Numeric {
                        start,
                        pager_selector: Some(pager),
                    } => format!("?page={}.. bounded by '{}'", start, pager),
                    PaginationStyle::Numeric { start, pager_selector: None } => format!("?page={}..", start),
                };
                PipelineInfo {
                    kind,
                    listing_url: self.config.listing_url(kind),
                    pagination,
                    max_pages: pipeline.max_pages,
                }
            })
            .collect()
    }
}
