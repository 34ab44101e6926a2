//! Site and pipeline configuration.
//!
//! Everything a pipeline needs is passed in through [`SiteConfig`]; there is
//! no process-wide state. Defaults describe the institute website.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::record::RecordKind;
use crate::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://institute.aljazeera.net";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

const DEFAULT_ITEM_DELAY_MS: u64 = 1000;
const DEFAULT_PAGE_DELAY_MS: u64 = 2000;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// How the listing walker finds the next listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum PaginationStyle {
    /// Follow the href of the pager's "next" control until it disappears.
    NextLink { next_selector: String },
    /// Request `?page=N` from `start` upwards until a page has no items.
    /// With `pager_selector`, the highest page number shown by the pager on
    /// the first page bounds the walk.
    Numeric {
        #[serde(default)]
        start: u32,
        #[serde(default)]
        pager_selector: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub listing_path: String,
    pub pagination: PaginationStyle,
    #[serde(default)]
    pub max_pages: Option<usize>,
    #[serde(default = "default_item_delay_ms")]
    pub item_delay_ms: u64,
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
}

fn default_item_delay_ms() -> u64 {
    DEFAULT_ITEM_DELAY_MS
}

fn default_page_delay_ms() -> u64 {
    DEFAULT_PAGE_DELAY_MS
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl PipelineConfig {
    pub fn item_delay(&self) -> Duration {
        Duration::from_millis(self.item_delay_ms)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn news() -> Self {
        Self {
            listing_path: "/en/news".to_string(),
            pagination: PaginationStyle::NextLink {
                next_selector: r#"ul.js-pager__items a[rel="next"]"#.to_string(),
            },
            max_pages: Some(5),
            item_delay_ms: DEFAULT_ITEM_DELAY_MS,
            page_delay_ms: DEFAULT_PAGE_DELAY_MS,
        }
    }

    pub fn courses() -> Self {
        Self {
            listing_path: "/en/courses".to_string(),
            pagination: PaginationStyle::Numeric {
                start: 0,
                pager_selector: None,
            },
            max_pages: None,
            item_delay_ms: DEFAULT_ITEM_DELAY_MS,
            page_delay_ms: DEFAULT_PAGE_DELAY_MS,
        }
    }

    pub fn trainers() -> Self {
        Self {
            listing_path: "/en/trainers".to_string(),
            pagination: PaginationStyle::Numeric {
                start: 1,
                pager_selector: Some("ul.pagination li a".to_string()),
            },
            max_pages: Some(3),
            item_delay_ms: DEFAULT_ITEM_DELAY_MS,
            page_delay_ms: DEFAULT_PAGE_DELAY_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    pub news: PipelineConfig,
    pub courses: PipelineConfig,
    pub trainers: PipelineConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: default_user_agent(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            news: PipelineConfig::news(),
            courses: PipelineConfig::courses(),
            trainers: PipelineConfig::trainers(),
        }
    }
}

impl SiteConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file is missing or invalid.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            warn!("Failed to load config from {:?}: {}; using defaults", path, e);
            Self::default()
        })
    }

    pub fn pipeline(&self, kind: RecordKind) -> &PipelineConfig {
        match kind {
            RecordKind::News => &self.news,
            RecordKind::Courses => &self.courses,
            RecordKind::Trainers => &self.trainers,
        }
    }

    pub fn pipeline_mut(&mut self, kind: RecordKind) -> &mut PipelineConfig {
        match kind {
            RecordKind::News => &mut self.news,
            RecordKind::Courses => &mut self.courses,
            RecordKind::Trainers => &mut self.trainers,
        }
    }

    /// Base URL without a trailing slash.
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn listing_url(&self, kind: RecordKind) -> String {
        format!("{}{}", self.base(), self.pipeline(kind).listing_path)
    }

    pub fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.base_url)
            .map_err(|e| Error::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        if parsed.cannot_be_a_base() {
            return Err(Error::InvalidUrl(self.base_url.clone()));
        }
        for kind in RecordKind::ALL {
            let pipeline = self.pipeline(kind);
            if !pipeline.listing_path.starts_with('/') {
                return Err(Error::Config(format!(
                    "{} listing path must start with '/': {}",
                    kind, pipeline.listing_path
                )));
            }
            if pipeline.max_pages == Some(0) {
                return Err(Error::Config(format!("{} max_pages must be at least 1", kind)));
            }
        }
        Ok(())
    }
}
