//! JSON snapshot of a run's records.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use ji_core::{Record, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Export {
    pub scrape_date: DateTime<Utc>,
    pub total_articles: usize,
    pub articles: Vec<Record>,
}

impl Export {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            scrape_date: Utc::now(),
            total_articles: records.len(),
            articles: records,
        }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "export".into());
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write the records as pretty-printed JSON. The file is written next to
/// `path` first and renamed over it, so readers never see a partial file.
pub async fn export_records(path: &Path, records: &[Record]) -> Result<Export> {
    let export = Export::new(records.to_vec());
    let json = serde_json::to_string_pretty(&export)?;

    let tmp = temp_path(path);
    tokio::fs::write(&tmp, json).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }

    info!("Exported {} records to {}", export.total_articles, path.display());
    Ok(export)
}
