use scraper::Html;
use tracing::warn;

use crate::extract::Extraction;
use crate::fetch::PageFetcher;
use crate::scrapers::RecordExtractor;

/// Outcome of fetching one detail page.
#[derive(Debug)]
pub enum Enrichment {
    Enriched(Extraction),
    /// The detail page could not be fetched; the summary stands on its own.
    Failed(String),
}

/// Fetches detail pages and reads their fields with the kind's extractor.
pub struct DetailEnricher<'a> {
    fetcher: &'a dyn PageFetcher,
    extractor: &'a dyn RecordExtractor,
    base_url: &'a str,
}

impl<'a> DetailEnricher<'a> {
    pub fn new(fetcher: &'a dyn PageFetcher, extractor: &'a dyn RecordExtractor, base_url: &'a str) -> Self {
        Self {
            fetcher,
            extractor,
            base_url,
        }
    }

    pub async fn enrich(&self, url: &str) -> Enrichment {
        match self.fetcher.fetch(url).await {
            Ok(body) => Enrichment::Enriched(self.extract(&body)),
            Err(e) => {
                warn!("Could not fetch detail page {}: {}", url, e);
                Enrichment::Failed(e.to_string())
            }
        }
    }

    fn extract(&self, body: &str) -> Extraction {
        let document = Html::parse_document(body);
        self.extractor.extract_detail(&document, self.base_url)
    }
}
