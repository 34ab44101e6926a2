//! One scrape of one record kind: walk the listing, enrich each summary
//! from its detail page and collect the records in discovery order.

use std::time::Duration;

use ji_core::{PipelineConfig, RecordKind, Result, SiteConfig};

use crate::accumulator::Accumulator;
use crate::enrich::{DetailEnricher, Enrichment};
use crate::extract::Omitted;
use crate::fetch::PageFetcher;
use crate::logging::Logger;
use crate::scrapers::{extractor_for, BoxedExtractor};
use crate::walker::ListingWalker;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Listing fetches, including the one that ended the walk
    pub pages: usize,
    /// Summary items found on listing pages
    pub items: usize,
    pub enriched: usize,
    pub enrich_failures: usize,
    /// Items dropped because they had no detail link
    pub skipped: usize,
    /// Fields left out of summaries and detail pages
    pub omitted: usize,
}

#[derive(Debug)]
pub struct PipelineRun {
    pub accumulator: Accumulator,
    pub stats: PipelineStats,
}

pub struct Pipeline<'a> {
    fetcher: &'a dyn PageFetcher,
    extractor: BoxedExtractor,
    config: PipelineConfig,
    base_url: String,
}

impl<'a> Pipeline<'a> {
    pub fn new(kind: RecordKind, site: &SiteConfig, fetcher: &'a dyn PageFetcher) -> Result<Self> {
        Ok(Self::with_extractor(
            extractor_for(kind)?,
            site.pipeline(kind).clone(),
            site.base(),
            fetcher,
        ))
    }

    pub fn with_extractor(
        extractor: BoxedExtractor,
        config: PipelineConfig,
        base_url: &str,
        fetcher: &'a dyn PageFetcher,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            config,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn kind(&self) -> RecordKind {
        self.extractor.kind()
    }

    pub async fn run(&self) -> Result<PipelineRun> {
        let kind = self.kind();
        let logger = Logger::new().with_prefix(kind.to_string());
        let extractor = self.extractor.as_ref();
        let mut walker = ListingWalker::new(
            self.fetcher,
            extractor,
            &self.base_url,
            &self.config.listing_path,
            &self.config.pagination,
        )?
        .with_max_pages(self.config.max_pages)
        .with_page_delay(self.config.page_delay());
        let enricher = DetailEnricher::new(self.fetcher, extractor, &self.base_url);
        let item_delay = self.config.item_delay();

        let mut accumulator = Accumulator::new(kind);
        let mut stats = PipelineStats::default();
        logger.info(&format!("Scraping {}{}", self.base_url, self.config.listing_path));

        while let Some(page) = walker.next_page().await {
            let page_logger = logger.clone().with_prefix(format!("page {}", page.index + 1));
            page_logger.info(&format!("{} items", page.items.len()));

            for summary in page.items {
                stats.items += 1;
                log_omissions(&page_logger, &summary.omitted);
                stats.omitted += summary.omitted.len();
                let mut record = summary.record;

                match record.get_text(extractor.link_field()).map(str::to_string) {
                    Some(url) => match enricher.enrich(&url).await {
                        Enrichment::Enriched(detail) => {
                            log_omissions(&page_logger, &detail.omitted);
                            stats.omitted += detail.omitted.len();
                            stats.enriched += 1;
                            record.merge(detail.record);
                        }
                        Enrichment::Failed(_) => stats.enrich_failures += 1,
                    },
                    None if extractor.link_required() => {
                        page_logger.debug(&format!("Skipping item without {}", extractor.link_field()));
                        stats.skipped += 1;
                        continue;
                    }
                    None => {}
                }

                accumulator.push(record);
                pause(item_delay).await;
            }
        }

        stats.pages = walker.pages_fetched();
        logger.info(&format!(
            "{} records from {} pages ({} enriched, {} detail failures, {} skipped)",
            accumulator.len(),
            stats.pages,
            stats.enriched,
            stats.enrich_failures,
            stats.skipped
        ));
        Ok(PipelineRun { accumulator, stats })
    }
}

fn log_omissions(logger: &Logger, omitted: &[Omitted]) {
    for o in omitted {
        logger.debug(&format!("{} omitted: {}", o.field, o.reason));
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walker::tests::{listing, ItemExtractor, MockFetcher};
    use ji_core::{PaginationStyle, RecordStore};
    use ji_storage::MemoryStorage;

    const BASE: &str = "http://site.test";

    fn config() -> PipelineConfig {
        PipelineConfig {
            listing_path: "/list".to_string(),
            pagination: PaginationStyle::Numeric {
                start: 0,
                pager_selector: None,
            },
            max_pages: None,
            item_delay_ms: 0,
            page_delay_ms: 0,
        }
    }

    fn site() -> MockFetcher {
        MockFetcher::default()
            .with_page("http://site.test/list?page=0", &listing(&["a", "b"], None))
            .with_page("http://site.test/list?page=1", &listing(&["c"], None))
            .with_page("http://site.test/list?page=2", &listing(&[], None))
            .with_page(
                "http://site.test/items/a",
                r#"<p class="body">Body a</p><span class="tag">x</span>"#,
            )
            .with_page("http://site.test/items/b", r#"<p class="body">Body b</p>"#)
    }

    #[tokio::test]
    async fn test_run_enriches_and_keeps_order() {
        let fetcher = site();
        let pipeline = Pipeline::with_extractor(Box::new(ItemExtractor::new()), config(), BASE, &fetcher);
        let run = pipeline.run().await.unwrap();

        let records = run.accumulator.records();
        let titles: Vec<_> = records.iter().map(|r| r.get_text("title").unwrap()).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);

        assert_eq!(records[0].get_text("body"), Some("Body a"));
        assert_eq!(records[0].get_text("tag"), Some("x"));
        // the detail page of b lacks the tag, the rest of the record is kept
        assert_eq!(records[1].get_text("body"), Some("Body b"));
        assert!(!records[1].contains_key("tag"));
        assert_eq!(records[1].get_text("url"), Some("http://site.test/items/b"));
        // no detail page for c
        assert_eq!(records[2].keys().collect::<Vec<_>>(), vec!["title", "url"]);

        assert_eq!(
            run.stats,
            PipelineStats {
                pages: 3,
                items: 3,
                enriched: 2,
                enrich_failures: 1,
                skipped: 0,
                omitted: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_item_without_link_is_not_enriched() {
        let fetcher = MockFetcher::default()
            .with_page(
                "http://site.test/list?page=0",
                r#"<ul><li class="item"><a>No link</a></li></ul>"#,
            )
            .with_page("http://site.test/list?page=1", &listing(&[], None));
        let pipeline = Pipeline::with_extractor(Box::new(ItemExtractor::new()), config(), BASE, &fetcher);
        let run = pipeline.run().await.unwrap();

        assert_eq!(run.accumulator.len(), 1);
        assert_eq!(run.accumulator.records()[0].get_text("title"), Some("No link"));
        assert!(!run.accumulator.records()[0].contains_key("url"));
        assert_eq!(fetcher.requests().len(), 2);
        assert_eq!(run.stats.enriched + run.stats.enrich_failures, 0);
    }

    #[tokio::test]
    async fn test_required_link_drops_item() {
        let fetcher = MockFetcher::default()
            .with_page(
                "http://site.test/list?page=0",
                r#"<ul><li class="item"><a>No link</a></li><li class="item"><a href="/items/a">a</a></li></ul>"#,
            )
            .with_page("http://site.test/list?page=1", &listing(&[], None));
        let pipeline =
            Pipeline::with_extractor(Box::new(ItemExtractor::requiring_link()), config(), BASE, &fetcher);
        let run = pipeline.run().await.unwrap();

        assert_eq!(run.accumulator.len(), 1);
        assert_eq!(run.accumulator.records()[0].get_text("title"), Some("a"));
        assert_eq!(run.stats.skipped, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_item_delay_follows_kept_items_only() {
        let fetcher = site().with_page(
            "http://site.test/list?page=0",
            r#"<ul><li class="item"><a>No link</a></li><li class="item"><a href="/items/a">a</a></li><li class="item"><a href="/items/b">b</a></li></ul>"#,
        );
        let mut config = config();
        config.item_delay_ms = 1_000;
        config.page_delay_ms = 10_000;
        let pipeline =
            Pipeline::with_extractor(Box::new(ItemExtractor::requiring_link()), config, BASE, &fetcher);

        let started = tokio::time::Instant::now();
        let run = pipeline.run().await.unwrap();
        let elapsed = started.elapsed();

        assert_eq!(run.accumulator.len(), 3);
        assert_eq!(run.stats.skipped, 1);
        // two page waits and one item wait per kept record
        assert!(elapsed >= Duration::from_secs(23), "{:?}", elapsed);
        assert!(elapsed < Duration::from_secs(24), "{:?}", elapsed);
    }

    #[tokio::test]
    async fn test_invalid_pagination_selector_fails_before_fetching() {
        let fetcher = site();
        let mut config = config();
        config.pagination = PaginationStyle::NextLink {
            next_selector: "a[".to_string(),
        };
        let pipeline = Pipeline::with_extractor(Box::new(ItemExtractor::new()), config, BASE, &fetcher);
        assert!(pipeline.run().await.is_err());
        assert!(fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_runs_store_identical_collections() {
        let fetcher = site();
        let store = MemoryStorage::new().await.unwrap();
        let pipeline = Pipeline::with_extractor(Box::new(ItemExtractor::new()), config(), BASE, &fetcher);

        pipeline.run().await.unwrap().accumulator.sync(&store).await.unwrap();
        let first = store.find_all("news").await.unwrap();
        pipeline.run().await.unwrap().accumulator.sync(&store).await.unwrap();
        let second = store.find_all("news").await.unwrap();

        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
    }
}
