//! Paginated listing traversal.
//!
//! A [`ListingWalker`] yields listing pages one at a time until the listing
//! runs out (an empty page, no next page, or a next link back to a page
//! already seen), the page cap is reached, or a fetch fails. It cannot be
//! restarted: once it returns `None` it keeps returning `None`.

use std::collections::HashSet;
use std::time::Duration;

use ji_core::{PaginationStyle, Result};
use scraper::Html;
use tracing::{debug, warn};

use crate::extract::{self, Extraction, Query};
use crate::fetch::PageFetcher;
use crate::scrapers::RecordExtractor;

/// One fetched listing page with its extracted summary items.
#[derive(Debug)]
pub struct ListingPage {
    pub url: String,
    /// Zero-based position of the page in this walk.
    pub index: usize,
    pub items: Vec<Extraction>,
}

#[derive(Debug, Clone)]
enum Pagination {
    NextLink { next: Query },
    Numeric { start: u32, pager: Option<Query> },
}

impl Pagination {
    fn compile(style: &PaginationStyle) -> Result<Self> {
        Ok(match style {
            PaginationStyle::NextLink { next_selector } => Pagination::NextLink {
                next: Query::parse(next_selector)?,
            },
            PaginationStyle::Numeric { start, pager_selector } => Pagination::Numeric {
                start: *start,
                pager: pager_selector.as_deref().map(Query::parse).transpose()?,
            },
        })
    }
}

#[derive(Debug)]
struct PageRequest {
    url: String,
    number: Option<u32>,
}

/// What a listing body tells the walker.
struct ParsedListing {
    items: Vec<Extraction>,
    next_href: Option<String>,
    pager_max: Option<u32>,
}

pub struct ListingWalker<'a> {
    fetcher: &'a dyn PageFetcher,
    extractor: &'a dyn RecordExtractor,
    base_url: String,
    listing_url: String,
    pagination: Pagination,
    max_pages: Option<usize>,
    page_delay: Duration,
    fetched: usize,
    last_page: Option<u32>,
    pending: Option<PageRequest>,
    visited: HashSet<String>,
}

impl<'a> ListingWalker<'a> {
    pub fn new(
        fetcher: &'a dyn PageFetcher,
        extractor: &'a dyn RecordExtractor,
        base_url: &str,
        listing_path: &str,
        style: &PaginationStyle,
    ) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let listing_url = format!("{}{}", base_url, listing_path);
        let pagination = Pagination::compile(style)?;
        let first = match &pagination {
            Pagination::NextLink { .. } => PageRequest {
                url: listing_url.clone(),
                number: None,
            },
            Pagination::Numeric { start, .. } => PageRequest {
                url: numbered_url(&listing_url, *start),
                number: Some(*start),
            },
        };

        Ok(Self {
            fetcher,
            extractor,
            base_url,
            listing_url,
            pagination,
            max_pages: None,
            page_delay: Duration::ZERO,
            fetched: 0,
            last_page: None,
            pending: Some(first),
            visited: HashSet::new(),
        })
    }

    pub fn with_max_pages(mut self, max_pages: Option<usize>) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    /// Number of listing fetches attempted so far, including the one that
    /// ended the walk.
    pub fn pages_fetched(&self) -> usize {
        self.fetched
    }

    pub async fn next_page(&mut self) -> Option<ListingPage> {
        let request = self.pending.take()?;

        if let Some(max) = self.max_pages {
            if self.fetched >= max {
                debug!("Page cap of {} reached at {}", max, self.listing_url);
                return None;
            }
        }
        if self.fetched > 0 && !self.page_delay.is_zero() {
            tokio::time::sleep(self.page_delay).await;
        }

        let index = self.fetched;
        self.fetched += 1;
        self.visited.insert(request.url.clone());
        let body = match self.fetcher.fetch(&request.url).await {
            Ok(body) => body,
            Err(e) => {
                warn!("Stopping walk of {}: {}", self.listing_url, e);
                return None;
            }
        };

        let parsed = self.parse_listing(&body);
        debug!("{} items on {}", parsed.items.len(), request.url);
        if parsed.items.is_empty() {
            debug!("No items on {}, listing exhausted", request.url);
            return None;
        }

        match (&self.pagination, request.number) {
            (Pagination::NextLink { .. }, _) => {
                let next = parsed
                    .next_href
                    .map(|href| resolve_next(&self.base_url, &self.listing_url, &href));
                self.pending = match next {
                    Some(url) if self.visited.contains(&url) => {
                        debug!("Next link of {} leads back to {}", request.url, url);
                        None
                    }
                    Some(url) => Some(PageRequest { url, number: None }),
                    None => None,
                };
            }
            (Pagination::Numeric { start, .. }, Some(number)) => {
                if index == 0 {
                    self.last_page = parsed.pager_max.map(|max| start + max.saturating_sub(1));
                }
                let next = number + 1;
                if self.last_page.map_or(true, |last| next <= last) {
                    self.pending = Some(PageRequest {
                        url: numbered_url(&self.listing_url, next),
                        number: Some(next),
                    });
                }
            }
            (Pagination::Numeric { .. }, None) => {}
        }

        Some(ListingPage {
            url: request.url,
            index,
            items: parsed.items,
        })
    }

    fn parse_listing(&self, body: &str) -> ParsedListing {
        let document = Html::parse_document(body);
        let root = document.root_element();
        let items = self
            .extractor
            .item_query()
            .all(root)
            .into_iter()
            .map(|item| self.extractor.extract_summary(item, &self.base_url))
            .collect();

        let (next_href, pager_max) = match &self.pagination {
            Pagination::NextLink { next } => (
                next.first(root)
                    .and_then(|a| a.value().attr("href"))
                    .map(|href| href.trim().to_string())
                    .filter(|href| !href.is_empty()),
                None,
            ),
            Pagination::Numeric { pager, .. } => (
                None,
                pager.as_ref().and_then(|pager| {
                    pager
                        .all(root)
                        .into_iter()
                        .filter_map(|link| extract::element_text(link).parse::<u32>().ok())
                        .max()
                }),
            ),
        };

        ParsedListing {
            items,
            next_href,
            pager_max,
        }
    }
}

/// `listing_url?page=N`, or `&page=N` when the listing already has a query.
pub fn numbered_url(listing_url: &str, page: u32) -> String {
    let separator = if listing_url.contains('?') { '&' } else { '?' };
    format!("{}{}page={}", listing_url, separator, page)
}

/// Resolve the href of a pager's next control. A bare query string belongs
/// to the listing path, not to the page it was found on.
pub fn resolve_next(base_url: &str, listing_url: &str, href: &str) -> String {
    if href.starts_with('?') {
        let listing = listing_url.split('?').next().unwrap_or(listing_url);
        return format!("{}{}", listing, href);
    }
    extract::resolve_url(base_url, href)
}
