use ji_core::{RecordKind, Result};
use scraper::{ElementRef, Html};

use crate::extract::{Extraction, Query};

pub mod institute;

/// Field layout of one record kind: where summary items sit on a listing
/// page and how summary and detail fields are read.
pub trait RecordExtractor: Send + Sync {
    fn kind(&self) -> RecordKind;

    /// Matches every summary item on a listing page
    fn item_query(&self) -> &Query;

    /// Summary field holding the detail page URL
    fn link_field(&self) -> &'static str;

    /// Whether a summary item without a link is dropped instead of kept
    fn link_required(&self) -> bool {
        false
    }

    /// Reads the summary fields of one listing item
    fn extract_summary(&self, item: ElementRef<'_>, base_url: &str) -> Extraction;

    /// Reads the detail fields of a detail page
    fn extract_detail(&self, document: &Html, base_url: &str) -> Extraction;

    /// Returns a list of CLI shorthand names for this kind
    fn cli_names(&self) -> Vec<&str> {
        vec![]
    }
}

pub type BoxedExtractor = Box<dyn RecordExtractor>;

pub fn extractor_for(kind: RecordKind) -> Result<BoxedExtractor> {
    Ok(match kind {
        RecordKind::News => Box::new(institute::NewsExtractor::new()?),
        RecordKind::Courses => Box::new(institute::CourseExtractor::new()?),
        RecordKind::Trainers => Box::new(institute::TrainerExtractor::new()?),
    })
}

pub fn get_extractors() -> Result<Vec<BoxedExtractor>> {
    RecordKind::ALL.into_iter().map(extractor_for).collect()
}

/// Finds the kind whose CLI names include `name`.
pub fn kind_for_cli_name(name: &str) -> Result<RecordKind> {
    let name = name.trim().to_lowercase();
    for extractor in get_extractors()? {
        if extractor.cli_names().contains(&name.as_str()) {
            return Ok(extractor.kind());
        }
    }
    Err(ji_core::Error::Scraping(format!("No scraper found for '{}'", name)))
}
