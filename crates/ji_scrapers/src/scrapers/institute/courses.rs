use ji_core::RecordKind;
use scraper::{ElementRef, Html};

use super::SUB_HEADING;
use crate::extract::{self, Extraction, LabelledField, Omission, Query, Traversal};
use crate::scrapers::RecordExtractor;

/// Position of the schedule line among the course information paragraphs.
const TIME_PARAGRAPH: usize = 3;

/// Course cards on `/en/courses` and the course pages they link to.
#[derive(Debug, Clone)]
pub struct CourseExtractor {
    item: Query,
    link: Query,
    title: Query,
    date: Query,
    description: Query,
    image: Query,
    subtitle: Query,
    trainer: Query,
    info_paragraph: Query,
    price: Query,
    heading: Query,
    sections: Vec<LabelledField>,
}

impl CourseExtractor {
    pub fn new() -> ji_core::Result<Self> {
        Ok(Self {
            item: Query::parse("#course-filter-results .course-card")?,
            link: Query::parse("a")?,
            title: Query::parse(".course-title")?,
            date: Query::parse(".course-date")?,
            description: Query::parse(".card-desc")?,
            image: Query::parse(".course-img-top")?,
            subtitle: Query::parse("h2.course-subtitle")?,
            trainer: Query::parse(".course-details-s1 p + a")?,
            info_paragraph: Query::parse(".course-details-s1 p")?,
            price: Query::parse(".price .discount-data-bk1")?,
            heading: Query::parse(SUB_HEADING)?,
            sections: vec![
                LabelledField::exact("Prerequisites", "Prerequisites"),
                LabelledField::exact("Description", "Course Description"),
                LabelledField::exact("Objectives", "Course Objective"),
                LabelledField::exact("Outline", "Course Outline"),
                LabelledField::exact("Benefits", "Course Benefits"),
            ],
        })
    }

    fn time(&self, root: ElementRef<'_>) -> Result<String, Omission> {
        let paragraphs = self.info_paragraph.all(root);
        let paragraph = paragraphs.get(TIME_PARAGRAPH).ok_or_else(|| Omission::TooFewElements {
            selector: self.info_paragraph.to_string(),
            needed: TIME_PARAGRAPH + 1,
            found: paragraphs.len(),
        })?;
        let text = extract::element_text(*paragraph).replace("Category:", "");
        Ok(extract::normalize_whitespace(&text))
    }
}

impl RecordExtractor for CourseExtractor {
    fn kind(&self) -> RecordKind {
        RecordKind::Courses
    }

    fn item_query(&self) -> &Query {
        &self.item
    }

    fn link_field(&self) -> &'static str {
        "Course URL"
    }

    fn link_required(&self) -> bool {
        true
    }

    fn extract_summary(&self, item: ElementRef<'_>, base_url: &str) -> Extraction {
        let mut extraction = Extraction::new();
        extraction.field("Title", extract::text(item, &self.title));
        extraction.field("Date and Time", extract::text(item, &self.date));
        extraction.field("Description", extract::text(item, &self.description));
        extraction.field("Image URL", extract::link(item, &self.image, "src", base_url));
        extraction.field("Course URL", extract::link(item, &self.link, "href", base_url));
        extraction
    }

    fn extract_detail(&self, document: &Html, _base_url: &str) -> Extraction {
        let root = document.root_element();
        let mut extraction = Extraction::new();
        extraction.field("Title", extract::text(root, &self.subtitle));
        extraction.field("Trainer", extract::text(root, &self.trainer));
        extraction.field("Time", self.time(root));
        extraction.field("Price", extract::text(root, &self.price));
        for section in &self.sections {
            extraction.field(section.field, section.lookup(root, &self.heading, &Traversal::NextSibling));
        }
        extraction
    }

    fn cli_names(&self) -> Vec<&str> {
        vec!["courses", "course"]
    }
}
