use ji_core::RecordKind;
use scraper::{ElementRef, Html};

use super::SUB_HEADING;
use crate::extract::{self, Extraction, LabelledField, Omission, Query, Traversal};
use crate::scrapers::RecordExtractor;

/// Trainer boxes on `/en/trainers` and the profile pages they link to.
#[derive(Debug, Clone)]
pub struct TrainerExtractor {
    item: Query,
    name: Query,
    organization: Query,
    link: Query,
    image: Query,
    details: Query,
    info_paragraph: Query,
    heading: Query,
    biography: LabelledField,
    experience: LabelledField,
    education: LabelledField,
}

impl TrainerExtractor {
    pub fn new() -> ji_core::Result<Self> {
        Ok(Self {
            item: Query::parse("div.trainer-box")?,
            name: Query::parse("h4.header")?,
            organization: Query::parse("h5.header")?,
            link: Query::parse("a")?,
            image: Query::parse("img")?,
            details: Query::parse("div#trainer-details")?,
            info_paragraph: Query::parse("div.trainer-info p")?,
            heading: Query::parse(SUB_HEADING)?,
            biography: LabelledField::pattern("biography", "Bio")?,
            experience: LabelledField::pattern("experience", "Experience")?,
            education: LabelledField::pattern("education", "Education")?,
        })
    }

    /// The last trainer-info paragraph, when there is more than one.
    fn specialization(&self, details: ElementRef<'_>) -> Result<String, Omission> {
        let paragraphs = self.info_paragraph.all(details);
        if paragraphs.len() < 2 {
            return Err(Omission::TooFewElements {
                selector: self.info_paragraph.to_string(),
                needed: 2,
                found: paragraphs.len(),
            });
        }
        Ok(extract::element_text(paragraphs[paragraphs.len() - 1]))
    }
}

impl RecordExtractor for TrainerExtractor {
    fn kind(&self) -> RecordKind {
        RecordKind::Trainers
    }

    fn item_query(&self) -> &Query {
        &self.item
    }

    fn link_field(&self) -> &'static str {
        "profile_url"
    }

    fn extract_summary(&self, item: ElementRef<'_>, base_url: &str) -> Extraction {
        let mut extraction = Extraction::new();
        extraction.field("name", extract::text(item, &self.name));
        extraction.field("organization", extract::text(item, &self.organization));
        extraction.field("profile_url", extract::link(item, &self.link, "href", base_url));
        extraction.field("image_url", extract::link(item, &self.image, "src", base_url));
        extraction
    }

    fn extract_detail(&self, document: &Html, _base_url: &str) -> Extraction {
        let mut extraction = Extraction::new();
        let Some(details) = self.details.first(document.root_element()) else {
            let reason = Omission::NoMatch(self.details.to_string());
            for field in ["specialization", "biography", "experience", "education"] {
                extraction.field::<String>(field, Err(reason.clone()));
            }
            return extraction;
        };

        extraction.field("specialization", self.specialization(details));
        extraction.field("biography", self.biography.lookup(details, &self.heading, &Traversal::NextSibling));
        extraction.field(
            "experience",
            self.experience
                .lookup(details, &self.heading, &Traversal::NextSibling)
                .map(|text| extract::split_numbered_points(&text)),
        );
        extraction.field("education", self.education.lookup(details, &self.heading, &Traversal::NextSibling));
        extraction
    }

    fn cli_names(&self) -> Vec<&str> {
        vec!["trainers", "trainer"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ji_core::FieldValue;

    const BASE: &str = "https://institute.example.net";

    const PROFILE: &str = r#"
        <html><body>
          <div id="trainer-details">
            <div class="trainer-info">
              <p>Al Example Network</p>
              <p>Investigative   reporting</p>
            </div>
            <p class="sub-heading">BIOGRAPHY</p>
            <p>Jane has trained reporters across the region.</p>
            <p class="sub-heading">Experience</p>
            <p>1. Senior editor 2. Field producer 10. Trainer</p>
          </div>
        </body></html>"#;

    #[test]
    fn test_extract_summary() {
        let extractor = TrainerExtractor::new().unwrap();
        let document = Html::parse_document(
            r#"<div class="trainer-box">
                 <a href="/en/trainers/jane-doe"><img src="/sites/jane.jpg"></a>
                 <h4 class="header">Jane Doe</h4>
                 <h5 class="header">Al Example Network</h5>
               </div>
               <div class="trainer-box"><h4 class="header">No profile</h4></div>"#,
        );
        let items: Vec<_> = document.select(extractor.item_query().selector()).collect();
        assert_eq!(items.len(), 2);

        let jane = extractor.extract_summary(items[0], BASE);
        assert_eq!(jane.record.get_text("name"), Some("Jane Doe"));
        assert_eq!(jane.record.get_text("organization"), Some("Al Example Network"));
        assert_eq!(jane.record.get_text("profile_url"), Some("https://institute.example.net/en/trainers/jane-doe"));
        assert_eq!(jane.record.get_text("image_url"), Some("https://institute.example.net/sites/jane.jpg"));

        let bare = extractor.extract_summary(items[1], BASE);
        assert_eq!(bare.record.len(), 1);
        assert!(bare.is_omitted("profile_url"));
        assert!(bare.is_omitted("organization"));
    }

    #[test]
    fn test_extract_detail() {
        let extractor = TrainerExtractor::new().unwrap();
        let document = Html::parse_document(PROFILE);
        let detail = extractor.extract_detail(&document, BASE);
        let record = &detail.record;

        assert_eq!(record.get_text("specialization"), Some("Investigative reporting"));
        assert_eq!(record.get_text("biography"), Some("Jane has trained reporters across the region."));
        assert_eq!(
            record.get("experience"),
            Some(&FieldValue::List(vec![
                "Senior editor".to_string(),
                "Field producer".to_string(),
                "Trainer".to_string(),
            ]))
        );
        assert!(!record.contains_key("education"));
        assert_eq!(
            detail.omission("education"),
            Some(&Omission::LabelNotFound("Education".to_string()))
        );
    }

    #[test]
    fn test_detail_without_details_block() {
        let extractor = TrainerExtractor::new().unwrap();
        let document = Html::parse_document("<html><body><p>Profile unavailable</p></body></html>");
        let detail = extractor.extract_detail(&document, BASE);
        assert!(detail.record.is_empty());
        assert_eq!(detail.omitted.len(), 4);
    }
}
