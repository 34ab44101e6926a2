use ji_core::RecordKind;
use scraper::{ElementRef, Html};

use crate::extract::{self, Extraction, Omission, Query};
use crate::scrapers::RecordExtractor;

/// News cards on `/en/news` and the article pages they link to.
#[derive(Debug, Clone)]
pub struct NewsExtractor {
    item: Query,
    title_link: Query,
    image: Query,
    date: Query,
    page_header: Query,
    header_span: Query,
    subtitle: Query,
    content_row: Query,
    content_column: Query,
    content_field: Query,
    paragraph: Query,
    publication_date: Query,
    author: Query,
    tags: Query,
    tag_link: Query,
}

impl NewsExtractor {
    pub fn new() -> ji_core::Result<Self> {
        Ok(Self {
            item: Query::parse("div.event-card.top-story, div.event-card.more-news")?,
            title_link: Query::parse("div.event-body h5.event-title a")?,
            image: Query::parse("img.img-responsive")?,
            date: Query::parse("span.date-display-single")?,
            page_header: Query::parse("h1.page-header")?,
            header_span: Query::parse("span")?,
            subtitle: Query::parse("h2.course-subtitle span")?,
            content_row: Query::parse("article.news div.content.row")?,
            content_column: Query::parse("div.col-xl-6.col-lg-8.col-md-12")?,
            content_field: Query::parse("div.field--item")?,
            paragraph: Query::parse("p.text-align-justify")?,
            publication_date: Query::parse("div.field--name-field-date, div.date-display-single")?,
            author: Query::parse("div.field--name-field-author")?,
            tags: Query::parse("div.field--name-field-tags")?,
            tag_link: Query::parse("a")?,
        })
    }

    /// The first page header whose span has text.
    fn main_title(&self, root: ElementRef<'_>) -> Result<String, Omission> {
        self.page_header
            .all(root)
            .into_iter()
            .filter_map(|header| self.header_span.first(header))
            .map(extract::element_text)
            .find(|title| !title.is_empty())
            .ok_or_else(|| Omission::NoMatch(format!("{} {}", self.page_header, self.header_span)))
    }

    /// Body paragraphs live in the second content column of the article.
    fn body_paragraphs(&self, root: ElementRef<'_>) -> Result<Vec<String>, Omission> {
        let row = self
            .content_row
            .first(root)
            .ok_or_else(|| Omission::NoMatch(self.content_row.to_string()))?;
        let columns = self.content_column.all(row);
        let column = columns.get(1).copied().ok_or_else(|| Omission::TooFewElements {
            selector: self.content_column.to_string(),
            needed: 2,
            found: columns.len(),
        })?;
        let field = self
            .content_field
            .first(column)
            .ok_or_else(|| Omission::NoMatch(self.content_field.to_string()))?;
        let paragraphs = extract::texts(field, &self.paragraph);
        if paragraphs.is_empty() {
            return Err(Omission::NoMatch(self.paragraph.to_string()));
        }
        Ok(paragraphs)
    }
}

impl RecordExtractor for NewsExtractor {
    fn kind(&self) -> RecordKind {
        RecordKind::News
    }

    fn item_query(&self) -> &Query {
        &self.item
    }

    fn link_field(&self) -> &'static str {
        "article_url"
    }

    fn extract_summary(&self, item: ElementRef<'_>, base_url: &str) -> Extraction {
        let mut extraction = Extraction::new();
        extraction.field("title", extract::text(item, &self.title_link));
        extraction.field("article_url", extract::link(item, &self.title_link, "href", base_url));
        extraction.field("image_url", extract::link(item, &self.image, "src", base_url));
        extraction.field("date", extract::text(item, &self.date));
        extraction
    }

    fn extract_detail(&self, document: &Html, base_url: &str) -> Extraction {
        let root = document.root_element();
        let mut extraction = Extraction::new();
        extraction.field("main_title", self.main_title(root));
        extraction.field("subtitle", extract::non_empty_text(root, &self.subtitle));
        extraction.field("main_image", extract::link(root, &self.image, "src", base_url));

        match self.body_paragraphs(root) {
            Ok(paragraphs) => {
                extraction.field("location_date", Ok::<_, Omission>(paragraphs[0].clone()));
                extraction.field("full_description", Ok::<_, Omission>(paragraphs.join("\n\n")));
            }
            Err(reason) => {
                extraction.field::<String>("location_date", Err(reason.clone()));
                extraction.field::<String>("full_description", Err(reason));
            }
        }

        extraction.field("publication_date", extract::text(root, &self.publication_date));
        extraction.field("author", extract::text(root, &self.author));
        extraction.field(
            "categories",
            self.tags
                .first(root)
                .map(|tags| extract::texts(tags, &self.tag_link))
                .ok_or_else(|| Omission::NoMatch(self.tags.to_string())),
        );
        extraction
    }

    fn cli_names(&self) -> Vec<&str> {
        vec!["news", "articles"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ji_core::FieldValue;

    const BASE: &str = "https://institute.example.net";

    const LISTING: &str = r#"
        <div class="view-content">
          <div class="event-card top-story">
            <img class="img-responsive" src="/sites/top.jpg">
            <div class="event-body">
              <h5 class="event-title"><a href="/en/news/top-story"> Top
                 story </a></h5>
              <span class="date-display-single">12 March 2024</span>
            </div>
          </div>
          <div class="event-card more-news">
            <img class="img-responsive" src="https://cdn.example.com/more.jpg">
            <h5 class="event-title"><a href="/en/news/outside-body">No body wrapper</a></h5>
          </div>
          <div class="event-card">Not a news card</div>
        </div>"#;

    const ARTICLE: &str = r#"
        <html><body>
          <h1 class="page-header"><span>  </span></h1>
          <h1 class="page-header"><span>Training  workshop</span></h1>
          <h2 class="course-subtitle"><span>A week of reporting</span></h2>
          <img class="img-responsive" src="/sites/main.jpg">
          <article class="news">
            <div class="content row">
              <div class="col-xl-6 col-lg-8 col-md-12">sidebar</div>
              <div class="col-xl-6 col-lg-8 col-md-12">
                <div class="field--item">
                  <p class="text-align-justify">Doha, 12 March</p>
                  <p class="text-align-justify">The institute   held a workshop.</p>
                  <p class="text-align-justify"> </p>
                </div>
              </div>
            </div>
          </article>
          <div class="field--name-field-author"> Editorial team </div>
          <div class="field--name-field-tags"><a>Training</a><a> Media </a></div>
        </body></html>"#;

    #[test]
    fn test_extract_summary() {
        let extractor = NewsExtractor::new().unwrap();
        let document = Html::parse_document(LISTING);
        let items: Vec<_> = document.select(extractor.item_query().selector()).collect();
        assert_eq!(items.len(), 2);

        let top = extractor.extract_summary(items[0], BASE);
        assert_eq!(top.record.get_text("title"), Some("Top story"));
        assert_eq!(top.record.get_text("article_url"), Some("https://institute.example.net/en/news/top-story"));
        assert_eq!(top.record.get_text("image_url"), Some("https://institute.example.net/sites/top.jpg"));
        assert_eq!(top.record.get_text("date"), Some("12 March 2024"));
        assert!(top.omitted.is_empty());

        let more = extractor.extract_summary(items[1], BASE);
        assert!(!more.record.contains_key("article_url"));
        assert!(!more.record.contains_key("title"));
        assert_eq!(more.record.get_text("image_url"), Some("https://cdn.example.com/more.jpg"));
        assert!(more.is_omitted("date"));
    }

    #[test]
    fn test_extract_detail() {
        let extractor = NewsExtractor::new().unwrap();
        let document = Html::parse_document(ARTICLE);
        let detail = extractor.extract_detail(&document, BASE);
        let record = &detail.record;

        assert_eq!(record.get_text("main_title"), Some("Training workshop"));
        assert_eq!(record.get_text("subtitle"), Some("A week of reporting"));
        assert_eq!(record.get_text("main_image"), Some("https://institute.example.net/sites/main.jpg"));
        assert_eq!(record.get_text("location_date"), Some("Doha, 12 March"));
        assert_eq!(
            record.get_text("full_description"),
            Some("Doha, 12 March\n\nThe institute held a workshop.")
        );
        assert_eq!(record.get_text("author"), Some("Editorial team"));
        assert_eq!(
            record.get("categories"),
            Some(&FieldValue::List(vec!["Training".to_string(), "Media".to_string()]))
        );
        assert!(!record.contains_key("publication_date"));
        assert_eq!(detail.omitted.len(), 1);
    }

    #[test]
    fn test_detail_without_article_body() {
        let extractor = NewsExtractor::new().unwrap();
        let document = Html::parse_document(
            r#"<h2 class="course-subtitle"><span>Only a subtitle</span></h2>
               <article class="news"><div class="content row">
                 <div class="col-xl-6 col-lg-8 col-md-12">one column</div>
               </div></article>"#,
        );
        let detail = extractor.extract_detail(&document, BASE);
        assert_eq!(detail.record.get_text("subtitle"), Some("Only a subtitle"));
        assert_eq!(detail.record.len(), 1);
        assert!(matches!(
            detail.omission("full_description"),
            Some(Omission::TooFewElements { needed: 2, found: 1, .. })
        ));
        assert!(detail.is_omitted("location_date"));
        assert!(detail.is_omitted("categories"));
    }
}
