//! Best-effort field lookups over parsed HTML.
//!
//! Every lookup returns `Result<_, Omission>`: a missing element or attribute
//! is not an error, it only means the field is left out of the record. An
//! [`Extraction`] collects the fields that were found together with the
//! reason each missing field was omitted.

use std::fmt;
use std::sync::OnceLock;

use ji_core::{Error, FieldValue, Record, Result};
use regex::{Regex, RegexBuilder};
use scraper::{ElementRef, Selector};

/// A compiled CSS selector that remembers its source text.
#[derive(Debug, Clone)]
pub struct Query {
    css: String,
    selector: Selector,
}

impl Query {
    pub fn parse(css: &str) -> Result<Self> {
        let selector = Selector::parse(css).map_err(|e| Error::selector(css, format!("{:?}", e)))?;
        Ok(Self {
            css: css.to_string(),
            selector,
        })
    }

    pub fn css(&self) -> &str {
        &self.css
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn first<'a>(&self, scope: ElementRef<'a>) -> Option<ElementRef<'a>> {
        scope.select(&self.selector).next()
    }

    pub fn all<'a>(&self, scope: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        scope.select(&self.selector).collect()
    }

    pub fn matches(&self, element: &ElementRef<'_>) -> bool {
        self.selector.matches(element)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.css)
    }
}

/// Why a field is missing from a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Omission {
    /// Nothing matched the selector.
    NoMatch(String),
    /// The element exists but lacks the attribute.
    MissingAttribute { selector: String, attribute: String },
    /// Fewer matching elements than the field needs.
    TooFewElements { selector: String, needed: usize, found: usize },
    /// The matched element has no text.
    EmptyText(String),
    /// No heading carries the label.
    LabelNotFound(String),
    /// The heading exists but nothing follows it.
    NoValueAfterLabel(String),
}

impl fmt::Display for Omission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Omission::NoMatch(selector) => write!(f, "no element matches '{}'", selector),
            Omission::MissingAttribute { selector, attribute } => {
                write!(f, "'{}' has no '{}' attribute", selector, attribute)
            }
            Omission::TooFewElements { selector, needed, found } => {
                write!(f, "'{}' matched {} elements, need {}", selector, found, needed)
            }
            Omission::EmptyText(selector) => write!(f, "'{}' has no text", selector),
            Omission::LabelNotFound(label) => write!(f, "no heading labelled '{}'", label),
            Omission::NoValueAfterLabel(label) => write!(f, "nothing follows heading '{}'", label),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Omitted {
    pub field: &'static str,
    pub reason: Omission,
}

/// Fields found on one element or page, plus the ones that were not.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub record: Record,
    pub omitted: Vec<Omitted>,
}

impl Extraction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the field if the lookup succeeded, otherwise note why not.
    pub fn field<V: Into<FieldValue>>(&mut self, field: &'static str, lookup: std::result::Result<V, Omission>) {
        match lookup {
            Ok(value) => self.record.insert(field, value),
            Err(reason) => self.omitted.push(Omitted { field, reason }),
        }
    }

    pub fn is_omitted(&self, field: &str) -> bool {
        self.omitted.iter().any(|o| o.field == field)
    }

    pub fn omission(&self, field: &str) -> Option<&Omission> {
        self.omitted.iter().find(|o| o.field == field).map(|o| &o.reason)
    }
}

/// Collapse every whitespace run to a single space and trim both ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalized text content of an element and its descendants.
pub fn element_text(element: ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

/// Split a block such as `"1. First 2. Second"` into its numbered points.
pub fn split_numbered_points(text: &str) -> Vec<String> {
    static NUMBERED: OnceLock<Regex> = OnceLock::new();
    let pattern = NUMBERED.get_or_init(|| Regex::new(r"\d+\.").expect("valid numbered-point pattern"));
    pattern
        .split(text)
        .map(normalize_whitespace)
        .filter(|point| !point.is_empty())
        .collect()
}

/// Resolve an href against the site's base URL. Hrefs with a scheme are
/// returned unchanged.
pub fn resolve_url(base: &str, href: &str) -> String {
    let href = href.trim();
    if has_scheme(href) {
        return href.to_string();
    }
    let base = base.trim_end_matches('/');
    if href.starts_with('/') {
        format!("{}{}", base, href)
    } else {
        format!("{}/{}", base, href)
    }
}

pub(crate) fn has_scheme(href: &str) -> bool {
    match href.find("://") {
        Some(idx) => {
            let scheme = &href[..idx];
            !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

pub fn text(scope: ElementRef<'_>, query: &Query) -> std::result::Result<String, Omission> {
    query
        .first(scope)
        .map(element_text)
        .ok_or_else(|| Omission::NoMatch(query.css().to_string()))
}

/// Like [`text`] but an element with only whitespace counts as missing.
pub fn non_empty_text(scope: ElementRef<'_>, query: &Query) -> std::result::Result<String, Omission> {
    let value = text(scope, query)?;
    if value.is_empty() {
        return Err(Omission::EmptyText(query.css().to_string()));
    }
    Ok(value)
}

pub fn attr(scope: ElementRef<'_>, query: &Query, attribute: &str) -> std::result::Result<String, Omission> {
    let element = query
        .first(scope)
        .ok_or_else(|| Omission::NoMatch(query.css().to_string()))?;
    element
        .value()
        .attr(attribute)
        .map(|value| value.trim().to_string())
        .ok_or_else(|| Omission::MissingAttribute {
            selector: query.css().to_string(),
            attribute: attribute.to_string(),
        })
}

/// An attribute holding a link, resolved against `base`.
pub fn link(scope: ElementRef<'_>, query: &Query, attribute: &str, base: &str) -> std::result::Result<String, Omission> {
    attr(scope, query, attribute).map(|href| resolve_url(base, &href))
}

/// Non-empty texts of every matching element, in document order.
pub fn texts(scope: ElementRef<'_>, query: &Query) -> Vec<String> {
    query
        .all(scope)
        .into_iter()
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Matches the text of a heading.
#[derive(Debug, Clone)]
pub enum LabelMatcher {
    Exact(String),
    /// Case-insensitive search anywhere in the heading text.
    Pattern(Regex),
}

impl LabelMatcher {
    pub fn exact(label: &str) -> Self {
        LabelMatcher::Exact(label.to_string())
    }

    pub fn pattern(pattern: &str) -> Result<Self> {
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map(LabelMatcher::Pattern)
            .map_err(|e| Error::Config(format!("Invalid label pattern '{}': {}", pattern, e)))
    }

    pub fn matches(&self, heading_text: &str) -> bool {
        match self {
            LabelMatcher::Exact(label) => heading_text == label,
            LabelMatcher::Pattern(re) => re.is_match(heading_text),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            LabelMatcher::Exact(label) => label,
            LabelMatcher::Pattern(re) => re.as_str(),
        }
    }
}

/// Where the value sits relative to its heading.
#[derive(Debug, Clone)]
pub enum Traversal {
    /// The element immediately following the heading among its siblings.
    NextSibling,
    /// The first element after the heading, in document order, matching the query.
    NextInDocument(Query),
}

/// Find the first heading whose text satisfies `matcher`, then the element
/// holding its value according to `traversal`.
pub fn labelled<'a>(
    scope: ElementRef<'a>,
    heading: &Query,
    matcher: &LabelMatcher,
    traversal: &Traversal,
) -> std::result::Result<ElementRef<'a>, Omission> {
    let label = heading
        .all(scope)
        .into_iter()
        .find(|h| matcher.matches(&element_text(*h)))
        .ok_or_else(|| Omission::LabelNotFound(matcher.label().to_string()))?;

    let value = match traversal {
        Traversal::NextSibling => label.next_siblings().find_map(ElementRef::wrap),
        Traversal::NextInDocument(query) => scope
            .descendants()
            .skip_while(|node| node.id() != label.id())
            .skip(1)
            .filter_map(ElementRef::wrap)
            .find(|el| query.matches(el)),
    };
    value.ok_or_else(|| Omission::NoValueAfterLabel(matcher.label().to_string()))
}

/// A labelled field whose value is the following element's text.
#[derive(Debug, Clone)]
pub struct LabelledField {
    pub field: &'static str,
    pub matcher: LabelMatcher,
}

impl LabelledField {
    pub fn exact(field: &'static str, label: &str) -> Self {
        Self {
            field,
            matcher: LabelMatcher::exact(label),
        }
    }

    pub fn pattern(field: &'static str, pattern: &str) -> Result<Self> {
        Ok(Self {
            field,
            matcher: LabelMatcher::pattern(pattern)?,
        })
    }

    pub fn lookup(
        &self,
        scope: ElementRef<'_>,
        heading: &Query,
        traversal: &Traversal,
    ) -> std::result::Result<String, Omission> {
        labelled(scope, heading, &self.matcher, traversal).map(element_text)
    }
}
