//! Record layouts of the institute website.

pub mod courses;
pub mod news;
pub mod trainers;

pub use courses::CourseExtractor;
pub use news::NewsExtractor;
pub use trainers::TrainerExtractor;

/// Headings that label the text blocks of course and trainer pages.
pub(crate) const SUB_HEADING: &str = "p.sub-heading";
