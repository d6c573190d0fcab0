//! ReportRenderer — turns an analysis into a paginated PDF on disk.
//!
//! `document` builds the section model, `layout` wraps and paginates it, `pdf`
//! encodes pages, and `writer` persists the result.

pub mod document;
pub mod font_metrics;
pub mod layout;
pub mod pdf;
pub mod writer;

pub use document::render_report;
pub use writer::{ReportArtifact, ReportWriter};
