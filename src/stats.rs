//! Statistics collected while ingesting and reconstructing a document.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Counters filled by ingestion and layout reconstruction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Total number of pages read
    pub page_count: u32,

    /// Number of spans after ingestion
    pub span_count: u32,

    /// Spans created by splitting off a character that did not follow on
    pub split_span_count: u32,

    /// Spans created by autosplit
    pub autosplit_span_count: u32,

    /// Spaces removed because the next character overlapped them
    pub removed_space_count: u32,

    /// Number of lines after reconstruction
    pub line_count: u32,

    /// Number of paragraphs after reconstruction
    pub paragraph_count: u32,

    /// Number of images kept
    pub image_count: u32,

    /// Number of pixmap images skipped
    pub pixmap_skipped_count: u32,
}

impl ExtractionStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment page count.
    pub fn add_page(&mut self) {
        self.page_count += 1;
    }

    /// Increment image count.
    pub fn add_image(&mut self) {
        self.image_count += 1;
    }

    /// Increment skipped pixmap count.
    pub fn add_skipped_pixmap(&mut self) {
        self.pixmap_skipped_count += 1;
    }
}

impl fmt::Display for ExtractionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "pages:            {}", self.page_count)?;
        writeln!(
            f,
            "spans:            {} ({} split, {} autosplit)",
            self.span_count, self.split_span_count, self.autosplit_span_count
        )?;
        writeln!(f, "spaces removed:   {}", self.removed_space_count)?;
        writeln!(f, "lines:            {}", self.line_count)?;
        writeln!(f, "paragraphs:       {}", self.paragraph_count)?;
        write!(
            f,
            "images:           {} ({} pixmaps skipped)",
            self.image_count, self.pixmap_skipped_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_lists_counters() {
        let mut stats = ExtractionStats::new();
        stats.add_page();
        stats.add_skipped_pixmap();
        let text = stats.to_string();
        assert!(text.contains("pages:            1"));
        assert!(text.contains("(1 pixmaps skipped)"));
    }
}
