//! Ingestion options and configuration.

/// Options for reading a glyph stream into a document.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Start a new span whenever a character's raw y coordinate changes.
    /// This over-segments the input to stress layout reconstruction.
    pub autosplit: bool,

    /// Whether to decode and keep `<image>` payloads
    pub extract_images: bool,
}

impl IngestOptions {
    /// Create new ingest options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable autosplit.
    pub fn with_autosplit(mut self, autosplit: bool) -> Self {
        self.autosplit = autosplit;
        self
    }

    /// Enable or disable image extraction.
    pub fn with_images(mut self, extract: bool) -> Self {
        self.extract_images = extract;
        self
    }
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            autosplit: false,
            extract_images: true,
        }
    }
}
