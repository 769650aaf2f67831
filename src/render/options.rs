//! Content emission options.

/// Options for emitting WordprocessingML content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentOptions {
    /// Insert an empty paragraph before each paragraph, and another one
    /// where the CTM changes
    pub spacing: bool,

    /// Put rotated paragraphs into rotated text boxes
    pub rotation: bool,

    /// Emit inline drawings for each page's images
    pub images: bool,
}

impl ContentOptions {
    /// Create new content options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable paragraph spacing.
    pub fn with_spacing(mut self, spacing: bool) -> Self {
        self.spacing = spacing;
        self
    }

    /// Enable or disable rotated text boxes.
    pub fn with_rotation(mut self, rotation: bool) -> Self {
        self.rotation = rotation;
        self
    }

    /// Enable or disable image drawings.
    pub fn with_images(mut self, images: bool) -> Self {
        self.images = images;
        self
    }
}

impl Default for ContentOptions {
    fn default() -> Self {
        Self {
            spacing: true,
            rotation: true,
            images: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_enable_everything() {
        let options = ContentOptions::default();
        assert!(options.spacing);
        assert!(options.rotation);
        assert!(options.images);
    }

    #[test]
    fn test_builder() {
        let options = ContentOptions::new()
            .with_spacing(false)
            .with_rotation(false);
        assert!(!options.spacing);
        assert!(!options.rotation);
        assert!(options.images);
    }
}
