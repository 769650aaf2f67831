//! Embedded images.

use serde::{Deserialize, Serialize};

/// Placement of an image on its page, in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageGeometry {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// An image carried through to the package as `word/media/{name}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    /// Image type as given by the stream, also used as the file extension
    /// (e.g. "png", "jpeg")
    pub kind: String,

    /// Decoded image bytes
    #[serde(skip)]
    pub data: Vec<u8>,

    /// Relationship id referenced from document.xml
    pub id: String,

    /// File name inside `word/media/`
    pub name: String,

    /// Placement, if the stream provided one
    pub geometry: Option<ImageGeometry>,
}

impl Image {
    /// Create an image numbered `n` within its document.
    pub fn new(kind: impl Into<String>, data: Vec<u8>, n: usize) -> Self {
        let kind = kind.into();
        Self {
            id: format!("rId{}", 100 + n),
            name: format!("image{}.{}", n, kind),
            kind,
            data,
            geometry: None,
        }
    }

    /// Set the placement geometry.
    pub fn with_geometry(mut self, geometry: ImageGeometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    /// MIME type, e.g. `image/png`.
    pub fn content_type(&self) -> String {
        format!("image/{}", self.kind)
    }

    /// Path of the image inside the package.
    pub fn part_name(&self) -> String {
        format!("word/media/{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_naming() {
        let image = Image::new("png", vec![1, 2, 3], 2);
        assert_eq!(image.id, "rId102");
        assert_eq!(image.name, "image2.png");
        assert_eq!(image.content_type(), "image/png");
        assert_eq!(image.part_name(), "word/media/image2.png");
    }
}
