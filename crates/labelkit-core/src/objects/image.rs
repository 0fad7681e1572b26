//! Embedded raster images.

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Encoding of embedded image bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG format.
    Png,
    /// JPEG format.
    Jpeg,
    /// WebP format.
    WebP,
}

impl ImageFormat {
    /// Get MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
        }
    }

    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }
        None
    }
}

impl From<ImageFormat> for ::image::ImageFormat {
    fn from(format: ImageFormat) -> Self {
        match format {
            ImageFormat::Png => ::image::ImageFormat::Png,
            ImageFormat::Jpeg => ::image::ImageFormat::Jpeg,
            ImageFormat::WebP => ::image::ImageFormat::WebP,
        }
    }
}

/// Build a `data:` URL embedding the given bytes.
pub fn data_url(data: &[u8], format: ImageFormat) -> String {
    format!("data:{};base64,{}", format.mime_type(), STANDARD.encode(data))
}

/// Decoded pixels of an image object.
///
/// Cheap to clone; shared between the object and any renderer holding it for
/// the current frame.
#[derive(Clone)]
pub struct ImageHandle(Arc<::image::RgbaImage>);

impl ImageHandle {
    pub fn new(pixels: ::image::RgbaImage) -> Self {
        Self(Arc::new(pixels))
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    /// Straight (non-premultiplied) RGBA8 pixels, row-major.
    pub fn rgba(&self) -> &[u8] {
        self.0.as_raw()
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageHandle({}x{})", self.width(), self.height())
    }
}

/// Fields specific to an image object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageObject {
    /// Embedded image reference: a `data:` URL or a file path.
    pub src: String,
    /// Decoded pixels, populated lazily and never persisted.
    #[serde(skip)]
    pub(crate) handle: Option<ImageHandle>,
}

impl ImageObject {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            handle: None,
        }
    }

    /// The decoded pixels, if the decode has completed.
    pub fn handle(&self) -> Option<&ImageHandle> {
        self.handle.as_ref()
    }

    /// Drop the decoded pixels.
    pub fn release(&mut self) {
        self.handle = None;
    }
}

impl PartialEq for ImageObject {
    fn eq(&self, other: &Self) -> bool {
        self.src == other.src
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic_bytes() {
        assert_eq!(
            ImageFormat::from_magic_bytes(&[0x89, 0x50, 0x4E, 0x47, 0x0D]),
            Some(ImageFormat::Png)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(b"RIFF\x10\0\0\0WEBPVP8 "),
            Some(ImageFormat::WebP)
        );
        assert_eq!(ImageFormat::from_magic_bytes(b"GIF8"), None);
        assert_eq!(ImageFormat::from_magic_bytes(&[0x89]), None);
    }

    #[test]
    fn test_data_url_prefix() {
        let url = data_url(&[1, 2, 3], ImageFormat::Png);
        assert!(url.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_handle_not_serialized() {
        let mut image = ImageObject::new("data:image/png;base64,AAAA");
        image.handle = Some(ImageHandle::new(::image::RgbaImage::new(2, 2)));
        let json = serde_json::to_string(&image).unwrap();
        assert_eq!(json, r#"{"src":"data:image/png;base64,AAAA"}"#);
    }
}
