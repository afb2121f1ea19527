//! Source formats and the codec registry
//!
//! The registry maps a lower-case file extension to a decoder and holds the
//! single AVIF encoder for the run. The conversion unit only ever asks the
//! registry; supporting a new source format means registering a decoder.

use crate::encoder::ImageEncoder;
use crate::error::DecodeError;
use image::{DynamicImage, ImageFormat};
use shared_utils::get_extension_lowercase;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Decoded pixels, independent of the container they came from.
pub type RasterImage = DynamicImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    Png,
    Bmp,
    Jpeg,
    Gif,
    WebP,
}

impl SourceFormat {
    pub const ALL: [SourceFormat; 5] = [
        SourceFormat::Png,
        SourceFormat::Bmp,
        SourceFormat::Jpeg,
        SourceFormat::Gif,
        SourceFormat::WebP,
    ];

    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            SourceFormat::Png => &["png"],
            SourceFormat::Bmp => &["bmp"],
            SourceFormat::Jpeg => &["jpg", "jpeg"],
            SourceFormat::Gif => &["gif"],
            SourceFormat::WebP => &["webp"],
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            SourceFormat::Png => ImageFormat::Png,
            SourceFormat::Bmp => ImageFormat::Bmp,
            SourceFormat::Jpeg => ImageFormat::Jpeg,
            SourceFormat::Gif => ImageFormat::Gif,
            SourceFormat::WebP => ImageFormat::WebP,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SourceFormat::Png => "PNG",
            SourceFormat::Bmp => "BMP",
            SourceFormat::Jpeg => "JPEG",
            SourceFormat::Gif => "GIF",
            SourceFormat::WebP => "WebP",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub trait ImageDecoder: Send + Sync {
    fn format_name(&self) -> &'static str;

    fn decode(&self, bytes: &[u8]) -> Result<RasterImage, DecodeError>;
}

/// Decoder backed by the `image` crate. Animated GIF/WebP yield their first frame.
#[derive(Debug, Clone, Copy)]
pub struct ImageCrateDecoder {
    format: SourceFormat,
}

impl ImageCrateDecoder {
    pub fn new(format: SourceFormat) -> Self {
        Self { format }
    }
}

impl ImageDecoder for ImageCrateDecoder {
    fn format_name(&self) -> &'static str {
        self.format.name()
    }

    fn decode(&self, bytes: &[u8]) -> Result<RasterImage, DecodeError> {
        image::load_from_memory_with_format(bytes, self.format.image_format()).map_err(|source| {
            DecodeError::Image {
                format: self.format.name(),
                source,
            }
        })
    }
}

pub struct CodecRegistry {
    decoders: HashMap<String, Arc<dyn ImageDecoder>>,
    encoder: Box<dyn ImageEncoder>,
}

impl CodecRegistry {
    /// Registry with no decoders.
    pub fn empty(encoder: Box<dyn ImageEncoder>) -> Self {
        Self {
            decoders: HashMap::new(),
            encoder,
        }
    }

    /// PNG, BMP, JPEG, GIF and WebP via the `image` crate.
    pub fn new(encoder: Box<dyn ImageEncoder>) -> Self {
        let mut registry = Self::empty(encoder);
        for format in SourceFormat::ALL {
            let decoder: Arc<dyn ImageDecoder> = Arc::new(ImageCrateDecoder::new(format));
            for ext in format.extensions() {
                registry.register_decoder(ext, Arc::clone(&decoder));
            }
        }
        registry
    }

    pub fn register_decoder(&mut self, extension: &str, decoder: Arc<dyn ImageDecoder>) {
        self.decoders
            .insert(extension.trim_start_matches('.').to_lowercase(), decoder);
    }

    /// Case-insensitive lookup by the path's extension.
    pub fn decoder_for(&self, path: &Path) -> Option<&dyn ImageDecoder> {
        self.decoders
            .get(&get_extension_lowercase(path))
            .map(|d| d.as_ref())
    }

    pub fn supports(&self, path: &Path) -> bool {
        self.decoder_for(path).is_some()
    }

    pub fn supported_extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.decoders.keys().map(String::as_str).collect();
        exts.sort_unstable();
        exts
    }

    pub fn encoder(&self) -> &dyn ImageEncoder {
        self.encoder.as_ref()
    }

    pub fn decode(&self, path: &Path, bytes: &[u8]) -> Result<RasterImage, DecodeError> {
        match self.decoder_for(path) {
            Some(decoder) => decoder.decode(bytes),
            None => Err(DecodeError::NoDecoder(get_extension_lowercase(path))),
        }
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("decoders", &self.supported_extensions())
            .field("encoder", &self.encoder.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::RavifEncoder;
    use crate::quality::Speed;
    use image::{Rgb, RgbImage};
    use std::io::Cursor;

    fn registry() -> CodecRegistry {
        CodecRegistry::new(Box::new(RavifEncoder::new(Speed::default())))
    }

    fn encode_sample(format: ImageFormat) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 3, Rgb([200, 40, 10])));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_registry_lookup_case_insensitive() {
        let reg = registry();
        assert!(reg.supports(Path::new("a.PNG")));
        assert!(reg.supports(Path::new("dir/b.JpEg")));
        assert!(reg.supports(Path::new("c.webp")));
        assert!(!reg.supports(Path::new("d.tiff")));
        assert!(!reg.supports(Path::new("noext")));
        assert_eq!(
            reg.supported_extensions(),
            vec!["bmp", "gif", "jpeg", "jpg", "png", "webp"]
        );
        assert_eq!(
            reg.decoder_for(Path::new("x.jpg")).map(|d| d.format_name()),
            Some("JPEG")
        );
    }

    #[test]
    fn test_decode_each_writable_format() {
        let reg = registry();
        for (ext, format) in [
            ("png", ImageFormat::Png),
            ("bmp", ImageFormat::Bmp),
            ("jpg", ImageFormat::Jpeg),
            ("gif", ImageFormat::Gif),
        ] {
            let bytes = encode_sample(format);
            let img = reg
                .decode(Path::new(&format!("sample.{}", ext)), &bytes)
                .unwrap();
            assert_eq!((img.width(), img.height()), (4, 3), "format {}", ext);
        }
    }

    #[test]
    fn test_decode_garbage_is_decode_error() {
        let reg = registry();
        let err = reg
            .decode(Path::new("broken.png"), b"definitely not a png")
            .unwrap_err();
        assert!(matches!(err, DecodeError::Image { format: "PNG", .. }));
    }

    #[test]
    fn test_decode_wrong_container_fails() {
        let reg = registry();
        let png = encode_sample(ImageFormat::Png);
        assert!(reg.decode(Path::new("mislabeled.bmp"), &png).is_err());
    }

    #[test]
    fn test_unregistered_extension() {
        let reg = CodecRegistry::empty(Box::new(RavifEncoder::new(Speed::default())));
        assert!(reg.supported_extensions().is_empty());
        let err = reg.decode(Path::new("a.png"), &[]).unwrap_err();
        assert!(matches!(err, DecodeError::NoDecoder(ref e) if e == "png"));
    }

    #[test]
    fn test_register_custom_decoder() {
        let mut reg = CodecRegistry::empty(Box::new(RavifEncoder::new(Speed::default())));
        reg.register_decoder(".PNG", Arc::new(ImageCrateDecoder::new(SourceFormat::Png)));
        assert!(reg.supports(Path::new("x.png")));
    }
}
