//! AVIF encoders
//!
//! [`RavifEncoder`] encodes in-process through the `image` crate (rav1e via
//! ravif). [`AvifencEncoder`] shells out to libavif's `avifenc`, which must
//! be on `PATH`.

use crate::error::{ConfigError, EncodeError};
use crate::formats::RasterImage;
use crate::quality::{Quality, QualityScale, Speed};
use image::codecs::avif::AvifEncoder;
use image::{ExtendedColorType, ImageEncoder as _, ImageFormat};
use shared_utils::logging::execute_external_command;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const AVIF_EXTENSION: &str = "avif";

pub trait ImageEncoder: Send + Sync {
    fn name(&self) -> &'static str;

    fn quality_scale(&self) -> QualityScale;

    /// Extension of the files this encoder produces.
    fn extension(&self) -> &'static str {
        AVIF_EXTENSION
    }

    fn encode(&self, image: &RasterImage, quality: Quality) -> Result<Vec<u8>, EncodeError>;
}

#[derive(Debug, Clone, Copy)]
pub struct RavifEncoder {
    speed: Speed,
}

impl RavifEncoder {
    pub fn new(speed: Speed) -> Self {
        Self { speed }
    }
}

impl ImageEncoder for RavifEncoder {
    fn name(&self) -> &'static str {
        "ravif"
    }

    fn quality_scale(&self) -> QualityScale {
        QualityScale::RAVIF
    }

    fn encode(&self, image: &RasterImage, quality: Quality) -> Result<Vec<u8>, EncodeError> {
        let level = self.quality_scale().map(quality) as u8;
        let rgba = image.to_rgba8();
        debug!(
            width = rgba.width(),
            height = rgba.height(),
            quality = level,
            speed = self.speed.get(),
            "Encoding AVIF"
        );

        let mut out = Vec::new();
        AvifEncoder::new_with_speed_quality(&mut out, self.speed.get(), level).write_image(
            rgba.as_raw(),
            rgba.width(),
            rgba.height(),
            ExtendedColorType::Rgba8,
        )?;
        Ok(out)
    }
}

#[derive(Debug, Clone)]
pub struct AvifencEncoder {
    binary: PathBuf,
    speed: Speed,
}

impl AvifencEncoder {
    pub const TOOL: &'static str = "avifenc";

    /// Locate `avifenc` on `PATH`.
    pub fn detect(speed: Speed) -> Result<Self, ConfigError> {
        let binary =
            which::which(Self::TOOL).map_err(|_| ConfigError::EncoderUnavailable(Self::TOOL))?;
        debug!(binary = %binary.display(), "Found avifenc");
        Ok(Self::with_binary(binary, speed))
    }

    pub fn with_binary(binary: PathBuf, speed: Speed) -> Self {
        Self { binary, speed }
    }

    /// avifenc speed runs 0 (slowest) to 10, same direction as ours.
    fn build_args(&self, quantizer: i32, input: &Path, output: &Path) -> Vec<String> {
        vec![
            "--min".to_string(),
            quantizer.to_string(),
            "--max".to_string(),
            quantizer.to_string(),
            "--speed".to_string(),
            self.speed.get().to_string(),
            "--jobs".to_string(),
            "1".to_string(),
            input.display().to_string(),
            output.display().to_string(),
        ]
    }
}

impl ImageEncoder for AvifencEncoder {
    fn name(&self) -> &'static str {
        Self::TOOL
    }

    fn quality_scale(&self) -> QualityScale {
        QualityScale::AV1_QUANTIZER
    }

    fn encode(&self, image: &RasterImage, quality: Quality) -> Result<Vec<u8>, EncodeError> {
        let staging = |source| EncodeError::Staging {
            tool: Self::TOOL,
            source,
        };

        let dir = tempfile::Builder::new()
            .prefix("img-avif-")
            .tempdir()
            .map_err(staging)?;
        let input = dir.path().join("input.png");
        let output = dir.path().join("output.avif");
        image.save_with_format(&input, ImageFormat::Png)?;

        let args = self.build_args(self.quality_scale().map(quality), &input, &output);
        let result =
            execute_external_command(&self.binary, &args).map_err(|e| EncodeError::Launch {
                tool: Self::TOOL,
                message: format!("{:#}", e),
            })?;
        if !result.success() {
            return Err(EncodeError::ToolFailed {
                tool: Self::TOOL,
                exit_code: result.exit_code,
                stderr: result.stderr,
            });
        }

        std::fs::read(&output).map_err(staging)
    }
}
