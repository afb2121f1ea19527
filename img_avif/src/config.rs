//! Run configuration
//!
//! Built once from the command line and passed by reference to everything
//! that needs it.

use crate::encoder::{AvifencEncoder, ImageEncoder, RavifEncoder};
use crate::error::ConfigError;
use crate::formats::CodecRegistry;
use crate::quality::{Quality, Speed};
use serde::Serialize;
use shared_utils::resolve_concurrency;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EncoderKind {
    /// In-process rav1e encoder
    #[default]
    Ravif,
    /// External libavif `avifenc` tool
    Avifenc,
}

impl EncoderKind {
    pub fn build(self, speed: Speed) -> Result<Box<dyn ImageEncoder>, ConfigError> {
        Ok(match self {
            EncoderKind::Ravif => Box::new(RavifEncoder::new(speed)),
            EncoderKind::Avifenc => Box::new(AvifencEncoder::detect(speed)?),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ConvertConfig {
    pub quality: Quality,
    pub speed: Speed,
    /// Overwrite existing outputs
    pub force: bool,
    /// Concurrency limit, already resolved (>= 1)
    pub jobs: usize,
    pub encoder: EncoderKind,
    /// Print the summary as JSON on stdout; per-file lines go to stderr
    pub json: bool,
    pub show_progress: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            quality: Quality::default(),
            speed: Speed::default(),
            force: false,
            jobs: resolve_concurrency(None),
            encoder: EncoderKind::default(),
            json: false,
            show_progress: false,
        }
    }
}

impl ConvertConfig {
    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_speed(mut self, speed: Speed) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// `0` selects the host's parallelism.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = resolve_concurrency(Some(jobs));
        self
    }

    pub fn with_encoder(mut self, encoder: EncoderKind) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Default decoders plus the configured encoder.
    pub fn codec_registry(&self) -> Result<CodecRegistry, ConfigError> {
        Ok(CodecRegistry::new(self.encoder.build(self.speed)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConvertConfig::default();
        assert_eq!(config.quality.get(), 80);
        assert_eq!(config.speed.get(), 4);
        assert!(!config.force);
        assert!(config.jobs >= 1);
        assert_eq!(config.encoder, EncoderKind::Ravif);
    }

    #[test]
    fn test_jobs_zero_means_default() {
        let config = ConvertConfig::default().with_jobs(0);
        assert_eq!(config.jobs, shared_utils::default_concurrency());
        assert_eq!(ConvertConfig::default().with_jobs(3).jobs, 3);
    }

    #[test]
    fn test_ravif_registry_builds() {
        let registry = ConvertConfig::default().codec_registry().unwrap();
        assert_eq!(registry.encoder().name(), "ravif");
    }

    #[test]
    fn test_encoder_kind_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&EncoderKind::Avifenc).unwrap(),
            "\"avifenc\""
        );
    }
}
