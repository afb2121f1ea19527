//! img-avif: batch conversion of PNG, BMP, JPEG, GIF and WebP images to AVIF.
//!
//! ```no_run
//! use img_avif::{run_batch, ConvertConfig};
//!
//! let config = ConvertConfig::default().with_jobs(4);
//! let registry = config.codec_registry()?;
//! let report = run_batch(&["photos/*.png"], &config, &registry)?;
//! report.print(false)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod conversion_api;
pub mod encoder;
pub mod error;
pub mod formats;
pub mod pipeline;
pub mod quality;

pub use config::{ConvertConfig, EncoderKind};
pub use conversion_api::{
    convert_file, execute_task, output_path_for, plan_task, ConversionOutcome, ConversionOutput,
    FileTask, SkipReason, TaskPlan,
};
pub use encoder::{AvifencEncoder, ImageEncoder, RavifEncoder};
pub use error::{ConfigError, ConvertError, DecodeError, EncodeError};
pub use formats::{CodecRegistry, ImageCrateDecoder, ImageDecoder, RasterImage, SourceFormat};
pub use pipeline::{run_batch, BatchReport, FileReport, FileStatus};
pub use quality::{Quality, QualityScale, Speed};
