//! Error types for img-avif
//!
//! `ConfigError` is fatal and raised before any file is touched. Everything
//! else is per-file: it is reported next to the file name and counted, but
//! never stops the rest of the batch.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid quality {0}: must be between 1 and 100")]
    QualityOutOfRange(i64),

    #[error("invalid speed {0}: must be between 1 and 10")]
    SpeedOutOfRange(i64),

    #[error("encoder '{0}' is not available: executable not found in PATH")]
    EncoderUnavailable(&'static str),
}

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("no decoder for '.{0}' files")]
    NoDecoder(String),

    #[error("cannot decode {format} image")]
    Image {
        format: &'static str,
        #[source]
        source: image::ImageError,
    },
}

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("AVIF encoding failed")]
    Image(#[from] image::ImageError),

    #[error("cannot stage image for {tool}")]
    Staging {
        tool: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("cannot run {tool}: {message}")]
    Launch { tool: &'static str, message: String },

    #[error("{tool} exited with {}: {}", exit_code.map_or_else(|| "signal".to_string(), |c| c.to_string()), stderr.trim())]
    ToolFailed {
        tool: &'static str,
        exit_code: Option<i32>,
        stderr: String,
    },
}

/// Terminal failure of a dispatched conversion.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("cannot {action} {}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("conversion panicked: {0}")]
    Panicked(String),
}

impl ConvertError {
    pub fn io(action: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Short classification used in logs and JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode",
            Self::Encode(_) => "encode",
            Self::Io { .. } => "io",
            Self::Panicked(_) => "panic",
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
