//! Conversion API Module
//!
//! One file's trip from input path to AVIF output:
//!
//! ```text
//! Pending → Validating ─┬─ Skipped(InputMissing | UnsupportedFormat | OutputExists)
//!                       └─ Decoding → Encoding → Writing ─┬─ Succeeded
//!                                                         └─ Failed
//! ```
//!
//! Validation ([`plan_task`]) runs before a file is admitted to the pool, so
//! skipped files never take a worker slot. [`execute_task`] does the rest.
//!
//! Output policy: the AVIF is fully encoded in memory, written to a temporary
//! file next to the target and then renamed over it. A decode or encode
//! failure leaves an existing output untouched; a failed write or rename
//! removes the temporary file and never leaves a partial output. Two inputs
//! that map to the same output both succeed, and the output is exactly one
//! of the two encodes (the last rename wins).

use crate::error::{ConvertError, Result};
use crate::formats::CodecRegistry;
use crate::quality::Quality;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// `<dir>/<stem>.<extension>`. Never fails; `foo/bar.PNG` becomes `foo/bar.avif`.
pub fn output_path_for(input: &Path, extension: &str) -> PathBuf {
    input.with_extension(extension)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl FileTask {
    pub fn new(input: impl Into<PathBuf>, extension: &str) -> Self {
        let input = input.into();
        let output = output_path_for(&input, extension);
        Self { input, output }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    InputMissing,
    UnsupportedFormat,
    OutputExists,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SkipReason::InputMissing => "not found",
            SkipReason::UnsupportedFormat => "unsupported format",
            SkipReason::OutputExists => "already exists, skipped",
        })
    }
}

/// Result of validating one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskPlan {
    Skip {
        task: FileTask,
        reason: SkipReason,
    },
    /// Ready for dispatch. `overwrites` is set when `force` lets it replace an
    /// existing output.
    Dispatch { task: FileTask, overwrites: bool },
}

pub fn plan_task(input: &Path, registry: &CodecRegistry, force: bool) -> TaskPlan {
    let task = FileTask::new(input, registry.encoder().extension());

    if !input.exists() {
        return TaskPlan::Skip {
            task,
            reason: SkipReason::InputMissing,
        };
    }
    if !registry.supports(input) {
        return TaskPlan::Skip {
            task,
            reason: SkipReason::UnsupportedFormat,
        };
    }

    let output_exists = task.output.exists();
    if output_exists && !force {
        return TaskPlan::Skip {
            task,
            reason: SkipReason::OutputExists,
        };
    }

    TaskPlan::Dispatch {
        task,
        overwrites: output_exists,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOutput {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub input_size: u64,
    pub output_size: u64,
    pub width: u32,
    pub height: u32,
}

impl ConversionOutput {
    /// Percentage saved relative to the input; negative when the output grew.
    pub fn size_reduction(&self) -> f64 {
        if self.input_size == 0 {
            return 0.0;
        }
        (1.0 - self.output_size as f64 / self.input_size as f64) * 100.0
    }
}

/// Terminal state of one file.
#[derive(Debug)]
pub enum ConversionOutcome {
    Skipped(SkipReason),
    Failed(ConvertError),
    Succeeded(ConversionOutput),
}

/// Decode, encode and write one validated task.
pub fn execute_task(
    task: &FileTask,
    registry: &CodecRegistry,
    quality: Quality,
) -> Result<ConversionOutput> {
    let bytes = fs::read(&task.input).map_err(|e| ConvertError::io("read", &task.input, e))?;
    debug!(input = %task.input.display(), bytes = bytes.len(), "Decoding");

    let image = registry.decode(&task.input, &bytes)?;
    let encoded = registry.encoder().encode(&image, quality)?;

    write_output(&task.output, &encoded)?;
    debug!(output = %task.output.display(), bytes = encoded.len(), "Wrote output");

    Ok(ConversionOutput {
        input_path: task.input.clone(),
        output_path: task.output.clone(),
        input_size: bytes.len() as u64,
        output_size: encoded.len() as u64,
        width: image.width(),
        height: image.height(),
    })
}

/// Validate and, if eligible, convert a single file.
pub fn convert_file(
    input: &Path,
    registry: &CodecRegistry,
    quality: Quality,
    force: bool,
) -> ConversionOutcome {
    match plan_task(input, registry, force) {
        TaskPlan::Skip { reason, .. } => ConversionOutcome::Skipped(reason),
        TaskPlan::Dispatch { task, .. } => match execute_task(&task, registry, quality) {
            Ok(output) => ConversionOutcome::Succeeded(output),
            Err(e) => ConversionOutcome::Failed(e),
        },
    }
}

fn write_output(path: &Path, data: &[u8]) -> Result<()> {
    let staged = stage_output(path, data)?;
    staged
        .persist(path)
        .map_err(|e| ConvertError::io("replace", path, e.error))?;
    Ok(())
}

/// Temporary file in the output's directory holding `data`. Dropping it
/// without persisting deletes it.
fn stage_output(path: &Path, data: &[u8]) -> Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut builder = tempfile::Builder::new();
    builder.prefix(".img-avif-").suffix(".part");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o644));
    }
    let mut staged = builder
        .tempfile_in(dir)
        .map_err(|e| ConvertError::io("create", path, e))?;

    staged
        .write_all(data)
        .and_then(|()| staged.flush())
        .map_err(|e| ConvertError::io("write", path, e))?;
    Ok(staged)
}
