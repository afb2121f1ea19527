//! Batch pipeline
//!
//! raw inputs → [`resolve_inputs`] → [`plan_task`] per file (skips are
//! reported here and never reach the pool) → [`BoundedScheduler`] →
//! [`execute_task`] on workers → [`BatchStats`] → [`BatchReport`].

use crate::config::ConvertConfig;
use crate::conversion_api::{
    execute_task, plan_task, ConversionOutcome, FileTask, SkipReason, TaskPlan,
};
use crate::error::ConvertError;
use crate::formats::CodecRegistry;
use console::style;
use serde::Serialize;
use shared_utils::{
    error_chain, format_bytes, print_summary_report, resolve_inputs, serialize_path_lossy,
    BatchProgressBar, BatchStats, BoundedScheduler, RunSummary, SchedulerError,
};
use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    Succeeded,
    Failed { kind: &'static str },
    Skipped { reason: SkipReason },
}

/// What happened to one resolved input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    #[serde(serialize_with = "serialize_path_lossy")]
    pub input: PathBuf,
    #[serde(serialize_with = "serialize_path_lossy")]
    pub output: PathBuf,
    #[serde(flatten)]
    pub status: FileStatus,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    #[serde(flatten)]
    pub summary: RunSummary,
    /// In completion order; pre-dispatch skips come first.
    pub files: Vec<FileReport>,
    /// Patterns that could not be expanded.
    pub warnings: Vec<String>,
}

impl BatchReport {
    fn nothing_to_do(warnings: Vec<String>) -> Self {
        Self {
            summary: RunSummary::new(Default::default(), Default::default()),
            files: Vec::new(),
            warnings,
        }
    }

    /// No input resolved to a file.
    pub fn is_empty(&self) -> bool {
        self.summary.result.considered == 0
    }

    pub fn file(&self, input: impl Into<PathBuf>) -> Option<&FileReport> {
        let input = input.into();
        self.files.iter().find(|f| f.input == input)
    }

    /// 0 when every considered file was converted; 1 when any file failed
    /// or was skipped, matching the "failed" figure of the summary.
    pub fn exit_code(&self) -> i32 {
        if self.summary.reported_failed > 0 {
            1
        } else {
            0
        }
    }

    pub fn print(&self, json: bool) -> serde_json::Result<()> {
        if json {
            println!("{}", serde_json::to_string_pretty(self)?);
        } else if !self.is_empty() {
            print_summary_report(
                &self.summary.result,
                std::time::Duration::from_secs_f64(self.summary.elapsed_secs),
            );
        }
        Ok(())
    }
}

/// Per-file terminal output and the progress bar.
struct Console {
    bar: Arc<BatchProgressBar>,
    to_stderr: bool,
}

impl Console {
    fn new(config: &ConvertConfig, total: usize) -> Self {
        let bar = if config.show_progress && !config.json {
            BatchProgressBar::new(total as u64, "AVIF")
        } else {
            BatchProgressBar::hidden(total as u64)
        };
        Self {
            bar,
            to_stderr: config.json,
        }
    }

    fn line(&self, msg: &str) {
        if self.to_stderr {
            self.bar.eprintln(msg);
        } else {
            self.bar.println(msg);
        }
    }
}

/// Collects terminal outcomes from all workers.
struct Recorder<'a> {
    stats: BatchStats,
    files: Mutex<Vec<FileReport>>,
    console: &'a Console,
}

impl Recorder<'_> {
    fn record(&self, task: &FileTask, outcome: ConversionOutcome) {
        let (status, message) = match outcome {
            ConversionOutcome::Succeeded(out) => {
                self.stats.success();
                self.console.line(&format!(
                    "✅ {} {} ({} → {}, {:+.1}%)",
                    style("Converted:").green(),
                    out.output_path.display(),
                    format_bytes(out.input_size),
                    format_bytes(out.output_size),
                    -out.size_reduction()
                ));
                (FileStatus::Succeeded, "converted".to_string())
            }
            ConversionOutcome::Failed(err) => {
                let message = error_chain(&err);
                warn!(input = %task.input.display(), kind = err.kind(), error = %message, "Conversion failed");
                self.stats.fail(&task.input, message.clone());
                self.console.line(&format!(
                    "❌ {} {}: {}",
                    style("Conversion failed:").red(),
                    task.input.display(),
                    message
                ));
                (FileStatus::Failed { kind: err.kind() }, message)
            }
            ConversionOutcome::Skipped(reason) => {
                self.stats.skip();
                let shown = match reason {
                    SkipReason::OutputExists => &task.output,
                    SkipReason::InputMissing | SkipReason::UnsupportedFormat => &task.input,
                };
                self.console.line(&format!(
                    "⏭️  {}: {}",
                    shown.display(),
                    style(reason).yellow()
                ));
                (FileStatus::Skipped { reason }, reason.to_string())
            }
        };

        self.console.bar.inc();
        self.files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(FileReport {
                input: task.input.clone(),
                output: task.output.clone(),
                status,
                message,
            });
    }
}

/// Resolve `inputs` and convert every eligible file.
///
/// Per-file problems never make this fail; only a worker pool that cannot be
/// built does.
pub fn run_batch<S: AsRef<OsStr>>(
    inputs: &[S],
    config: &ConvertConfig,
    registry: &CodecRegistry,
) -> Result<BatchReport, SchedulerError> {
    let resolved = resolve_inputs(inputs);
    let warnings: Vec<String> = resolved.warnings.iter().map(|w| w.to_string()).collect();

    let console = Console::new(config, resolved.len());
    for warning in &warnings {
        console.line(&format!("⚠️  Warning: {}", warning));
    }
    if resolved.is_empty() {
        console.line("No matching input files.");
        return Ok(BatchReport::nothing_to_do(warnings));
    }

    console.line(&format!(
        "Converting {} files, quality {}",
        resolved.len(),
        config.quality
    ));
    info!(
        files = resolved.len(),
        quality = config.quality.get(),
        speed = config.speed.get(),
        jobs = config.jobs,
        encoder = registry.encoder().name(),
        force = config.force,
        "Starting batch"
    );

    let start = Instant::now();
    let recorder = Recorder {
        stats: BatchStats::new(),
        files: Mutex::new(Vec::new()),
        console: &console,
    };

    let mut tasks = Vec::with_capacity(resolved.len());
    for input in &resolved.files {
        match plan_task(input, registry, config.force) {
            TaskPlan::Skip { task, reason } => {
                recorder.record(&task, ConversionOutcome::Skipped(reason));
            }
            TaskPlan::Dispatch { task, overwrites } => {
                if overwrites {
                    console.line(&format!(
                        "⚠️  {}: {}",
                        task.output.display(),
                        style("already exists, overwriting").yellow()
                    ));
                }
                recorder.stats.dispatch();
                tasks.push(task);
            }
        }
    }

    let scheduler = BoundedScheduler::new(config.jobs);
    scheduler.run(
        tasks,
        |task| execute_task(task, registry, config.quality),
        |task, result| {
            let outcome = match result {
                Ok(Ok(output)) => ConversionOutcome::Succeeded(output),
                Ok(Err(err)) => ConversionOutcome::Failed(err),
                Err(panic) => ConversionOutcome::Failed(ConvertError::Panicked(panic.message)),
            };
            recorder.record(task, outcome);
        },
    )?;

    let elapsed = start.elapsed();
    console.bar.finish_and_clear();

    let result = recorder.stats.snapshot();
    info!(
        considered = result.considered,
        attempted = result.attempted,
        succeeded = result.succeeded,
        failed = result.failed,
        skipped = result.skipped,
        elapsed_secs = elapsed.as_secs_f64(),
        "Batch finished"
    );

    Ok(BatchReport {
        summary: RunSummary::new(result, elapsed),
        files: recorder.files.into_inner().unwrap_or_else(|e| e.into_inner()),
        warnings,
    })
}
