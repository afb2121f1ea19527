//! Shared Utilities for img-avif
//!
//! This crate provides the batch-processing machinery used by the converter:
//! - Input resolution (wildcard expansion, order-preserving dedup)
//! - Bounded scheduling (counting-semaphore admission over a rayon pool)
//! - Concurrency-safe batch statistics
//! - Summary reporting and progress display
//! - Logging setup

pub mod batch;
pub mod common_utils;
pub mod error_handler;
pub mod input_resolver;
pub mod logging;
pub mod progress;
pub mod report;
pub mod scheduler;
pub mod thread_manager;

pub use batch::{BatchResult, BatchStats, FileError};
pub use common_utils::{get_extension_lowercase, serialize_path_lossy};
pub use error_handler::{error_chain, report_error};
pub use input_resolver::{has_wildcard, resolve_inputs, ResolveError, ResolvedInputs};
pub use progress::{format_bytes, format_duration, BatchProgressBar};
pub use report::{format_summary_line, print_summary_report, RunSummary};
pub use scheduler::{AdmissionPermit, BoundedScheduler, SchedulerError, Semaphore, TaskPanic};
pub use thread_manager::{default_concurrency, resolve_concurrency};
