//! Batch progress bar and human-readable formatting helpers.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub mod templates {
    pub const BATCH: &str = "{spinner:.green} {prefix:.cyan.bold} ▕{bar:35.green/black}▏ {percent:>3}% • {pos}/{len} • ⏱️ {elapsed_precise} • {msg}";
    pub const PROGRESS_CHARS: &str = "█▓░";
    pub const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";
}

/// Progress bar shared by all workers of a batch.
///
/// Per-file lines go through [`BatchProgressBar::println`] so they are printed
/// above the bar instead of tearing it.
pub struct BatchProgressBar {
    bar: ProgressBar,
    is_finished: AtomicBool,
}

impl BatchProgressBar {
    pub fn new(total: u64, prefix: &str) -> Arc<Self> {
        let bar = ProgressBar::new(total);
        match ProgressStyle::default_bar().template(templates::BATCH) {
            Ok(style) => bar.set_style(
                style
                    .progress_chars(templates::PROGRESS_CHARS)
                    .tick_chars(templates::SPINNER_CHARS),
            ),
            Err(e) => tracing::debug!(error = %e, "Falling back to default progress style"),
        }
        bar.set_prefix(prefix.to_string());
        bar.set_draw_target(ProgressDrawTarget::stderr_with_hz(20));
        Arc::new(Self {
            bar,
            is_finished: AtomicBool::new(false),
        })
    }

    /// A bar that never draws; lines still reach stdout.
    pub fn hidden(total: u64) -> Arc<Self> {
        let bar = ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::hidden());
        Arc::new(Self {
            bar,
            is_finished: AtomicBool::new(false),
        })
    }

    pub fn inc(&self) {
        self.bar.inc(1);
    }

    /// Print a line to stdout without corrupting the bar.
    pub fn println(&self, msg: &str) {
        self.bar.suspend(|| println!("{}", msg));
    }

    /// Print a line to stderr without corrupting the bar.
    pub fn eprintln(&self, msg: &str) {
        self.bar.suspend(|| eprintln!("{}", msg));
    }

    pub fn finish_and_clear(&self) {
        if self.is_finished.swap(true, Ordering::Relaxed) {
            return;
        }
        self.bar.finish_and_clear();
    }
}

pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Sub-minute durations keep millisecond precision; image batches are often
/// shorter than a second.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    } else if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{:.2}s", duration.as_secs_f64())
    }
}
