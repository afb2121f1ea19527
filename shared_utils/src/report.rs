//! Report Module
//!
//! Final summary for a batch run: one human-readable line, or a JSON document.

use crate::batch::BatchResult;
use crate::progress::format_duration;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Totals plus the wall-clock time from first dispatch to last completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(flatten)]
    pub result: BatchResult,
    /// Same figure as "failed" in the summary line: failures plus skips.
    pub reported_failed: usize,
    pub elapsed_secs: f64,
}

impl RunSummary {
    pub fn new(result: BatchResult, elapsed: Duration) -> Self {
        Self {
            reported_failed: result.reported_failures(),
            result,
            elapsed_secs: elapsed.as_secs_f64(),
        }
    }
}

pub fn format_summary_line(result: &BatchResult, duration: Duration) -> String {
    format!(
        "Conversion complete: {} files considered, {} converted, {} succeeded, {} failed ({} skipped), total time {}.",
        result.considered,
        result.attempted,
        result.succeeded,
        result.reported_failures(),
        result.skipped,
        format_duration(duration)
    )
}

pub fn print_summary_report(result: &BatchResult, duration: Duration) {
    println!();
    println!("{}", format_summary_line(result, duration));

    if !result.errors.is_empty() {
        println!();
        println!("❌ Errors encountered:");
        for error in &result.errors {
            println!("   {} → {}", error.path.display(), error.message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::BatchStats;
    use std::path::Path;

    fn sample() -> BatchResult {
        let stats = BatchStats::new();
        stats.dispatch();
        stats.success();
        stats.skip();
        stats.skip();
        stats.snapshot()
    }

    #[test]
    fn test_summary_line_fields() {
        let line = format_summary_line(&sample(), Duration::from_millis(1500));
        assert!(line.contains("3 files considered"));
        assert!(line.contains("1 converted"));
        assert!(line.contains("1 succeeded"));
        assert!(line.contains("2 failed (2 skipped)"));
        assert!(line.contains("1.50s"));
    }

    #[test]
    fn test_print_summary_report_no_panic() {
        let stats = BatchStats::new();
        stats.dispatch();
        stats.fail(Path::new("test.png"), "Error");
        print_summary_report(&stats.snapshot(), Duration::from_secs(10));
        print_summary_report(&BatchResult::new(), Duration::ZERO);
    }

    #[test]
    fn test_run_summary_json() {
        let summary = RunSummary::new(sample(), Duration::from_millis(250));
        let json = serde_json::to_string(&summary).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["attempted"], 1);
        assert_eq!(value["failed"], 0);
        assert_eq!(value["skipped"], 2);
        assert_eq!(value["reported_failed"], 2);
        assert!((value["elapsed_secs"].as_f64().unwrap() - 0.25).abs() < 1e-9);

        let back: RunSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, summary);
    }
}
