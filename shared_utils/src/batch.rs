//! Batch Statistics Module
//!
//! Concurrency-safe tallies for a batch run. Workers update a shared
//! [`BatchStats`] through `&self`; once the scheduler has returned the caller
//! takes an immutable [`BatchResult`] snapshot for reporting.
//!
//! Counting rules:
//! - `considered`: every file the run looked at
//! - `attempted`: files actually dispatched to a worker
//! - `succeeded` / `failed`: terminal outcomes of dispatched files
//! - `skipped`: files rejected before dispatch (missing, unsupported, output exists)
//!
//! so `attempted == succeeded + failed` and `considered == attempted + skipped`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileError {
    #[serde(serialize_with = "crate::common_utils::serialize_path_lossy")]
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct BatchStats {
    considered: AtomicUsize,
    attempted: AtomicUsize,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    skipped: AtomicUsize,
    errors: Mutex<Vec<FileError>>,
}

impl BatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// A file was rejected before dispatch.
    pub fn skip(&self) {
        self.considered.fetch_add(1, Ordering::Relaxed);
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// A file was admitted to the worker pool.
    pub fn dispatch(&self) {
        self.considered.fetch_add(1, Ordering::Relaxed);
        self.attempted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn success(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fail(&self, path: &Path, message: impl Into<String>) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        let mut errors = self.errors.lock().unwrap_or_else(|e| e.into_inner());
        errors.push(FileError {
            path: path.to_path_buf(),
            message: message.into(),
        });
    }

    pub fn snapshot(&self) -> BatchResult {
        let errors = self
            .errors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        BatchResult {
            considered: self.considered.load(Ordering::Acquire),
            attempted: self.attempted.load(Ordering::Acquire),
            succeeded: self.succeeded.load(Ordering::Acquire),
            failed: self.failed.load(Ordering::Acquire),
            skipped: self.skipped.load(Ordering::Acquire),
            errors,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub considered: usize,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errors: Vec<FileError>,
}

impl BatchResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Failures as shown to the operator: conversion failures plus
    /// files skipped before dispatch.
    pub fn reported_failures(&self) -> usize {
        self.failed + self.skipped
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_batch_stats_new() {
        let result = BatchStats::new().snapshot();
        assert_eq!(result, BatchResult::new());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_batch_stats_mixed() {
        let stats = BatchStats::new();
        stats.skip();
        stats.skip();
        stats.dispatch();
        stats.dispatch();
        stats.success();
        stats.fail(Path::new("broken.png"), "decode error");

        let result = stats.snapshot();
        assert_eq!(result.considered, 4);
        assert_eq!(result.attempted, 2);
        assert_eq!(result.succeeded, 1);
        assert_eq!(result.failed, 1);
        assert_eq!(result.skipped, 2);
        assert_eq!(result.reported_failures(), 3);
        assert_eq!(result.errors[0].path, PathBuf::from("broken.png"));
        assert_eq!(result.errors[0].message, "decode error");
    }

    #[test]
    fn test_concurrent_updates_are_exact() {
        const THREADS: usize = 16;
        const PER_THREAD: usize = 5_000;

        let stats = Arc::new(BatchStats::new());
        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let stats = Arc::clone(&stats);
                std::thread::spawn(move || {
                    for i in 0..PER_THREAD {
                        if i % 10 == 0 {
                            stats.skip();
                            continue;
                        }
                        stats.dispatch();
                        if (i + t) % 7 == 0 {
                            stats.fail(Path::new("f.png"), "E");
                        } else {
                            stats.success();
                        }
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let result = stats.snapshot();
        assert_eq!(result.considered, THREADS * PER_THREAD);
        assert_eq!(result.attempted, result.succeeded + result.failed);
        assert_eq!(result.considered, result.attempted + result.skipped);
        assert_eq!(result.skipped, THREADS * (PER_THREAD / 10));
        assert_eq!(result.errors.len(), result.failed);
    }

    #[test]
    fn test_batch_result_json_round_trip() {
        let stats = BatchStats::new();
        stats.dispatch();
        stats.fail(Path::new("x.gif"), "bad frame");
        let result = stats.snapshot();

        let json = serde_json::to_string(&result).unwrap();
        let back: BatchResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
