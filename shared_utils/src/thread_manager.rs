//! Concurrency sizing
//!
//! Decides how many conversions may run at once. The host core count is only
//! a default; callers pass an explicit limit when they have one.

use std::sync::OnceLock;

/// Cached host parallelism
static HOST_PARALLELISM: OnceLock<usize> = OnceLock::new();

/// Number of execution units on this host, at least 1.
pub fn default_concurrency() -> usize {
    *HOST_PARALLELISM.get_or_init(|| num_cpus::get().max(1))
}

/// Resolve a user-supplied concurrency limit.
///
/// `None` and `Some(0)` fall back to [`default_concurrency`].
pub fn resolve_concurrency(requested: Option<usize>) -> usize {
    match requested {
        Some(n) if n > 0 => n,
        _ => default_concurrency(),
    }
}
