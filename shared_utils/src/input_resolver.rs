//! Input Resolution Module
//!
//! Turns the raw command-line inputs into the ordered list of files to convert.
//! Arguments containing wildcard metacharacters are expanded against the
//! filesystem, everything else is taken literally. The merged list keeps the
//! first occurrence of every path string and drops later duplicates.
//!
//! Literal arguments are passed through byte for byte, so file names that are
//! not valid UTF-8 still work when named directly. The `glob` crate only
//! matches UTF-8 names: such files are not found by a wildcard pattern, and a
//! pattern that is itself not UTF-8 is reported as a warning.

use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, warn};

/// Characters that turn an argument into a glob pattern.
pub const WILDCARD_CHARS: &[char] = &['*', '?', '[', ']'];

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("invalid file pattern '{pattern}': {source}")]
    MalformedPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("cannot read match of '{pattern}': {source}")]
    UnreadableMatch {
        pattern: String,
        #[source]
        source: glob::GlobError,
    },

    #[error("file pattern '{pattern}' is not valid UTF-8 and cannot be expanded")]
    NonUtf8Pattern { pattern: String },
}

/// Result of resolving a list of inputs.
///
/// `warnings` holds the patterns that were skipped; they never make the whole
/// resolution fail.
#[derive(Debug, Default)]
pub struct ResolvedInputs {
    pub files: Vec<PathBuf>,
    pub warnings: Vec<ResolveError>,
}

impl ResolvedInputs {
    /// No pattern matched anything: the caller has nothing to do.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }
}

/// Returns true if `pattern` contains a glob metacharacter.
pub fn has_wildcard(pattern: &str) -> bool {
    pattern.contains(WILDCARD_CHARS)
}

/// Expand and deduplicate `patterns`, preserving first-seen order.
pub fn resolve_inputs<S: AsRef<OsStr>>(patterns: &[S]) -> ResolvedInputs {
    let mut resolved = ResolvedInputs::default();
    let mut seen: HashSet<OsString> = HashSet::new();

    let mut push = |files: &mut Vec<PathBuf>, candidate: PathBuf| {
        if seen.insert(candidate.as_os_str().to_os_string()) {
            files.push(candidate);
        }
    };

    for raw in patterns {
        let raw = raw.as_ref();

        let pattern = match raw.to_str() {
            Some(p) if has_wildcard(p) => p,
            Some(_) => {
                push(&mut resolved.files, PathBuf::from(raw));
                continue;
            }
            None => {
                let lossy = raw.to_string_lossy();
                if has_wildcard(&lossy) {
                    let err = ResolveError::NonUtf8Pattern {
                        pattern: lossy.into_owned(),
                    };
                    warn!(error = %err, "Skipping pattern");
                    resolved.warnings.push(err);
                } else {
                    push(&mut resolved.files, PathBuf::from(raw));
                }
                continue;
            }
        };

        let paths = match glob::glob(pattern) {
            Ok(paths) => paths,
            Err(source) => {
                let err = ResolveError::MalformedPattern {
                    pattern: pattern.to_string(),
                    source,
                };
                warn!(%pattern, error = %err, "Skipping malformed pattern");
                resolved.warnings.push(err);
                continue;
            }
        };

        let mut matched = 0usize;
        for entry in paths {
            match entry {
                Ok(path) => {
                    matched += 1;
                    push(&mut resolved.files, path);
                }
                Err(source) => {
                    let err = ResolveError::UnreadableMatch {
                        pattern: pattern.to_string(),
                        source,
                    };
                    warn!(%pattern, error = %err, "Skipping unreadable match");
                    resolved.warnings.push(err);
                }
            }
        }
        debug!(%pattern, matched, "Expanded pattern");
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, name: &str) -> String {
        let path = dir.path().join(name);
        fs::write(&path, b"x").unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_has_wildcard() {
        assert!(has_wildcard("*.png"));
        assert!(has_wildcard("img?.jpg"));
        assert!(has_wildcard("img[0-9].gif"));
        assert!(!has_wildcard("plain/path.png"));
        assert!(!has_wildcard(""));
    }

    #[test]
    fn test_literals_kept_verbatim_even_if_missing() {
        let resolved = resolve_inputs(&["a.png", "does/not/exist.jpg"]);
        assert_eq!(
            resolved.files,
            vec![PathBuf::from("a.png"), PathBuf::from("does/not/exist.jpg")]
        );
        assert!(resolved.warnings.is_empty());
    }

    #[test]
    fn test_literal_duplicates_first_wins() {
        let resolved = resolve_inputs(&["b.png", "a.png", "b.png", "c.png", "a.png"]);
        assert_eq!(
            resolved.files,
            vec![
                PathBuf::from("b.png"),
                PathBuf::from("a.png"),
                PathBuf::from("c.png")
            ]
        );
    }

    #[test]
    fn test_glob_expansion_and_dedup_with_literal() {
        let dir = TempDir::new().unwrap();
        let a = touch(&dir, "a.png");
        let b = touch(&dir, "b.png");
        touch(&dir, "c.jpg");

        let pattern = format!("{}/*.png", dir.path().display());
        let resolved = resolve_inputs(&[b.clone(), pattern.clone(), pattern]);

        assert_eq!(resolved.files, vec![PathBuf::from(&b), PathBuf::from(&a)]);
    }

    #[test]
    fn test_pattern_matching_nothing_is_empty_not_error() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "a.png");
        let pattern = format!("{}/*.xyz", dir.path().display());

        let resolved = resolve_inputs(&[pattern]);
        assert!(resolved.is_empty());
        assert_eq!(resolved.len(), 0);
        assert!(resolved.warnings.is_empty());
    }

    #[test]
    fn test_malformed_pattern_is_warning_and_run_continues() {
        let resolved = resolve_inputs(&["[unclosed*.png", "ok.png"]);
        assert_eq!(resolved.files, vec![PathBuf::from("ok.png")]);
        assert_eq!(resolved.warnings.len(), 1);
        assert!(matches!(
            resolved.warnings[0],
            ResolveError::MalformedPattern { .. }
        ));
        assert!(resolved.warnings[0].to_string().contains("[unclosed*.png"));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_literal_passes_through() {
        use std::os::unix::ffi::OsStrExt;

        let name = OsStr::from_bytes(b"caf\xe9.png");
        let resolved = resolve_inputs(&[name, OsStr::new("a.png"), name]);
        assert_eq!(
            resolved.files,
            vec![PathBuf::from(name), PathBuf::from("a.png")]
        );
        assert_eq!(resolved.files[0].as_os_str().as_bytes(), b"caf\xe9.png");
        assert!(resolved.warnings.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_pattern_is_warning() {
        use std::os::unix::ffi::OsStrExt;

        let pattern = OsStr::from_bytes(b"caf\xe9*.png");
        let resolved = resolve_inputs(&[pattern, OsStr::new("ok.png")]);
        assert_eq!(resolved.files, vec![PathBuf::from("ok.png")]);
        assert_eq!(resolved.warnings.len(), 1);
        assert!(matches!(
            resolved.warnings[0],
            ResolveError::NonUtf8Pattern { .. }
        ));
    }

    #[test]
    fn test_glob_matches_keep_their_path() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "x y.png");
        let pattern = dir.path().join("*.png");

        let resolved = resolve_inputs(&[pattern.as_os_str()]);
        assert_eq!(resolved.files, vec![dir.path().join("x y.png")]);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn literal_resolution_is_ordered_and_unique(
            names in proptest::collection::vec("[a-e]{1,2}\\.png", 0..24)
        ) {
            let resolved = resolve_inputs(&names);

            let mut expected: Vec<PathBuf> = Vec::new();
            for name in &names {
                let path = PathBuf::from(name);
                if !expected.contains(&path) {
                    expected.push(path);
                }
            }
            prop_assert_eq!(&resolved.files, &expected);

            let unique: HashSet<_> = resolved.files.iter().collect();
            prop_assert_eq!(unique.len(), resolved.files.len());
        }
    }
}
