//! Report sources: opening an out log and finding it in a workspace.
//!
//! Logs archived with zstd (`*.zst`) are decompressed on the fly.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Whether a path names a zstd-compressed log.
pub fn is_compressed(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "zst")
}

/// Open a report for forward reading.
pub fn open_report(path: &Path) -> std::io::Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    if is_compressed(path) {
        tracing::debug!(path = %path.display(), "opening zstd-compressed report");
        let decoder = zstd::stream::read::Decoder::new(file)?;
        Ok(Box::new(BufReader::new(decoder)))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Resolve the report named on the command line: a directory is searched
/// with `pattern`, anything else must be an existing file.
pub fn resolve_report(path: &Path, pattern: &str) -> Result<PathBuf, SourceError> {
    if path.is_dir() {
        find_report(path, pattern)
    } else if path.is_file() {
        Ok(path.to_path_buf())
    } else {
        Err(SourceError::Missing {
            path: path.to_path_buf(),
        })
    }
}

/// Find the out log inside a workspace directory.
///
/// `pattern` is a glob relative to `workspace`. When several files match, the
/// first in path order wins.
pub fn find_report(workspace: &Path, pattern: &str) -> Result<PathBuf, SourceError> {
    let full = workspace.join(pattern);
    let full = full.to_string_lossy();
    let paths = glob::glob(&full).map_err(|e| SourceError::Pattern {
        pattern: pattern.to_string(),
        source: e,
    })?;

    let mut matches: Vec<PathBuf> = paths.flatten().filter(|p| p.is_file()).collect();
    matches.sort();

    if matches.len() > 1 {
        tracing::warn!(
            pattern,
            count = matches.len(),
            chosen = %matches[0].display(),
            "several reports match, using the first"
        );
    }

    matches
        .into_iter()
        .next()
        .ok_or_else(|| SourceError::NotFound {
            workspace: workspace.to_path_buf(),
            pattern: pattern.to_string(),
        })
}

/// Errors from report discovery.
#[derive(Debug)]
pub enum SourceError {
    /// The configured glob is invalid.
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },
    /// No file matched.
    NotFound { workspace: PathBuf, pattern: String },
    /// An explicitly named report does not exist.
    Missing { path: PathBuf },
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Pattern { pattern, source } => {
                write!(f, "invalid report pattern '{pattern}': {source}")
            }
            SourceError::NotFound { workspace, pattern } => {
                write!(
                    f,
                    "report file not found: no match for '{pattern}' in {}",
                    workspace.display()
                )
            }
            SourceError::Missing { path } => {
                write!(f, "report file not found: {}", path.display())
            }
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SourceError::Pattern { source, .. } => Some(source),
            SourceError::NotFound { .. } | SourceError::Missing { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::tempdir;

    #[test]
    fn test_open_plain_report() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out_0.log");
        std::fs::write(&path, "line 1\nline 2\n").unwrap();

        let mut contents = String::new();
        open_report(&path).unwrap().read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "line 1\nline 2\n");
    }

    #[test]
    fn test_open_compressed_report() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out_0.log.zst");
        let compressed = zstd::encode_all("line 1\nline 2\n".as_bytes(), 3).unwrap();
        std::fs::write(&path, compressed).unwrap();

        let mut contents = String::new();
        open_report(&path).unwrap().read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "line 1\nline 2\n");
    }

    #[test]
    fn test_open_missing_report() {
        let dir = tempdir().unwrap();
        let err = open_report(&dir.path().join("missing.log")).err().unwrap();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn test_is_compressed() {
        assert!(is_compressed(Path::new("out_0.log.zst")));
        assert!(!is_compressed(Path::new("out_0.log")));
        assert!(!is_compressed(Path::new("zst")));
    }

    #[test]
    fn test_find_report_first_match() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("out_host-1.log"), "b").unwrap();
        std::fs::write(dir.path().join("out_host-0.log"), "a").unwrap();
        std::fs::write(dir.path().join("data_host-0.log"), "c").unwrap();

        let found = find_report(dir.path(), "out*.log*").unwrap();
        assert_eq!(found, dir.path().join("out_host-0.log"));
    }

    #[test]
    fn test_find_report_in_subdirectory() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("log")).unwrap();
        std::fs::write(dir.path().join("log/out_ci-0.log.zst"), "x").unwrap();

        let found = find_report(dir.path(), "log/out*.log*").unwrap();
        assert_eq!(found, dir.path().join("log/out_ci-0.log.zst"));
    }

    #[test]
    fn test_find_report_skips_directories() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("out.logs")).unwrap();

        let err = find_report(dir.path(), "out*.log*").unwrap_err();
        assert!(matches!(err, SourceError::NotFound { .. }));
        assert!(err.to_string().contains("report file not found"));
    }

    #[test]
    fn test_resolve_report_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out_grinder-0.log");
        let err = resolve_report(&path, "out*.log*").unwrap_err();
        assert!(matches!(err, SourceError::Missing { .. }));
        assert!(err.to_string().starts_with("report file not found"));
    }

    #[test]
    fn test_resolve_report_file_and_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out_grinder-0.log");
        std::fs::write(&path, "x").unwrap();

        assert_eq!(resolve_report(&path, "ignored").unwrap(), path);
        assert_eq!(resolve_report(dir.path(), "out*.log*").unwrap(), path);
    }

    #[test]
    fn test_find_report_bad_pattern() {
        let dir = tempdir().unwrap();
        let err = find_report(dir.path(), "out[.log").unwrap_err();
        assert!(matches!(err, SourceError::Pattern { .. }));
    }
}
