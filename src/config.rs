use crate::scanner::TailLimits;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration loaded from grinder-stats.toml.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
#[derive(Default)]
pub struct StatsConfig {
    pub scan: ScanConfig,
    pub report: ReportConfig,
}

/// How the statistics table is located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// Stream the whole log looking for the table header.
    #[default]
    Forward,
    /// Read only the end of the log, within bounded windows.
    Tail,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScanConfig {
    pub mode: ScanMode,
    pub totals_window: usize,
    pub max_test_rows: usize,
    pub footer_window: usize,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    /// Glob, relative to the workspace directory, locating the out log.
    pub pattern: String,
}

// --- Default implementations ---

impl Default for ScanConfig {
    fn default() -> Self {
        let limits = TailLimits::default();
        Self {
            mode: ScanMode::Forward,
            totals_window: limits.totals_window,
            max_test_rows: limits.max_test_rows,
            footer_window: limits.footer_window,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            pattern: "out*.log*".to_string(),
        }
    }
}

impl ScanConfig {
    pub fn tail_limits(&self) -> TailLimits {
        TailLimits {
            totals_window: self.totals_window,
            max_test_rows: self.max_test_rows,
            footer_window: self.footer_window,
        }
    }
}

/// Errors from loading the configuration file.
#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "failed to read config {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "failed to parse config {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
        }
    }
}

/// Load the config file. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<StatsConfig, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(StatsConfig::default());
        }
        Err(e) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };

    toml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let cfg = StatsConfig::default();
        assert_eq!(cfg.scan.mode, ScanMode::Forward);
        assert_eq!(cfg.scan.totals_window, 10);
        assert_eq!(cfg.scan.max_test_rows, 2000);
        assert_eq!(cfg.scan.footer_window, 10);
        assert_eq!(cfg.report.pattern, "out*.log*");
        assert_eq!(cfg.scan.tail_limits(), TailLimits::default());
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempdir().unwrap();
        let cfg = load_config(&dir.path().join("grinder-stats.toml")).unwrap();
        assert_eq!(cfg, StatsConfig::default());
    }

    #[test]
    fn test_partial_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("grinder-stats.toml");
        std::fs::write(
            &path,
            "[scan]\nmode = \"tail\"\nmax_test_rows = 50\n\n[report]\npattern = \"logs/out_*.log\"\n",
        )
        .unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.scan.mode, ScanMode::Tail);
        assert_eq!(cfg.scan.max_test_rows, 50);
        assert_eq!(cfg.scan.totals_window, 10);
        assert_eq!(cfg.report.pattern, "logs/out_*.log");
    }

    #[test]
    fn test_empty_config() {
        let cfg: StatsConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, StatsConfig::default());
    }

    #[test]
    fn test_invalid_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("grinder-stats.toml");
        std::fs::write(&path, "[scan]\nmode = \"sideways\"\n").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("failed to parse config"));
    }
}
