/// Errors raised while locating or decoding a statistics table.
///
/// Every variant is fatal to the parse call; no partial result is returned.
#[derive(Debug)]
pub enum ReportError {
    /// The source was absent or contained no bytes.
    EmptyInput,
    /// The header (forward scan) or the totals row (tail scan) was not found.
    StatsBlockNotFound { detail: String },
    /// A row had too few tokens or a token of the wrong type.
    MalformedRow { row: String, detail: String },
    /// The table did not contain exactly one totals row.
    MalformedReport { detail: String },
    /// Reading the underlying source failed.
    Io { source: std::io::Error },
}

impl ReportError {
    pub(crate) fn not_found(detail: impl Into<String>) -> Self {
        ReportError::StatsBlockNotFound {
            detail: detail.into(),
        }
    }

    pub(crate) fn malformed_row(row: &str, detail: impl Into<String>) -> Self {
        ReportError::MalformedRow {
            row: row.to_string(),
            detail: detail.into(),
        }
    }

    pub(crate) fn malformed_report(detail: impl Into<String>) -> Self {
        ReportError::MalformedReport {
            detail: detail.into(),
        }
    }
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::EmptyInput => write!(f, "empty input stream"),
            ReportError::StatsBlockNotFound { detail } => {
                write!(f, "statistics block not found: {detail}")
            }
            ReportError::MalformedRow { row, detail } => {
                write!(f, "malformed row ({detail}): {}", row.trim_end())
            }
            ReportError::MalformedReport { detail } => {
                write!(f, "malformed report: {detail}")
            }
            ReportError::Io { source } => write!(f, "failed to read report: {source}"),
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReportError::Io { source } => Some(source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ReportError {
    fn from(source: std::io::Error) -> Self {
        ReportError::Io { source }
    }
}
