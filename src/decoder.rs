/// Row decoder: turns one statistics row into a [`TestRecord`].
///
/// Columns are separated by runs of two or more whitespace characters; test
/// names contain single spaces, so single spaces never split. Fields are read
/// strictly left to right:
///
/// ```text
/// id  tests  errors  mean  stddev  [tps]  [resp-len  bytes/s  resp-errors  resolve  connect  first-byte)]  "name"
/// ```
///
/// The bracketed response group is present only on extended rows, detected
/// by whether a numeric token follows the leading fields.
use crate::error::ReportError;
use crate::layout::ColumnLayout;
use crate::model::{ExtendedMetrics, RowFormat, TestRecord};
use regex::Regex;
use std::iter::Peekable;
use std::sync::LazyLock;

/// Column delimiter.
static COLUMN_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());

/// Tokens the report prints in place of a value it could not compute.
const PLACEHOLDERS: [&str; 2] = ["?", "-"];

/// Decode a single row under the given layout.
///
/// The totals row never carries a name; any trailing token is left unread.
pub fn decode_row(
    row: &str,
    is_totals_row: bool,
    layout: ColumnLayout,
) -> Result<TestRecord, ReportError> {
    let mut tokens = Tokens::new(row);

    let id = tokens.next("id")?.to_string();
    let test_count = tokens.next_u64("test count")?;
    let error_count = tokens.next_u64("error count")?;
    let mean_test_time = tokens.next_f64("mean test time")?;
    let std_dev = tokens.next_f64("test time standard deviation")?;
    let tps = if layout.has_tps {
        Some(tokens.next_f64("tps")?)
    } else {
        None
    };

    let format = if tokens.peek_is_number() {
        RowFormat::Extended(ExtendedMetrics {
            mean_resp_length: tokens.next_f64("mean response length")?,
            resp_bytes_per_second: tokens.next_f64_or_placeholder("response bytes per second")?,
            resp_error_count: tokens.next_u64("response error count")?,
            resolve_host_mean_time: tokens.next_f64_or_placeholder("resolve host mean time")?,
            establish_conn_mean_time: tokens
                .next_f64_or_placeholder("establish connection mean time")?,
            first_byte_mean_time: tokens.next_first_byte()?,
        })
    } else {
        RowFormat::Basic
    };

    let name = if is_totals_row {
        String::new()
    } else {
        tokens.next("name")?.replace('"', "")
    };

    Ok(TestRecord {
        id,
        name,
        test_count,
        error_count,
        mean_test_time,
        std_dev,
        tps,
        format,
    })
}

/// Column tokens of one row, with typed accessors that report the row on
/// failure.
struct Tokens<'a> {
    row: &'a str,
    iter: Peekable<regex::Split<'static, 'a>>,
}

impl<'a> Tokens<'a> {
    fn new(row: &'a str) -> Self {
        Self {
            row,
            iter: COLUMN_SEPARATOR.split(row.trim()).peekable(),
        }
    }

    fn next(&mut self, field: &str) -> Result<&'a str, ReportError> {
        match self.iter.next() {
            Some(tok) if !tok.is_empty() => Ok(tok),
            _ => Err(ReportError::malformed_row(
                self.row,
                format!("missing {field}"),
            )),
        }
    }

    fn peek_is_number(&mut self) -> bool {
        self.iter
            .peek()
            .is_some_and(|tok| parse_decimal(tok).is_some())
    }

    fn next_u64(&mut self, field: &str) -> Result<u64, ReportError> {
        let tok = self.next(field)?;
        tok.parse()
            .map_err(|_| ReportError::malformed_row(self.row, format!("invalid {field} '{tok}'")))
    }

    fn next_f64(&mut self, field: &str) -> Result<f64, ReportError> {
        let tok = self.next(field)?;
        parse_decimal(tok)
            .ok_or_else(|| ReportError::malformed_row(self.row, format!("invalid {field} '{tok}'")))
    }

    fn next_f64_or_placeholder(&mut self, field: &str) -> Result<f64, ReportError> {
        let tok = self.next(field)?;
        if PLACEHOLDERS.contains(&tok) {
            return Ok(0.0);
        }
        parse_decimal(tok)
            .ok_or_else(|| ReportError::malformed_row(self.row, format!("invalid {field} '{tok}'")))
    }

    /// The first-byte time is printed with a closing parenthesis attached.
    fn next_first_byte(&mut self) -> Result<f64, ReportError> {
        let field = "first byte mean time";
        let tok = self.next(field)?;
        let cleaned = tok.replace(')', "");
        parse_decimal(&cleaned)
            .ok_or_else(|| ReportError::malformed_row(self.row, format!("invalid {field} '{tok}'")))
    }
}

/// Parse a decimal number written with `.` as the decimal point.
///
/// Only digits, sign, `.`, and exponent markers are accepted, so tokens like
/// `inf` or a quoted name never count as numbers.
fn parse_decimal(tok: &str) -> Option<f64> {
    let plausible = tok.bytes().any(|b| b.is_ascii_digit())
        && tok
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'));
    if !plausible {
        return None;
    }
    tok.parse().ok()
}
