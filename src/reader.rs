//! Entry points: locate the table, detect its layout, decode every row.
//!
//! Each call builds its result locally and hands it back whole. Any failing
//! row aborts the call; no partial result is ever returned.

use crate::config::{ScanConfig, ScanMode};
use crate::decoder::decode_row;
use crate::error::ReportError;
use crate::layout::ColumnLayout;
use crate::model::ParseResult;
use crate::scanner::{self, LocatedTable, TailLimits};
use crate::source;
use std::io::{BufRead, Read, Seek};
use std::path::Path;

/// Parse a report by streaming it from the start.
pub fn parse_reader<R: BufRead>(reader: R) -> Result<ParseResult, ReportError> {
    let table = scanner::scan_forward(reader)?;
    assemble(table)
}

/// Parse a report held in memory.
pub fn parse_str(text: &str) -> Result<ParseResult, ReportError> {
    parse_reader(text.as_bytes())
}

/// Parse a report by reading only its tail.
pub fn parse_tail<R: Read + Seek>(
    source: R,
    limits: &TailLimits,
) -> Result<ParseResult, ReportError> {
    let table = scanner::scan_tail(source, limits)?;
    assemble(table)
}

/// Parse a report file using the configured scan mode.
///
/// Compressed reports cannot be read backwards and are always scanned
/// forward.
pub fn parse_file(path: &Path, config: &ScanConfig) -> Result<ParseResult, ReportError> {
    let mode = if config.mode == ScanMode::Tail && source::is_compressed(path) {
        tracing::debug!(path = %path.display(), "compressed report, falling back to forward scan");
        ScanMode::Forward
    } else {
        config.mode
    };

    let result = match mode {
        ScanMode::Forward => parse_reader(source::open_report(path)?),
        ScanMode::Tail => parse_tail(std::fs::File::open(path)?, &config.tail_limits()),
    }?;

    tracing::info!(
        path = %path.display(),
        mode = ?mode,
        tests = result.tests().len(),
        "parsed statistics report"
    );
    Ok(result)
}

/// Turn a located table into records.
fn assemble(table: LocatedTable) -> Result<ParseResult, ReportError> {
    let LocatedTable {
        text,
        test_rows,
        mut totals_rows,
    } = table;

    if totals_rows.len() != 1 {
        return Err(ReportError::malformed_report(match totals_rows.len() {
            0 => "no totals row".to_string(),
            n => format!("{n} totals rows, expected one"),
        }));
    }
    let totals_row = totals_rows.remove(0);

    let layout = ColumnLayout::detect(&text);

    let tests = test_rows
        .iter()
        .map(|row| decode_row(row, false, layout))
        .collect::<Result<Vec<_>, _>>()?;
    let totals = decode_row(&totals_row, true, layout)?;

    Ok(ParseResult::new(tests, totals))
}
