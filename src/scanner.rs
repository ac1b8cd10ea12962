//! Locating the final statistics table inside a Grinder out log.
//!
//! Two strategies are available:
//!
//! - **Forward**: stream the log from the start, wait for the column header
//!   (`Tests        Errors ...`), then classify every following line.
//! - **Tail**: read a seekable file backwards from the end, within fixed
//!   windows. The table is always the last block of the log, so very large
//!   logs never need to be read in full.
//!
//! Both produce a [`LocatedTable`]: the raw region text (for layout
//! detection) and the unparsed test and totals rows.

use crate::error::ReportError;
use regex::Regex;
use std::io::{BufRead, Read, Seek, SeekFrom};
use std::sync::LazyLock;

static HEADER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+Tests\s{2,}Errors(\s|$)").unwrap());
static TEST_ROW_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^Test \d").unwrap());
static TOTALS_ROW_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^Totals\s").unwrap());

/// Printed by the agent right above the statistics header.
const FINAL_STATISTICS_MARKER: &str = "final statistics for this process:";

/// Block size for backwards reads.
const TAIL_CHUNK_SIZE: u64 = 8 * 1024;

/// Classification of a line inside the table region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    TestRow,
    TotalsRow,
    Other,
}

/// Classify one line. Blank lines and separators are `Other`.
pub fn classify(line: &str) -> LineKind {
    if TEST_ROW_PATTERN.is_match(line) {
        LineKind::TestRow
    } else if TOTALS_ROW_PATTERN.is_match(line) {
        LineKind::TotalsRow
    } else {
        LineKind::Other
    }
}

/// Whether a line is the statistics column header.
pub fn is_header(line: &str) -> bool {
    HEADER_PATTERN.is_match(line)
}

fn is_final_statistics_marker(line: &str) -> bool {
    line.trim_end()
        .to_ascii_lowercase()
        .ends_with(FINAL_STATISTICS_MARKER)
}

/// Bounds for the tail strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TailLimits {
    /// Lines from the end searched for the totals row.
    pub totals_window: usize,
    /// Maximum number of test rows above the totals row.
    pub max_test_rows: usize,
    /// Lines above the test rows searched for the header and marker.
    pub footer_window: usize,
}

impl Default for TailLimits {
    fn default() -> Self {
        Self {
            totals_window: 10,
            max_test_rows: 2000,
            footer_window: 10,
        }
    }
}

/// The raw statistics table found by a scan.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LocatedTable {
    /// Every line of the region, newline-joined, in source order.
    pub text: String,
    /// Test rows in source order.
    pub test_rows: Vec<String>,
    /// Totals rows seen. A well-formed report has exactly one.
    pub totals_rows: Vec<String>,
}

impl LocatedTable {
    fn push_text(&mut self, line: &str) {
        self.text.push_str(line);
        self.text.push('\n');
    }
}

/// Progress of a forward scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    SeekingHeader,
    InTable,
    /// Totals consumed. Later lines are only checked for a second totals row.
    Done,
}

/// Stream a log from the start and collect the table following the header.
pub fn scan_forward<R: BufRead>(mut reader: R) -> Result<LocatedTable, ReportError> {
    let mut state = ScanState::SeekingHeader;
    let mut table = LocatedTable::default();
    let mut buf = Vec::new();
    let mut saw_any_line = false;
    let mut line_no = 0usize;

    loop {
        buf.clear();
        let n = reader.read_until(b'\n', &mut buf)?;
        if n == 0 {
            break;
        }
        saw_any_line = true;
        line_no += 1;
        let line = decode_line(&buf);

        state = match state {
            ScanState::SeekingHeader => {
                if is_header(&line) {
                    tracing::debug!(line = line_no, "found statistics header");
                    table.push_text(&line);
                    ScanState::InTable
                } else {
                    ScanState::SeekingHeader
                }
            }
            ScanState::InTable => {
                table.push_text(&line);
                match classify(&line) {
                    LineKind::TestRow => {
                        table.test_rows.push(line);
                        ScanState::InTable
                    }
                    LineKind::TotalsRow => {
                        table.totals_rows.push(line);
                        ScanState::Done
                    }
                    LineKind::Other => ScanState::InTable,
                }
            }
            ScanState::Done => {
                table.push_text(&line);
                if classify(&line) == LineKind::TotalsRow {
                    tracing::warn!(line = line_no, "second totals row after statistics table");
                    table.totals_rows.push(line);
                }
                ScanState::Done
            }
        };
    }

    if !saw_any_line {
        return Err(ReportError::EmptyInput);
    }
    if state == ScanState::SeekingHeader {
        return Err(ReportError::not_found(format!(
            "no statistics header in {line_no} lines"
        )));
    }

    tracing::debug!(
        tests = table.test_rows.len(),
        totals = table.totals_rows.len(),
        "forward scan complete"
    );
    Ok(table)
}

/// Read a seekable log backwards and collect the trailing table.
///
/// Looks for the totals row in the last `totals_window` lines, then the
/// contiguous block of test rows above it (at most `totals_window` blank
/// lines between the two are skipped), then up to `footer_window` more lines that should contain the
/// header. Those lines become part of the region text so layout detection
/// sees the header.
pub fn scan_tail<R: Read + Seek>(
    source: R,
    limits: &TailLimits,
) -> Result<LocatedTable, ReportError> {
    let mut lines = RevLines::new(source)?;
    if lines.is_empty() {
        return Err(ReportError::EmptyInput);
    }

    // Collected bottom-up; reversed at the end.
    let mut region = Vec::new();

    let mut totals = None;
    for _ in 0..limits.totals_window {
        let Some(line) = lines.next_line()? else {
            break;
        };
        let is_totals = classify(&line) == LineKind::TotalsRow;
        region.push(line.clone());
        if is_totals {
            totals = Some(line);
            break;
        }
    }
    let totals = totals.ok_or_else(|| {
        ReportError::not_found(format!(
            "no totals row within the last {} lines",
            limits.totals_window
        ))
    })?;

    let mut tests = Vec::new();
    let mut boundary = None;
    let mut blanks_skipped = 0usize;
    while let Some(line) = lines.next_line()? {
        match classify(&line) {
            LineKind::TestRow => {
                if tests.len() == limits.max_test_rows {
                    return Err(ReportError::not_found(format!(
                        "more than {} test rows above the totals row",
                        limits.max_test_rows
                    )));
                }
                region.push(line.clone());
                tests.push(line);
            }
            LineKind::TotalsRow if tests.is_empty() => {
                return Err(ReportError::malformed_report(
                    "more than one totals row at the end of the report",
                ));
            }
            LineKind::Other if tests.is_empty() && line.trim().is_empty() => {
                if blanks_skipped == limits.totals_window {
                    return Err(ReportError::not_found(format!(
                        "more than {} blank lines above the totals row",
                        limits.totals_window
                    )));
                }
                blanks_skipped += 1;
                region.push(line);
            }
            _ => {
                boundary = Some(line);
                break;
            }
        }
    }

    let mut header_seen = false;
    let mut marker_seen = false;
    let mut remaining = limits.footer_window;
    let mut next = boundary;
    while remaining > 0 {
        let Some(line) = next.take() else {
            match lines.next_line()? {
                Some(line) => next = Some(line),
                None => break,
            }
            continue;
        };
        remaining -= 1;
        header_seen |= is_header(&line);
        marker_seen |= is_final_statistics_marker(&line);
        region.push(line);
        if marker_seen {
            break;
        }
    }

    if header_seen || marker_seen {
        tracing::debug!(header_seen, marker_seen, "tail scan reached table boundary");
    } else {
        tracing::warn!(
            footer_window = limits.footer_window,
            "no statistics header above the test rows"
        );
    }

    region.reverse();
    tests.reverse();

    let mut table = LocatedTable {
        test_rows: tests,
        totals_rows: vec![totals],
        ..Default::default()
    };
    for line in &region {
        table.push_text(line);
    }

    tracing::debug!(tests = table.test_rows.len(), "tail scan complete");
    Ok(table)
}

/// Decode one raw line, dropping the line terminator. Invalid UTF-8 is
/// replaced rather than rejected; names may be in a legacy encoding.
fn decode_line(raw: &[u8]) -> String {
    let mut end = raw.len();
    while end > 0 && matches!(raw[end - 1], b'\n' | b'\r') {
        end -= 1;
    }
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

/// Line reader that walks a seekable source from the end towards the start.
struct RevLines<R> {
    source: R,
    /// Offset of the first byte not yet read into `pending`.
    pos: u64,
    /// Bytes read but not yet returned; always a prefix of the unread lines.
    pending: Vec<u8>,
    exhausted: bool,
    len: u64,
}

impl<R: Read + Seek> RevLines<R> {
    fn new(mut source: R) -> std::io::Result<Self> {
        let len = source.seek(SeekFrom::End(0))?;
        let mut pos = len;
        // A trailing newline terminates the last line rather than starting
        // an empty one.
        if pos > 0 {
            source.seek(SeekFrom::Start(pos - 1))?;
            let mut last = [0u8; 1];
            source.read_exact(&mut last)?;
            if last[0] == b'\n' {
                pos -= 1;
            }
        }
        Ok(Self {
            source,
            pos,
            pending: Vec::new(),
            exhausted: len == 0,
            len,
        })
    }

    /// Whether the source has no bytes at all.
    fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn next_line(&mut self) -> std::io::Result<Option<String>> {
        loop {
            if let Some(idx) = self.pending.iter().rposition(|&b| b == b'\n') {
                let line = self.pending.split_off(idx + 1);
                self.pending.truncate(idx);
                return Ok(Some(decode_line(&line)));
            }
            if self.pos == 0 {
                if self.exhausted {
                    return Ok(None);
                }
                self.exhausted = true;
                let line = std::mem::take(&mut self.pending);
                return Ok(Some(decode_line(&line)));
            }

            let len = self.pos.min(TAIL_CHUNK_SIZE);
            self.pos -= len;
            self.source.seek(SeekFrom::Start(self.pos))?;
            let mut chunk = vec![0u8; len as usize];
            self.source.read_exact(&mut chunk)?;
            chunk.extend_from_slice(&self.pending);
            self.pending = chunk;
        }
    }
}
