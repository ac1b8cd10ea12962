/// Text rendering of a parsed report, and per-metric series for charts.
use crate::model::{Metric, ParseResult, TestRecord};

/// `(test id, value)` pairs for one metric across all test rows, in report
/// order. Rows that never reported the metric are left out.
pub fn series(result: &ParseResult, metric: Metric) -> Vec<(&str, f64)> {
    result
        .tests()
        .iter()
        .filter_map(|t| t.metric(metric).map(|v| (t.id.as_str(), v.as_f64())))
        .collect()
}

/// Like [`series`], but looks the metric up by its display label.
pub fn series_by_label<'a>(result: &'a ParseResult, label: &str) -> Option<Vec<(&'a str, f64)>> {
    Metric::from_label(label).map(|m| series(result, m))
}

impl std::fmt::Display for TestRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} tests, {} errors, mean {:.2} ms (sd {:.2})",
            self.id, self.test_count, self.error_count, self.mean_test_time, self.std_dev
        )?;
        if let Some(tps) = self.tps {
            write!(f, ", {tps:.2} TPS")?;
        }
        if let Some(ext) = self.extended() {
            write!(
                f,
                ", {:.0} bytes, first byte {:.2} ms",
                ext.mean_resp_length, ext.first_byte_mean_time
            )?;
        }
        if !self.name.is_empty() {
            write!(f, " \"{}\"", self.name)?;
        }
        Ok(())
    }
}

impl std::fmt::Display for ParseResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for test in self.tests() {
            writeln!(f, "{test}")?;
        }
        write!(f, "{}", self.totals())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::parse_str;

    const TPS_MIXED: &str = include_str!("../testdata/out_tps_mixed.log");

    #[test]
    fn test_series_skips_absent() {
        let result = parse_str(TPS_MIXED).unwrap();
        let lengths = series(&result, Metric::MeanRespLength);
        assert_eq!(lengths, vec![("Test 1", 30152.0), ("Test 2", 29175.0)]);

        let times = series(&result, Metric::MeanTestTime);
        assert_eq!(times.len(), 3);
        assert_eq!(times[2], ("Test 3", 2415.85));
    }

    #[test]
    fn test_series_by_label() {
        let result = parse_str(TPS_MIXED).unwrap();
        let sd = series_by_label(&result, "Test Time Standard Deviation").unwrap();
        assert_eq!(sd[0], ("Test 1", 453.3));
        assert!(series_by_label(&result, "Latency").is_none());
    }

    #[test]
    fn test_display() {
        let result = parse_str(TPS_MIXED).unwrap();
        let text = result.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            "Test 1: 100 tests, 0 errors, mean 698.49 ms (sd 453.30), 0.25 TPS, 30152 bytes, first byte 344.75 ms \"Frontpage\""
        );
        assert_eq!(
            lines[2],
            "Test 3: 100 tests, 1 errors, mean 2415.85 ms (sd 711.18), 0.25 TPS \"Search flow\""
        );
        assert!(lines[3].starts_with("Totals: 300 tests"));
        assert!(!lines[3].contains('"'));
    }
}
