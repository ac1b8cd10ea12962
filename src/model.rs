/// Parsed statistics: one record per test row plus the totals row.
///
/// Rows come in two shapes. Basic rows carry only the leading timing fields,
/// extended rows add response size and connection timings. The shape is kept
/// as a variant so an absent metric never reads back as zero.
use serde::Serialize;

/// Every metric a statistics row can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    TestCount,
    ErrorCount,
    MeanTestTime,
    StdDev,
    Tps,
    MeanRespLength,
    RespBytesPerSecond,
    RespErrorCount,
    ResolveHostMeanTime,
    EstablishConnMeanTime,
    FirstByteMeanTime,
}

impl Metric {
    pub const ALL: [Metric; 11] = [
        Metric::TestCount,
        Metric::ErrorCount,
        Metric::MeanTestTime,
        Metric::StdDev,
        Metric::Tps,
        Metric::MeanRespLength,
        Metric::RespBytesPerSecond,
        Metric::RespErrorCount,
        Metric::ResolveHostMeanTime,
        Metric::EstablishConnMeanTime,
        Metric::FirstByteMeanTime,
    ];

    /// Human-readable label, as used for chart series and text output.
    pub fn label(self) -> &'static str {
        match self {
            Metric::TestCount => "Test Count",
            Metric::ErrorCount => "Error Count",
            Metric::MeanTestTime => "Mean Test Time",
            Metric::StdDev => "Test Time Standard Deviation",
            Metric::Tps => "TPS",
            Metric::MeanRespLength => "Mean Response Length",
            Metric::RespBytesPerSecond => "Response Bytes Per Second",
            Metric::RespErrorCount => "Response Error Count",
            Metric::ResolveHostMeanTime => "Resolve Host Mean Time",
            Metric::EstablishConnMeanTime => "Establish Connection Mean Time",
            Metric::FirstByteMeanTime => "First Byte Mean Time",
        }
    }

    /// Look a metric up by its label.
    pub fn from_label(label: &str) -> Option<Metric> {
        Metric::ALL.into_iter().find(|m| m.label() == label)
    }

    /// Metrics only present on extended rows.
    pub fn is_extended(self) -> bool {
        matches!(
            self,
            Metric::MeanRespLength
                | Metric::RespBytesPerSecond
                | Metric::RespErrorCount
                | Metric::ResolveHostMeanTime
                | Metric::EstablishConnMeanTime
                | Metric::FirstByteMeanTime
        )
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A single metric value. Counts stay integral.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Count(u64),
    Value(f64),
}

impl MetricValue {
    pub fn as_f64(self) -> f64 {
        match self {
            MetricValue::Count(n) => n as f64,
            MetricValue::Value(v) => v,
        }
    }
}

impl std::fmt::Display for MetricValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricValue::Count(n) => write!(f, "{n}"),
            MetricValue::Value(v) => write!(f, "{v:.2}"),
        }
    }
}

/// Response and connection metrics reported by extended rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtendedMetrics {
    pub mean_resp_length: f64,
    /// `?` in the report (undefined rate) decodes to 0.0.
    pub resp_bytes_per_second: f64,
    pub resp_error_count: u64,
    /// `-` in the report (no lookup happened) decodes to 0.0.
    pub resolve_host_mean_time: f64,
    pub establish_conn_mean_time: f64,
    pub first_byte_mean_time: f64,
}

/// Row shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum RowFormat {
    Basic,
    Extended(ExtendedMetrics),
}

/// One decoded statistics row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestRecord {
    pub id: String,
    /// Test description; always empty for the totals row.
    pub name: String,
    pub test_count: u64,
    pub error_count: u64,
    pub mean_test_time: f64,
    pub std_dev: f64,
    /// Present on every row iff the report has a TPS column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tps: Option<f64>,
    #[serde(flatten)]
    pub format: RowFormat,
}

impl TestRecord {
    /// Extended metrics, if this row carried them.
    pub fn extended(&self) -> Option<&ExtendedMetrics> {
        match &self.format {
            RowFormat::Extended(ext) => Some(ext),
            RowFormat::Basic => None,
        }
    }

    pub fn is_extended(&self) -> bool {
        self.extended().is_some()
    }

    /// Enum-indexed metric access. `None` means the row never reported it.
    pub fn metric(&self, metric: Metric) -> Option<MetricValue> {
        use MetricValue::{Count, Value};
        match metric {
            Metric::TestCount => Some(Count(self.test_count)),
            Metric::ErrorCount => Some(Count(self.error_count)),
            Metric::MeanTestTime => Some(Value(self.mean_test_time)),
            Metric::StdDev => Some(Value(self.std_dev)),
            Metric::Tps => self.tps.map(Value),
            Metric::MeanRespLength => self.extended().map(|e| Value(e.mean_resp_length)),
            Metric::RespBytesPerSecond => self.extended().map(|e| Value(e.resp_bytes_per_second)),
            Metric::RespErrorCount => self.extended().map(|e| Count(e.resp_error_count)),
            Metric::ResolveHostMeanTime => {
                self.extended().map(|e| Value(e.resolve_host_mean_time))
            }
            Metric::EstablishConnMeanTime => {
                self.extended().map(|e| Value(e.establish_conn_mean_time))
            }
            Metric::FirstByteMeanTime => self.extended().map(|e| Value(e.first_byte_mean_time)),
        }
    }

    /// All metrics this row reports, in canonical order.
    pub fn metrics(&self) -> impl Iterator<Item = (Metric, MetricValue)> + '_ {
        Metric::ALL
            .into_iter()
            .filter_map(move |m| self.metric(m).map(|v| (m, v)))
    }
}

/// The outcome of one successful parse.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseResult {
    tests: Vec<TestRecord>,
    totals: TestRecord,
}

impl ParseResult {
    pub(crate) fn new(tests: Vec<TestRecord>, totals: TestRecord) -> Self {
        Self { tests, totals }
    }

    /// Test rows, in report order.
    pub fn tests(&self) -> &[TestRecord] {
        &self.tests
    }

    pub fn totals(&self) -> &TestRecord {
        &self.totals
    }

    /// Find a test row by id (e.g. `"Test 101"`).
    pub fn test(&self, id: &str) -> Option<&TestRecord> {
        self.tests.iter().find(|t| t.id == id)
    }

    /// Give up the records.
    pub fn into_parts(self) -> (Vec<TestRecord>, TestRecord) {
        (self.tests, self.totals)
    }
}
