/// Report-wide column layout, detected once from the located table text.
///
/// Only the TPS column is decided here. Whether a row carries the extended
/// response metrics is decided row by row in the decoder, since a report may
/// mix both shapes.
const TPS_MARKER: &str = " TPS ";

/// Optional columns present in a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColumnLayout {
    pub has_tps: bool,
}

impl ColumnLayout {
    /// Inspect the located table text.
    pub fn detect(table: &str) -> Self {
        let layout = Self {
            has_tps: table.contains(TPS_MARKER),
        };
        tracing::debug!(has_tps = layout.has_tps, "detected column layout");
        layout
    }
}
