//! Parser for the final statistics table of Grinder load-test out logs.
//!
//! ```no_run
//! use grinder_stats::{parse_file, ScanConfig};
//!
//! let result = parse_file("out_grinder-0.log".as_ref(), &ScanConfig::default())?;
//! for test in result.tests() {
//!     println!("{test}");
//! }
//! # Ok::<(), grinder_stats::ReportError>(())
//! ```

pub mod config;
pub mod decoder;
pub mod error;
pub mod layout;
pub mod model;
pub mod reader;
pub mod scanner;
pub mod source;
pub mod summary;

pub use config::{load_config, ScanConfig, ScanMode, StatsConfig};
pub use error::ReportError;
pub use model::{ExtendedMetrics, Metric, MetricValue, ParseResult, RowFormat, TestRecord};
pub use reader::{parse_file, parse_reader, parse_str, parse_tail};
pub use scanner::TailLimits;
