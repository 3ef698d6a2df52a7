//! Core domain types shared across extraction, fetching and serving

pub mod log;
pub mod metrics;
pub mod snapshot;

// Re-export main types for cleaner imports
pub use metrics::{MetricRecord, MetricValue, Period, parse_decimal_es};
pub use snapshot::{ExtractionFailure, ExtractionTrace, FundSnapshot, LabelMatch, Payload};
