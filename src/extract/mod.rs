//! Turns provider page HTML into metric records.
//!
//! Split by page shape: [`performance`] works on flattened text because that
//! tab's markup churns, [`table`] walks the stabler ratio and fee tables.

pub mod html;
pub mod labels;
pub mod performance;
pub mod table;

pub use html::normalize_html;
pub use performance::extract_performance;
pub use table::{extract_ratios, extract_ter};
