//! Snapshot and payload types, the externally visible unit of truth

use crate::core::metrics::MetricRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why an extraction attempt produced zero values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionFailure {
    EmptyHtml,
    EmptyText,
    BlockNotFound,
    ValuesNotFound,
}

/// One successful label capture: which canonical label matched, through which
/// localized variant, and the raw token found next to it. The token may still
/// fail numeric conversion, in which case the period is absent from the
/// record while its raw text survives here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelMatch {
    pub label: String,
    pub variant: String,
    pub raw: String,
}

/// Diagnostics for one extraction attempt. Always produced, never an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionTrace {
    pub matched: Vec<LabelMatch>,
    pub unmatched: Vec<String>,
    /// Whether the cumulative-performance marker was found. `false` means the
    /// whole text was scanned instead (degraded precision).
    pub block_found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<ExtractionFailure>,
    /// Transport failures recorded by the orchestrator, one per failed view.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractionTrace {
    /// Trace for an entry whose pages never arrived.
    pub fn from_error(message: impl Into<String>) -> Self {
        ExtractionTrace {
            error: Some(message.into()),
            ..ExtractionTrace::default()
        }
    }

    /// Appends a view-level failure, keeping earlier ones.
    pub fn record_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        match &mut self.error {
            Some(existing) => {
                existing.push_str("; ");
                existing.push_str(&message);
            }
            None => self.error = Some(message),
        }
    }
}

/// Everything known about one fund or plan as of one rebuild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundSnapshot {
    pub id: String,
    pub name: String,
    pub isin: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub performance: MetricRecord,
    pub sharpe: MetricRecord,
    pub volatility: MetricRecord,
    pub ter: String,
    pub source_url: String,
    pub debug: ExtractionTrace,
}

/// The complete servable dataset, replaced wholesale on every rebuild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payload {
    pub last_updated: DateTime<Utc>,
    pub funds: Vec<FundSnapshot>,
    pub plans: Vec<FundSnapshot>,
}

impl Payload {
    /// Freshness is calendar-date granularity: a payload built at 23:59 UTC
    /// goes stale one minute later.
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        self.last_updated.date_naive() == now.date_naive()
    }
}
