//! Metric periods, values and Spanish-locale number parsing

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

/// A named historical window a metric is reported for.
///
/// Declaration order is canonical: `BTreeMap` keys serialize in this order,
/// which fixes the key order of every record in the payload. Performance
/// records use the plain windows plus the annualized tail; Sharpe and
/// volatility records use the `1Y`/`3Y`/`5Y` ratio windows.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize,
)]
pub enum Period {
    #[serde(rename = "1D")]
    OneDay,
    #[serde(rename = "1W")]
    OneWeek,
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "6M")]
    SixMonths,
    #[serde(rename = "YTD")]
    YearToDate,
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "3Y")]
    ThreeYears,
    #[serde(rename = "5Y")]
    FiveYears,
    #[serde(rename = "3Y Anual")]
    ThreeYearsAnnualized,
    #[serde(rename = "5Y Anual")]
    FiveYearsAnnualized,
    #[serde(rename = "10Y Anual")]
    TenYearsAnnualized,
}

impl Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Period::OneDay => "1D",
                Period::OneWeek => "1W",
                Period::OneMonth => "1M",
                Period::ThreeMonths => "3M",
                Period::SixMonths => "6M",
                Period::YearToDate => "YTD",
                Period::OneYear => "1Y",
                Period::ThreeYears => "3Y",
                Period::FiveYears => "5Y",
                Period::ThreeYearsAnnualized => "3Y Anual",
                Period::FiveYearsAnnualized => "5Y Anual",
                Period::TenYearsAnnualized => "10Y Anual",
            }
        )
    }
}

/// A single extracted metric: a finite number, or text kept verbatim.
///
/// The `"-"` placeholder for "no data" is `Text("-")`. Non-finite numbers are
/// unrepresentable; construct numbers through [`MetricValue::finite`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
}

impl MetricValue {
    /// Wraps a float, rejecting NaN and infinities.
    pub fn finite(value: f64) -> Option<Self> {
        value.is_finite().then_some(MetricValue::Number(value))
    }

    /// The "no data" placeholder.
    pub fn placeholder() -> Self {
        MetricValue::Text("-".to_string())
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, MetricValue::Text(t) if t == "-")
    }
}

impl Display for MetricValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricValue::Number(n) => write!(f, "{n}"),
            MetricValue::Text(t) => write!(f, "{t}"),
        }
    }
}

/// Ordered period → value mapping. Keys are optional; absence means the
/// source page did not publish that window.
pub type MetricRecord = BTreeMap<Period, MetricValue>;

/// Parses a number written with the Spanish convention: `.` separates
/// thousands, `,` marks the decimal. Accepts the U+2212 minus and U+2013 dash
/// glyphs some pages emit for negative values, and a trailing `%`.
///
/// Returns `None` for anything that does not resolve to a finite float.
pub fn parse_decimal_es(raw: &str) -> Option<f64> {
    let trimmed = raw.trim().trim_end_matches('%').trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut normalized = String::with_capacity(trimmed.len());
    for (i, ch) in trimmed.chars().enumerate() {
        match ch {
            '\u{2212}' | '\u{2013}' if i == 0 => normalized.push('-'),
            '.' => {} // thousands separator
            ',' => normalized.push('.'),
            _ => normalized.push(ch),
        }
    }

    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_serializes_as_label() {
        let json = serde_json::to_string(&Period::ThreeYearsAnnualized).unwrap();
        assert_eq!(json, r#""3Y Anual""#);
        let back: Period = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Period::ThreeYearsAnnualized);
    }

    #[test]
    fn test_record_preserves_canonical_order() {
        let mut record = MetricRecord::new();
        record.insert(Period::TenYearsAnnualized, MetricValue::Number(1.0));
        record.insert(Period::OneDay, MetricValue::Number(2.0));
        record.insert(Period::YearToDate, MetricValue::Number(3.0));

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"1D":2.0,"YTD":3.0,"10Y Anual":1.0}"#);
    }

    #[test]
    fn test_metric_value_untagged_roundtrip() {
        let num = MetricValue::Number(9.8);
        let text = MetricValue::Text("1,25 %".to_string());

        let num_json = serde_json::to_string(&num).unwrap();
        let text_json = serde_json::to_string(&text).unwrap();
        assert_eq!(num_json, "9.8");
        assert_eq!(text_json, r#""1,25 %""#);

        assert_eq!(serde_json::from_str::<MetricValue>(&num_json).unwrap(), num);
        assert_eq!(
            serde_json::from_str::<MetricValue>(&text_json).unwrap(),
            text
        );
    }

    #[test]
    fn test_finite_rejects_nan_and_infinity() {
        assert!(MetricValue::finite(9.8).is_some());
        assert!(MetricValue::finite(f64::NAN).is_none());
        assert!(MetricValue::finite(f64::INFINITY).is_none());
        assert!(MetricValue::finite(f64::NEG_INFINITY).is_none());
    }

    #[test]
    fn test_parse_decimal_es() {
        assert_eq!(parse_decimal_es("9,80"), Some(9.8));
        assert_eq!(parse_decimal_es("-1,23"), Some(-1.23));
        assert_eq!(parse_decimal_es("1.234,56"), Some(1234.56));
        assert_eq!(parse_decimal_es("12"), Some(12.0));
        assert_eq!(parse_decimal_es("0,85"), Some(0.85));
    }

    #[test]
    fn test_parse_decimal_es_signs_and_percent() {
        // U+2212 minus sign and U+2013 en dash both act as a leading minus
        assert_eq!(parse_decimal_es("\u{2212}0,5"), Some(-0.5));
        assert_eq!(parse_decimal_es("\u{2013}2,10"), Some(-2.1));
        assert_eq!(parse_decimal_es("+3,4"), Some(3.4));
        assert_eq!(parse_decimal_es("1,25 %"), Some(1.25));
        assert_eq!(parse_decimal_es("12%"), Some(12.0));
    }

    #[test]
    fn test_parse_decimal_es_rejects_garbage() {
        assert_eq!(parse_decimal_es(""), None);
        assert_eq!(parse_decimal_es("-"), None);
        assert_eq!(parse_decimal_es("n.d."), None);
        assert_eq!(parse_decimal_es("1,2,3"), None);
        assert_eq!(parse_decimal_es("abc"), None);
        assert_eq!(parse_decimal_es("NaN"), None);
    }
}
