//! Label vocabulary for the provider's Spanish snapshot pages, plus the
//! case/diacritic folding used to match it.

use crate::core::Period;

/// A metric period and the provider texts that announce it.
pub struct LabelSpec {
    pub period: Period,
    /// Folded-lowercase spellings, most specific first. Accent-free forms are
    /// listed too since some pages ship with diacritics mangled.
    pub variants: &'static [&'static str],
}

/// Row labels of the cumulative-returns block on the performance tab.
pub const PERFORMANCE_LABELS: &[LabelSpec] = &[
    LabelSpec {
        period: Period::OneDay,
        variants: &["1 día", "1 dia"],
    },
    LabelSpec {
        period: Period::OneWeek,
        variants: &["1 semana"],
    },
    LabelSpec {
        period: Period::OneMonth,
        variants: &["1 mes"],
    },
    LabelSpec {
        period: Period::ThreeMonths,
        variants: &["3 meses"],
    },
    LabelSpec {
        period: Period::SixMonths,
        variants: &["6 meses"],
    },
    LabelSpec {
        period: Period::YearToDate,
        variants: &[
            "en lo que va de año",
            "en lo que va de ano",
            "año en curso",
            "ano en curso",
            "ytd",
        ],
    },
    LabelSpec {
        period: Period::OneYear,
        variants: &["1 año", "1 ano", "12 meses"],
    },
    LabelSpec {
        period: Period::ThreeYearsAnnualized,
        variants: &[
            "3 años (anualizado)",
            "3 anos (anualizado)",
            "3 años anualizado",
            "3 anos anualizado",
        ],
    },
    LabelSpec {
        period: Period::FiveYearsAnnualized,
        variants: &[
            "5 años (anualizado)",
            "5 anos (anualizado)",
            "5 años anualizado",
            "5 anos anualizado",
        ],
    },
    LabelSpec {
        period: Period::TenYearsAnnualized,
        variants: &[
            "10 años (anualizado)",
            "10 anos (anualizado)",
            "10 años anualizado",
            "10 anos anualizado",
        ],
    },
];

/// Heading that opens the cumulative-returns block.
pub const ACCUMULATED_MARKER: &str = "rentabilidades acumuladas";

/// Headings of the sections that follow the block; the first one found ends
/// the slice.
pub const ACCUMULATED_TERMINATORS: &[&str] =
    &["rentabilidades anuales", "rentabilidades trimestrales"];

/// Column headers of the ratios table mapped to their periods.
pub const RATIO_COLUMNS: &[LabelSpec] = &[
    LabelSpec {
        period: Period::OneYear,
        variants: &["1 año", "1 ano"],
    },
    LabelSpec {
        period: Period::ThreeYears,
        variants: &["3 años", "3 anos"],
    },
    LabelSpec {
        period: Period::FiveYears,
        variants: &["5 años", "5 anos"],
    },
];

/// Row keywords that identify the Sharpe ratio in the ratios table.
pub const SHARPE_KEYWORDS: &[&str] = &["sharpe"];

/// Row keywords that identify volatility in the ratios table.
pub const VOLATILITY_KEYWORDS: &[&str] = &["volatilidad", "volatility"];

/// Row keywords that identify the ongoing-charges figure on the fees tab.
pub const TER_KEYWORDS: &[&str] = &["gastos corrientes", "total expense", "ter"];

/// Unicode-lowercases for matching. Label comparison must not depend on the
/// provider's casing, and ASCII-only folding would miss `Ñ`/`Á`.
pub fn fold(s: &str) -> String {
    s.to_lowercase()
}

/// Whether already-folded text contains `word` bounded by non-alphanumerics.
/// Plain `contains` is too loose for short keywords; "ter" sits inside half
/// the Spanish words on a fees page ("cartera", "interés").
pub fn contains_word(folded: &str, word: &str) -> bool {
    let mut from = 0;
    while let Some(rel) = folded[from..].find(word) {
        let pos = from + rel;
        let before_ok = folded[..pos]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let after_ok = folded[pos + word.len()..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_alphanumeric());
        if before_ok && after_ok {
            return true;
        }
        from = pos + word.len();
    }
    false
}

/// Whether a whitespace-delimited token looks like a Spanish-formatted
/// number: an optional sign (ASCII or the typographic minus variants the
/// provider emits), then digits with `.`/`,` separators and an optional `%`.
pub fn numeric_shaped(token: &str) -> bool {
    let body = token
        .strip_prefix(['+', '-', '\u{2212}', '\u{2013}'])
        .unwrap_or(token);
    !body.is_empty()
        && body.chars().any(|c| c.is_ascii_digit())
        && body
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.' || c == ',' || c == '%')
}
