//! Structured fields from result-document text.
//!
//! Each pattern takes its first match only. Documents listing several
//! subjects yield the first subject line.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Lowest score that counts as a pass.
pub const PASSING_SCORE: f64 = 70.0;

/// `<subject name> (<CODE>) = <score>`
#[allow(clippy::expect_used)]
static SUBJECT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\w[\w \-]*?)\s*\(([A-Z0-9]+)\)\s*=\s*(\d+(?:[.,]\d+)?)")
        .expect("subject regex must compile")
});

/// `Periode <roman numeral> Tahun <year>`
#[allow(clippy::expect_used)]
static PERIOD_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Periode\s+([IVXLCDM]+)\s+Tahun\s+(\d{4})").expect("period regex must compile")
});

/// Facts extracted from one result document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamResult {
    /// Full extracted text.
    pub raw_text: String,
    /// Subject name, e.g. `CF2-Probabilitas dan Statistika`.
    pub subject: Option<String>,
    /// Subject code, e.g. `CF2`.
    pub subject_code: Option<String>,
    /// Numeric score.
    pub score: Option<f64>,
    /// `score >= 70.0`, when a score was found.
    pub passed: Option<bool>,
    /// Normalized exam period, e.g. `Periode III 2025`.
    pub period: Option<String>,
}

/// Extracts subject, score and period from document text.
///
/// Never fails: missing patterns leave their fields `None`.
///
/// ```
/// use examwatch_core::document::extract_result;
///
/// let result = extract_result("CF2-Probabilitas dan Statistika (CF2) = 70.00\nPeriode III Tahun 2025");
/// assert_eq!(result.subject_code.as_deref(), Some("CF2"));
/// assert_eq!(result.passed, Some(true));
/// assert_eq!(result.period.as_deref(), Some("Periode III 2025"));
/// ```
#[must_use]
pub fn extract_result(text: &str) -> ExamResult {
    let mut result = ExamResult {
        raw_text: text.to_string(),
        subject: None,
        subject_code: None,
        score: None,
        passed: None,
        period: None,
    };

    if let Some(caps) = SUBJECT_REGEX.captures(text) {
        result.subject = caps
            .get(1)
            .map(|m| m.as_str().trim().to_string())
            .filter(|name| !name.is_empty());
        result.subject_code = caps.get(2).map(|m| m.as_str().to_string());
        result.score = caps.get(3).and_then(|m| parse_score(m.as_str()));
    }
    result.passed = result.score.map(|score| score >= PASSING_SCORE);

    if let Some(caps) = PERIOD_REGEX.captures(text) {
        result.period = Some(format!("Periode {} {}", &caps[1], &caps[2]));
    }

    result
}

fn parse_score(raw: &str) -> Option<f64> {
    raw.replace(',', ".").parse().ok()
}
