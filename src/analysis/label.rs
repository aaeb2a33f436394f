//! Label validation
//!
//! Decides whether a recognized string is a label of the selected template
//! type and whether its numeric value lies inside the accept range.
//!
//! Polyboard labels are the human-readable line under a Code 39 style barcode,
//! e.g. `*102*` or `X102*`: the leading glyph is a fixed prefix and `*` marks
//! the barcode start/stop. ABF labels are plain numbers.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Prefix glyph, digits, optional trailing stop marker
static POLYBOARD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z*][0-9]+\*?$").expect("static regex"));
static ABF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{1,12}$").expect("static regex"));

/// Label layout variant selected before scanning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TemplateType {
    Polyboard,
    Abf,
}

impl std::fmt::Display for TemplateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateType::Polyboard => write!(f, "Polyboard"),
            TemplateType::Abf => write!(f, "ABF"),
        }
    }
}

/// Inclusive bounds a label's value must satisfy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptRange {
    pub start: i64,
    pub end: i64,
}

impl AcceptRange {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, value: i64) -> bool {
        self.start <= value && value <= self.end
    }
}

/// Whether the trimmed text has the shape of a label of this type
pub fn matches_pattern(raw: &str, template: TemplateType) -> bool {
    let trimmed = raw.trim();
    match template {
        TemplateType::Polyboard => POLYBOARD_RE.is_match(trimmed),
        TemplateType::Abf => ABF_RE.is_match(trimmed),
    }
}

/// Reduce a recognized string to the value that gets range-checked and stored.
///
/// Returns `None` when nothing is left, so a lone prefix glyph never becomes
/// a value.
pub fn normalize(raw: &str, template: TemplateType) -> Option<String> {
    let trimmed = raw.trim();
    let value: String = match template {
        TemplateType::Polyboard => {
            let mut chars = trimmed.chars();
            chars.next()?;
            chars.filter(|c| *c != '*').collect()
        }
        TemplateType::Abf => trimmed.to_string(),
    };

    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Parse `value` as a base-10 integer and check it against the range.
/// Unparseable input is never in range.
pub fn is_within_range(value: &str, range: &AcceptRange) -> bool {
    value
        .parse::<i64>()
        .map(|n| range.contains(n))
        .unwrap_or(false)
}

/// Validator bound to the template and range of one scan session
#[derive(Debug, Clone, Copy)]
pub struct LabelValidator {
    template: TemplateType,
    range: AcceptRange,
}

impl LabelValidator {
    pub fn new(template: TemplateType, range: AcceptRange) -> Self {
        Self { template, range }
    }

    pub fn matches_pattern(&self, raw: &str) -> bool {
        matches_pattern(raw, self.template)
    }

    /// Canonical value of `raw` if it is in range; pattern is not checked.
    ///
    /// Leading zeros are dropped so that `X0102*` and `X102*` yield the same value.
    pub fn in_range_value(&self, raw: &str) -> Option<String> {
        let value = normalize(raw, self.template)?;
        if !is_within_range(&value, &self.range) {
            return None;
        }
        value.parse::<i64>().ok().map(|n| n.to_string())
    }

    /// Normalized value of `raw` if it passes both the pattern and range checks
    pub fn accept(&self, raw: &str) -> Option<String> {
        if !self.matches_pattern(raw) {
            return None;
        }
        self.in_range_value(raw)
    }

    pub fn is_valid_label(&self, raw: &str) -> bool {
        self.accept(raw).is_some()
    }
}
