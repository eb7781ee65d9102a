//! Load-time normalization of the managed columns.
//!
//! Blank cells, and the two spellings a dataframe export writes for a missing value,
//! become absent cells once here, so the rest of the crate only sees present text or
//! `None`. Words like `NA` or `None` are ordinary text.

use crate::config::LabelSet;

/// Tokens (exact, after trimming) that mean "no value".
const MISSING_TOKENS: &[&str] = &["nan", "<NA>"];

/// Check if a cell text stands for a missing value.
pub fn is_missing_token(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || MISSING_TOKENS.contains(&trimmed)
}

/// Normalize an annotation cell. Exact vocabulary labels are always kept.
pub fn normalize_annotation(value: Option<String>, labels: Option<&LabelSet>) -> Option<String> {
    let value = value?;
    if labels.is_some_and(|l| l.contains(&value)) {
        return Some(value);
    }
    if is_missing_token(&value) {
        None
    } else {
        Some(value)
    }
}

/// Normalize a note cell.
pub fn normalize_note(value: Option<String>) -> Option<String> {
    value.filter(|v| !is_missing_token(v))
}

/// Interpret a skip cell. Anything unrecognized means "not skipped".
pub fn parse_skip_flag(value: Option<&str>) -> bool {
    let Some(value) = value else {
        return false;
    };
    let trimmed = value.trim();

    if trimmed.eq_ignore_ascii_case("true") || trimmed.eq_ignore_ascii_case("yes") {
        return true;
    }

    match trimmed.parse::<f64>() {
        Ok(n) => n.is_finite() && n != 0.0,
        Err(_) => false,
    }
}

/// Cell text for a skip flag.
pub fn skip_flag_text(skipped: bool) -> &'static str {
    if skipped { "1" } else { "0" }
}
