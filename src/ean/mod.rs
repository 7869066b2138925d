// src/ean/mod.rs

use once_cell::sync::Lazy;
use regex::Regex;

/// Length of an EAN-13 / GTIN-13 code.
pub const EAN13_LEN: usize = 13;

// Maximal runs of ASCII digits; length is filtered afterwards so that a
// 14-digit run never yields a 13-digit substring.
static DIGIT_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]+").expect("digit run pattern should compile"));

/// Keep only the ASCII digits of `raw`.
pub fn normalize(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// GS1 check digit for the first 12 digits of `digits`.
fn check_digit(digits: &[u32]) -> u32 {
    let sum: u32 = digits
        .iter()
        .take(EAN13_LEN - 1)
        .enumerate()
        .map(|(i, d)| if i % 2 == 0 { *d } else { d * 3 })
        .sum();
    (10 - sum % 10) % 10
}

/// True iff `code`, stripped of non-digits, is 13 digits with a correct EAN-13 check digit.
pub fn checksum_valid(code: &str) -> bool {
    let s = normalize(code);
    if s.len() != EAN13_LEN {
        return false;
    }
    let digits: Vec<u32> = s.chars().filter_map(|c| c.to_digit(10)).collect();
    check_digit(&digits) == digits[EAN13_LEN - 1]
}

/// All exact 13-digit tokens in `text`, left to right. Checksums are not checked.
pub fn candidates(text: &str) -> impl Iterator<Item = &str> {
    DIGIT_RUN
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|run| run.len() == EAN13_LEN)
}

/// First checksum-valid 13-digit token in `text`, if any.
pub fn extract_first_valid(text: &str) -> Option<String> {
    if text.is_empty() {
        return None;
    }
    candidates(text)
        .find(|c| checksum_valid(c))
        .map(str::to_string)
}
