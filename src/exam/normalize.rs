//! Answer normalization and tolerance-aware equivalence.
//!
//! Model output is free text, so answers arrive in many shapes: "b, a",
//! "A;B", "22,5", "ca. 22.5 Euro". Normalization collapses these into a
//! comparable canonical form; equivalence then decides whether two
//! normalized answers mean the same thing.

use regex::Regex;
use std::collections::BTreeSet;

/// Multiple-choice answers draw from a fixed five-letter alphabet.
const CHOICE_MAX: char = 'E';

/// Canonicalize a raw answer fragment.
///
/// Priority order:
/// 1. Multiple-choice: letters A–E with only comma/semicolon/whitespace
///    between them become an uppercase, deduplicated, sorted string
///    ("b, a" → "AB").
/// 2. Numeric: the first maximal run of digits with optional comma/period
///    separators and an optional leading minus is returned verbatim; the
///    decimal separator is deliberately not translated here.
/// 3. Fallback: all non-alphanumeric characters are stripped; if nothing
///    remains, the trimmed input is returned unchanged.
///
/// Never fails, and is idempotent on its own output.
pub fn normalize_answer(raw: &str) -> String {
    let trimmed = raw.trim();

    let choice = Regex::new(r"^[,;\s]*[A-Ea-e](?:[,;\s]*[A-Ea-e])*[,;\s]*$").unwrap();
    if choice.is_match(trimmed) {
        let mut letters: Vec<char> = trimmed
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_uppercase())
            .collect();
        letters.sort_unstable();
        letters.dedup();
        return letters.into_iter().collect();
    }

    let numeric = Regex::new(r"-?\d+(?:[.,]\d+)*").unwrap();
    if let Some(m) = numeric.find(trimmed) {
        return m.as_str().to_string();
    }

    let stripped: String = trimmed.chars().filter(|c| c.is_alphanumeric()).collect();
    if stripped.is_empty() {
        trimmed.to_string()
    } else {
        stripped
    }
}

/// Decide whether two normalized answers represent the same result.
///
/// Letter sets compare order- and case-independently; numbers compare with
/// an absolute tolerance of 0.01 or a relative tolerance of 2%, whichever
/// is larger (independently computed solutions round differently).
/// Malformed numeric text falls through to case-insensitive string
/// equality instead of erroring.
pub fn answers_equivalent(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }

    if is_choice_set(a) && is_choice_set(b) {
        return letter_set(a) == letter_set(b);
    }

    if let (Some(x), Some(y)) = (parse_numeric(a), parse_numeric(b)) {
        let tolerance = (0.02 * x.abs().max(y.abs())).max(0.01);
        return (x - y).abs() <= tolerance;
    }

    a.to_lowercase() == b.to_lowercase()
}

fn is_choice_set(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| ('A'..=CHOICE_MAX).contains(&c.to_ascii_uppercase()))
}

fn letter_set(s: &str) -> BTreeSet<char> {
    s.chars().map(|c| c.to_ascii_uppercase()).collect()
}

/// Parse a numeric answer, treating a comma as the decimal separator.
fn parse_numeric(s: &str) -> Option<f64> {
    s.trim().replace(',', ".").parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choice_answers_are_sorted_deduplicated_uppercase() {
        assert_eq!(normalize_answer("b, a"), "AB");
        assert_eq!(normalize_answer("A;C;B"), "ABC");
        assert_eq!(normalize_answer("e e E"), "E");
        assert_eq!(normalize_answer("  d  "), "D");
        assert_eq!(normalize_answer("B, A,"), "AB");
    }

    #[test]
    fn numeric_answers_keep_their_separator() {
        assert_eq!(normalize_answer("22,5"), "22,5");
        assert_eq!(normalize_answer("22.5"), "22.5");
        assert_eq!(normalize_answer("-17"), "-17");
        assert_eq!(normalize_answer("ca. 1.234,56 Euro"), "1.234,56");
    }

    #[test]
    fn fallback_strips_punctuation() {
        assert_eq!(normalize_answer("richtig!"), "richtig");
        // Nothing alphanumeric left: the trimmed input survives as-is.
        assert_eq!(normalize_answer(" ??? "), "???");
    }

    #[test]
    fn normalize_is_idempotent() {
        for raw in ["b, a", "A;C;B", "22,5", "-17", "richtig!", "???", "x = 5"] {
            let once = normalize_answer(raw);
            assert_eq!(normalize_answer(&once), once, "raw: {raw:?}");
        }
    }

    #[test]
    fn letter_sets_compare_order_independent() {
        assert!(answers_equivalent("AB", "BA"));
        assert!(answers_equivalent(&normalize_answer("B,A"), &normalize_answer("AB")));
        assert!(answers_equivalent("abc", "CBA"));
        assert!(!answers_equivalent("AB", "AC"));
    }

    #[test]
    fn numeric_tolerance_is_two_percent_or_a_cent() {
        assert!(answers_equivalent("100", "101.9"));
        assert!(!answers_equivalent("100", "102.1"));
        // Comma and period decimal separators are interchangeable.
        assert!(answers_equivalent("22,5", "22.5"));
        // Tiny values fall back to the absolute tolerance.
        assert!(answers_equivalent("0.001", "0.009"));
        assert!(!answers_equivalent("10", "10.5"));
    }

    #[test]
    fn malformed_numbers_fall_back_to_string_equality() {
        // Mixed separators do not parse; comparison degrades to text.
        assert!(answers_equivalent("1.234,56", "1.234,56"));
        assert!(!answers_equivalent("1.234,56", "1.234,57"));
        assert!(answers_equivalent("Umsatzkosten", "umsatzkosten"));
        assert!(!answers_equivalent("Umsatzkosten", "Gesamtkosten"));
    }
}
