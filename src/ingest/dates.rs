//! Flexible date parsing for CSV rows.
//!
//! Tries an ordered list of explicit formats (ISO first, then US and
//! European slash/dash forms, month-name forms, and 2-digit-year
//! variants), then falls back to a light normalization pass (collapsed
//! whitespace, stripped ordinal suffixes) over the same table.

use chrono::{Datelike, NaiveDate};

/// Candidate formats, most specific/common first. Order matters for the
/// ambiguous slash forms: US month-first wins over day-first.
const FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d %Y",
    "%m/%d/%y",
    "%d/%m/%y",
    "%m-%d-%y",
    "%d-%m-%y",
];

/// Parse a date from free-form user input. Returns None when nothing in
/// the format table matches.
pub fn parse_flexible(input: &str) -> Option<NaiveDate> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(date) = try_formats(trimmed) {
        return Some(date);
    }

    // Free-form fallback: collapse whitespace and strip ordinal suffixes
    // ("Mar 3rd, 2026" → "Mar 3, 2026"), then retry.
    let normalized = normalize(trimmed);
    if normalized != trimmed {
        return try_formats(&normalized);
    }

    None
}

fn try_formats(s: &str) -> Option<NaiveDate> {
    for fmt in FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            // %Y accepts bare 2-digit years ("15-03-26" as year 15); skip
            // such matches so the 2-digit-year formats get their turn.
            if date.year() >= 1970 {
                return Some(date);
            }
        }
    }
    None
}

fn normalize(s: &str) -> String {
    let collapsed = s.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut out = String::with_capacity(collapsed.len());
    let mut chars = collapsed.chars().peekable();
    let mut prev_digit = false;
    while let Some(c) = chars.next() {
        if prev_digit && c.is_ascii_alphabetic() {
            // Possible ordinal suffix directly after a digit.
            let mut suffix = String::from(c);
            while let Some(&n) = chars.peek() {
                if n.is_ascii_alphabetic() {
                    suffix.push(n);
                    chars.next();
                } else {
                    break;
                }
            }
            match suffix.to_lowercase().as_str() {
                "st" | "nd" | "rd" | "th" => {}
                _ => out.push_str(&suffix),
            }
            prev_digit = false;
            continue;
        }
        prev_digit = c.is_ascii_digit();
        out.push(c);
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_iso_format() {
        assert_eq!(parse_flexible("2026-03-15"), Some(d("2026-03-15")));
    }

    #[test]
    fn test_us_slash_wins_ambiguity() {
        // 03/04/2026 is ambiguous; the US form is tried first.
        assert_eq!(parse_flexible("03/04/2026"), Some(d("2026-03-04")));
    }

    #[test]
    fn test_european_slash_when_us_impossible() {
        // 25/03/2026 cannot be month-first, so day-first applies.
        assert_eq!(parse_flexible("25/03/2026"), Some(d("2026-03-25")));
    }

    #[test]
    fn test_dash_forms() {
        assert_eq!(parse_flexible("03-15-2026"), Some(d("2026-03-15")));
        assert_eq!(parse_flexible("15-03-2026"), Some(d("2026-03-15")));
    }

    #[test]
    fn test_month_name_forms() {
        assert_eq!(parse_flexible("Mar 15, 2026"), Some(d("2026-03-15")));
        assert_eq!(parse_flexible("March 15, 2026"), Some(d("2026-03-15")));
        assert_eq!(parse_flexible("15 Mar 2026"), Some(d("2026-03-15")));
        assert_eq!(parse_flexible("Mar 15 2026"), Some(d("2026-03-15")));
    }

    #[test]
    fn test_two_digit_years() {
        assert_eq!(parse_flexible("03/15/26"), Some(d("2026-03-15")));
        assert_eq!(parse_flexible("15-03-26"), Some(d("2026-03-15")));
    }

    #[test]
    fn test_ordinal_suffix_fallback() {
        assert_eq!(parse_flexible("Mar 3rd, 2026"), Some(d("2026-03-03")));
        assert_eq!(parse_flexible("March  1st,  2026"), Some(d("2026-03-01")));
    }

    #[test]
    fn test_garbage_rejected() {
        assert_eq!(parse_flexible("yesterday"), None);
        assert_eq!(parse_flexible("2026-13-45"), None);
        assert_eq!(parse_flexible(""), None);
    }
}
