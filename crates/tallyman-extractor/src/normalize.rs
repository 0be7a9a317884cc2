//! Display-value normalization
//!
//! Filings render numbers for people: `$ 1,234`, `(500)`, `€12.5`. These
//! helpers turn that text back into a number, and decide which texts are
//! placeholders that stand for "no value".

use std::sync::LazyLock;

use regex::Regex;

use crate::error::NumberParseError;

/// Truncated date artifact such as `--06-30`
static TRUNCATED_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^--\d{2}-\d{2}$").expect("valid truncated date regex"));

/// Decides which display texts are placeholders
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceholderPolicy {
    sentinels: Vec<String>,
}

impl PlaceholderPolicy {
    /// Policy skipping `sentinels` in addition to empty text and `--MM-DD`
    pub fn new(sentinels: &[String]) -> Self {
        Self {
            sentinels: sentinels.iter().map(|s| s.trim().to_string()).collect(),
        }
    }

    /// Whether trimmed `text` is a placeholder
    pub fn is_placeholder(&self, text: &str) -> bool {
        let text = text.trim();
        text.is_empty()
            || self.sentinels.iter().any(|s| s == text)
            || TRUNCATED_DATE.is_match(text)
    }
}

impl Default for PlaceholderPolicy {
    fn default() -> Self {
        Self::new(&crate::ExtractorConfig::default().placeholder_sentinels)
    }
}

fn is_stripped(c: char) -> bool {
    matches!(c, ',' | '$' | '€' | '£' | '¥' | '(' | ')') || c.is_whitespace()
}

/// Parse a display value into a number
///
/// Thousands separators, currency symbols and whitespace are removed. A
/// value wrapped in parentheses, or one flagged by `negative`, is negative.
pub fn parse_display_number(text: &str, negative: bool) -> Result<f64, NumberParseError> {
    let text = text.trim();
    let parenthesized = text.contains('(') && text.contains(')');

    let cleaned: String = text.chars().filter(|c| !is_stripped(*c)).collect();
    if cleaned.is_empty() {
        return Err(NumberParseError::Empty(text.to_string()));
    }
    if !cleaned
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
    {
        return Err(NumberParseError::Invalid(text.to_string()));
    }

    let value: f64 = cleaned
        .parse()
        .map_err(|_| NumberParseError::Invalid(text.to_string()))?;
    if !value.is_finite() {
        return Err(NumberParseError::NonFinite(text.to_string()));
    }

    if parenthesized || negative {
        Ok(-value.abs())
    } else {
        Ok(value)
    }
}

/// Largest scale magnitude [`apply_scale`] accepts
pub const MAX_SCALE: u32 = 308;

/// Multiply by `10^scale`
///
/// Negative scales divide, which keeps values such as `12.5` with
/// `scale="-2"` exact to the nearest representable float. Returns `None`
/// when `|scale|` exceeds [`MAX_SCALE`] or the result is not finite.
pub fn apply_scale(value: f64, scale: i32) -> Option<f64> {
    let magnitude = scale.unsigned_abs();
    if magnitude > MAX_SCALE {
        return None;
    }
    let factor = 10f64.powi(magnitude as i32);
    let scaled = if scale >= 0 { value * factor } else { value / factor };
    Some(scaled).filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_thousands_separators() {
        assert_eq!(parse_display_number("1,234,567", false), Ok(1_234_567.0));
        assert_eq!(parse_display_number(" 96,995 ", false), Ok(96_995.0));
    }

    #[test]
    fn test_parentheses_are_negative() {
        assert_eq!(parse_display_number("(500)", false), Ok(-500.0));
        assert_eq!(parse_display_number("$(1,200.50)", false), Ok(-1_200.5));
    }

    #[test]
    fn test_sign_flag() {
        assert_eq!(parse_display_number("500", true), Ok(-500.0));
        assert_eq!(parse_display_number("(500)", true), Ok(-500.0));
    }

    #[test]
    fn test_currency_symbols() {
        assert_eq!(parse_display_number("$ 12", false), Ok(12.0));
        assert_eq!(parse_display_number("€3.5", false), Ok(3.5));
        assert_eq!(parse_display_number("£7", false), Ok(7.0));
        assert_eq!(parse_display_number("¥1,000", false), Ok(1_000.0));
        assert_eq!(parse_display_number("1\u{a0}000", false), Ok(1_000.0));
    }

    #[test]
    fn test_rejections() {
        assert!(matches!(
            parse_display_number("$", false),
            Err(NumberParseError::Empty(_))
        ));
        assert!(matches!(
            parse_display_number("ten", false),
            Err(NumberParseError::Invalid(_))
        ));
        assert!(matches!(
            parse_display_number("1.2.3", false),
            Err(NumberParseError::Invalid(_))
        ));
        assert!(matches!(
            parse_display_number("1e999", false),
            Err(NumberParseError::NonFinite(_))
        ));
        assert!(parse_display_number("inf", false).is_err());
        assert!(parse_display_number("NaN", false).is_err());
    }

    #[test]
    fn test_apply_scale() {
        assert_eq!(apply_scale(1_234_567.0, 3), Some(1_234_567_000.0));
        assert_eq!(apply_scale(42.0, 0), Some(42.0));
        assert_eq!(apply_scale(1_250.0, -2), Some(12.5));
        assert_eq!(apply_scale(-3.0, 6), Some(-3_000_000.0));
    }

    #[test]
    fn test_apply_scale_out_of_range() {
        assert_eq!(apply_scale(5.0, i32::MIN), None);
        assert_eq!(apply_scale(5.0, i32::MAX), None);
        assert_eq!(apply_scale(5.0, 400), None);
        assert_eq!(apply_scale(5.0, -400), None);
        // In range, but the product overflows
        assert_eq!(apply_scale(1e10, 300), None);
        assert!(apply_scale(1.0, 308).is_some());
        assert_eq!(apply_scale(0.0, 308), Some(0.0));
    }

    #[test]
    fn test_placeholders() {
        let policy = PlaceholderPolicy::default();
        assert!(policy.is_placeholder(""));
        assert!(policy.is_placeholder("   "));
        assert!(policy.is_placeholder("—"));
        assert!(policy.is_placeholder(" -- "));
        assert!(policy.is_placeholder("â€”"));
        assert!(policy.is_placeholder("--06-30"));
        assert!(policy.is_placeholder("--12-31"));
        assert!(!policy.is_placeholder("0"));
        assert!(!policy.is_placeholder("-"));
        assert!(!policy.is_placeholder("2023-06-30"));
    }

    #[test]
    fn test_custom_sentinels() {
        let policy = PlaceholderPolicy::new(&["N/A".to_string()]);
        assert!(policy.is_placeholder("N/A"));
        assert!(!policy.is_placeholder("—"));
        assert!(policy.is_placeholder("--01-01"));
    }

    proptest! {
        #[test]
        fn prop_grouped_integers_round_trip(n in 0u64..1_000_000_000_000u64) {
            let digits = n.to_string();
            let mut grouped = String::new();
            for (i, c) in digits.chars().enumerate() {
                if i > 0 && (digits.len() - i) % 3 == 0 {
                    grouped.push(',');
                }
                grouped.push(c);
            }
            prop_assert_eq!(parse_display_number(&grouped, false), Ok(n as f64));
            if n > 0 {
                prop_assert_eq!(
                    parse_display_number(&format!("({})", grouped), false),
                    Ok(-(n as f64))
                );
            }
        }

        #[test]
        fn prop_positive_scale_multiplies(n in 0i64..1_000_000i64, scale in 0i32..7) {
            let expected = (n as f64) * 10f64.powi(scale);
            prop_assert_eq!(apply_scale(n as f64, scale), Some(expected));
        }

        #[test]
        fn prop_scale_never_panics(value in -1e12f64..1e12, scale in any::<i32>()) {
            if let Some(scaled) = apply_scale(value, scale) {
                prop_assert!(scaled.is_finite());
            }
        }

        #[test]
        fn prop_placeholders_never_parse_as_numbers(mm in 1u32..13, dd in 1u32..32) {
            let artifact = format!("--{:02}-{:02}", mm, dd);
            prop_assert!(PlaceholderPolicy::default().is_placeholder(&artifact));
        }

        #[test]
        fn prop_parse_never_panics(s in "\\PC{0,24}") {
            let _ = parse_display_number(&s, false);
        }
    }
}
