//! Label and number formatting shared by every chart family.
//!
//! Axis ticks, tooltips and legends all go through the same
//! [`ValueFormatter`], so a chart never mixes rounding rules between its
//! ticks and its tooltips.

use serde::{Deserialize, Serialize};

/// Rounding applied to thousands in compact labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingRule {
    /// `2000 -> "2k"`, `1500 -> "1.5k"`, `12000 -> "12.0k"`: whole thousands
    /// below ten thousand drop the decimal.
    #[default]
    TrimWholeThousands,
    /// Always one decimal: `2000 -> "2.0k"`.
    OneDecimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValueFormatter {
    rule: RoundingRule,
}

impl ValueFormatter {
    pub fn new(rule: RoundingRule) -> Self {
        Self { rule }
    }

    pub fn rule(&self) -> RoundingRule {
        self.rule
    }

    /// Compact label with `M`/`k` suffixes.
    pub fn compact(&self, value: f64) -> String {
        let magnitude = value.abs();
        if magnitude >= 1_000_000.0 {
            format!("{}M", to_fixed(value / 1_000_000.0, 1))
        } else if magnitude >= 1000.0 {
            let digits = match self.rule {
                RoundingRule::TrimWholeThousands if value % 1000.0 == 0.0 && magnitude < 10_000.0 => 0,
                _ => 1,
            };
            format!("{}k", to_fixed(value / 1000.0, digits))
        } else {
            format_plain(value)
        }
    }
}

/// Canonical compact formatter.
pub fn format_compact_number(value: f64) -> String {
    ValueFormatter::default().compact(value)
}

/// Shortest round-trip rendering: `100.0 -> "100"`, `2.5 -> "2.5"`.
pub fn format_plain(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    // -0 prints as 0
    format!("{}", value + 0.0)
}

/// Fixed-point rendering that rounds ties away from zero.
pub fn to_fixed(value: f64, digits: usize) -> String {
    if !value.is_finite() {
        return format_plain(value);
    }
    let factor = 10f64.powi(digits as i32);
    let rounded = (value.abs() * factor).round() / factor;
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{:.*}", sign, digits, rounded)
}

/// Thousands-grouped rendering with at most `max_fraction` and at least
/// `min_fraction` fraction digits: `1234.5 -> "1,234.5"`.
pub fn format_grouped(value: f64, min_fraction: usize, max_fraction: usize) -> String {
    if !value.is_finite() {
        return format_plain(value);
    }
    let fixed = to_fixed(value, max_fraction);
    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));

    let mut frac = frac_part.trim_end_matches('0').to_string();
    while frac.len() < min_fraction {
        frac.push('0');
    }

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    // "-0" after rounding is just "0"
    let sign = if grouped.chars().all(|c| c == '0' || c == ',') && frac.chars().all(|c| c == '0') {
        ""
    } else {
        sign
    };

    if frac.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{}", sign, grouped, frac)
    }
}

/// Uppercase only the first character.
pub fn capitalize_label(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// First character uppercase, the rest lowercase: `"UAE" -> "Uae"`.
pub fn sentence_case_label(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Cut to `max_len` characters including the ellipsis. When the ellipsis
/// alone would not fit, the text is cut to `max_len` with no ellipsis.
pub fn truncate_label(text: &str, max_len: usize, ellipsis: &str) -> String {
    let len = text.chars().count();
    if len <= max_len {
        return text.to_string();
    }
    let ellipsis_len = ellipsis.chars().count();
    if max_len <= ellipsis_len {
        return text.chars().take(max_len).collect();
    }
    let mut out: String = text.chars().take(max_len - ellipsis_len).collect();
    out.push_str(ellipsis);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_number() {
        assert_eq!(format_compact_number(999.0), "999");
        assert_eq!(format_compact_number(1500.0), "1.5k");
        assert_eq!(format_compact_number(2000.0), "2k");
        assert_eq!(format_compact_number(12000.0), "12.0k");
        assert_eq!(format_compact_number(2_500_000.0), "2.5M");
        assert_eq!(format_compact_number(-1500.0), "-1.5k");
        assert_eq!(format_compact_number(12.25), "12.25");
        assert_eq!(format_compact_number(1250.0), "1.3k");
    }

    #[test]
    fn test_one_decimal_rule() {
        let f = ValueFormatter::new(RoundingRule::OneDecimal);
        assert_eq!(f.compact(2000.0), "2.0k");
        assert_eq!(f.compact(150.0), "150");
        assert_eq!(f.compact(3_000_000.0), "3.0M");
    }

    #[test]
    fn test_to_fixed() {
        assert_eq!(to_fixed(1.25, 1), "1.3");
        assert_eq!(to_fixed(-1.25, 1), "-1.3");
        assert_eq!(to_fixed(2.0, 0), "2");
        assert_eq!(to_fixed(0.5, 0), "1");
    }

    #[test]
    fn test_grouped() {
        assert_eq!(format_grouped(1234.5, 0, 3), "1,234.5");
        assert_eq!(format_grouped(1_000_000.0, 0, 3), "1,000,000");
        assert_eq!(format_grouped(-987654.3219, 0, 3), "-987,654.322");
        assert_eq!(format_grouped(12.0, 2, 2), "12.00");
        assert_eq!(format_grouped(999.999, 2, 2), "1,000.00");
        assert_eq!(format_grouped(-0.0001, 0, 3), "0");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize_label("gdp"), "Gdp");
        assert_eq!(capitalize_label("UAE"), "UAE");
        assert_eq!(capitalize_label(""), "");
        assert_eq!(sentence_case_label("UAE"), "Uae");
        assert_eq!(sentence_case_label("ksa"), "Ksa");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate_label("Revenue", 15, ".."), "Revenue");
        assert_eq!(truncate_label("International Trade", 15, ".."), "International..");
        assert_eq!(truncate_label("abcdef", 2, ".."), "ab");
        assert_eq!(truncate_label("abcdef", 0, "..."), "");
        assert_eq!(truncate_label("Population growth", 12, "..."), "Populatio...");
    }
}
