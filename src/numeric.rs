// Numeric coercion of loosely-typed result values

use crate::data::Scalar;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit0, digit1, one_of},
    combinator::{all_consuming, map_res, opt, recognize},
    sequence::{pair, tuple},
    IResult,
};

/// Decimal literal: optional sign, digits with optional fraction (or a bare
/// fraction), optional exponent. An exponent with no digits is left unconsumed.
fn decimal(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        opt(one_of("+-")),
        alt((
            recognize(pair(digit1, opt(pair(char('.'), digit0)))),
            recognize(pair(char('.'), digit1)),
        )),
        opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
    )))(input)
}

fn infinity(input: &str) -> IResult<&str, f64> {
    let (input, sign) = opt(one_of("+-"))(input)?;
    let (input, _) = tag("Infinity")(input)?;
    let value = if sign == Some('-') {
        f64::NEG_INFINITY
    } else {
        f64::INFINITY
    };
    Ok((input, value))
}

fn number(input: &str) -> IResult<&str, f64> {
    alt((infinity, map_res(decimal, |s: &str| s.parse::<f64>())))(input)
}

/// Permissive parse: skip leading whitespace, then take the longest numeric
/// prefix (`"12px"` is 12). Returns `None` where no prefix exists.
pub fn parse_float_prefix(text: &str) -> Option<f64> {
    number(text.trim_start()).ok().map(|(_, value)| value)
}

/// Strict parse: the whole trimmed text must be a number. Empty text is not a number.
pub fn parse_number_strict(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    all_consuming(number)(trimmed).ok().map(|(_, value)| value)
}

impl Scalar {
    /// Permissive coercion used for plotted values. May be infinite.
    pub fn to_f64_lenient(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) if !n.is_nan() => Some(*n),
            Scalar::Text(s) => parse_float_prefix(s),
            _ => None,
        }
    }

    /// Whole-value coercion used for field classification and heat-map rows.
    pub fn to_f64_strict(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) if !n.is_nan() => Some(*n),
            Scalar::Text(s) => parse_number_strict(s),
            _ => None,
        }
    }

    /// Finite under strict coercion.
    pub fn is_finite_number(&self) -> bool {
        self.to_f64_strict().map_or(false, f64::is_finite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_parse() {
        assert_eq!(parse_float_prefix("42"), Some(42.0));
        assert_eq!(parse_float_prefix("  3.5kg"), Some(3.5));
        assert_eq!(parse_float_prefix("-.25"), Some(-0.25));
        assert_eq!(parse_float_prefix("1e3"), Some(1000.0));
        assert_eq!(parse_float_prefix("12e"), Some(12.0));
        assert_eq!(parse_float_prefix("7."), Some(7.0));
        assert_eq!(parse_float_prefix("Infinity"), Some(f64::INFINITY));
        assert_eq!(parse_float_prefix("abc"), None);
        assert_eq!(parse_float_prefix(""), None);
        assert_eq!(parse_float_prefix("."), None);
    }

    #[test]
    fn test_strict_parse() {
        assert_eq!(parse_number_strict(" 12.5 "), Some(12.5));
        assert_eq!(parse_number_strict("+4"), Some(4.0));
        assert_eq!(parse_number_strict("12px"), None);
        assert_eq!(parse_number_strict(""), None);
        assert_eq!(parse_number_strict("   "), None);
        assert_eq!(parse_number_strict("1e"), None);
    }

    #[test]
    fn test_scalar_coercion() {
        assert_eq!(Scalar::Number(3.0).to_f64_lenient(), Some(3.0));
        assert_eq!(Scalar::Null.to_f64_lenient(), None);
        assert_eq!(Scalar::Bool(true).to_f64_strict(), None);
        assert_eq!(Scalar::from("9 apples").to_f64_lenient(), Some(9.0));
        assert_eq!(Scalar::from("9 apples").to_f64_strict(), None);
        assert!(Scalar::from("100").is_finite_number());
        assert!(!Scalar::from("Infinity").is_finite_number());
    }
}
