//! Locale-aware numeric parsing.
//!
//! The station registry writes decimals with a comma (`52,52`). Every
//! numeric field read from a source goes through [`parse_locale_number`]
//! so the comma repair lives in one place.

/// Outcome of parsing a numeric text field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocaleNumber {
    /// The field parsed to a finite number.
    Value(f64),
    /// The field was empty or whitespace.
    Empty,
    /// The field had content that is not a number.
    Invalid,
}

impl LocaleNumber {
    /// Returns the parsed value, treating empty and invalid alike.
    #[must_use]
    pub const fn value(self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(v),
            Self::Empty | Self::Invalid => None,
        }
    }
}

/// Parses a decimal that may use a comma as the decimal separator.
///
/// Non-finite results (`NaN`, `inf`) count as invalid.
#[must_use]
pub fn parse_locale_number(raw: &str) -> LocaleNumber {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return LocaleNumber::Empty;
    }

    match trimmed.replace(',', ".").parse::<f64>() {
        Ok(v) if v.is_finite() => LocaleNumber::Value(v),
        _ => LocaleNumber::Invalid,
    }
}

/// Parses a decimal that may use a comma separator, returning `None` for
/// empty or unparseable text.
#[must_use]
pub fn parse_locale_f64(raw: &str) -> Option<f64> {
    parse_locale_number(raw).value()
}

/// Parses a whole count such as a resident number.
///
/// Accepts a zero fraction (`"12345.0"`) left behind by numeric-typed
/// spreadsheet columns. The sign is preserved so callers can reject
/// negative counts explicitly.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn parse_count(raw: &str) -> Option<Result<i64, String>> {
    match parse_locale_number(raw) {
        LocaleNumber::Empty => None,
        LocaleNumber::Invalid => Some(Err(raw.trim().to_string())),
        LocaleNumber::Value(v) => {
            if v.fract() == 0.0 && v.abs() < 9.0e15 {
                Some(Ok(v as i64))
            } else {
                Some(Err(raw.trim().to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal_comma() {
        let v = parse_locale_f64("52,52").unwrap();
        assert!((v - 52.52).abs() < f64::EPSILON);
    }

    #[test]
    fn parses_decimal_point() {
        let v = parse_locale_f64(" 13.4050 ").unwrap();
        assert!((v - 13.405).abs() < f64::EPSILON);
    }

    #[test]
    fn garbage_is_missing_not_a_crash() {
        assert_eq!(parse_locale_f64("abc"), None);
        assert_eq!(parse_locale_number("abc"), LocaleNumber::Invalid);
    }

    #[test]
    fn empty_is_distinguished_from_invalid() {
        assert_eq!(parse_locale_number(""), LocaleNumber::Empty);
        assert_eq!(parse_locale_number("   "), LocaleNumber::Empty);
        assert_eq!(parse_locale_number("NaN"), LocaleNumber::Invalid);
        assert_eq!(parse_locale_number("1,2,3"), LocaleNumber::Invalid);
    }

    #[test]
    fn parses_counts() {
        assert_eq!(parse_count("12345"), Some(Ok(12_345)));
        assert_eq!(parse_count("12345.0"), Some(Ok(12_345)));
        assert_eq!(parse_count("-4"), Some(Ok(-4)));
        assert_eq!(parse_count(""), None);
        assert!(matches!(parse_count("12.5"), Some(Err(_))));
        assert!(matches!(parse_count("n/a"), Some(Err(_))));
    }
}
