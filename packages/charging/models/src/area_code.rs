//! Canonical postal area codes.
//!
//! Area codes are the join key across all three sources. Sources disagree
//! on the key type (text in the station registry, numbers in the
//! population table, sometimes `10115.0` after a spreadsheet round-trip),
//! so every code is normalized into a zero-padded five-digit string and
//! checked against the numeric range of the target region.

use serde::{Deserialize, Serialize};

/// Number of digits in a canonical area code.
pub const AREA_CODE_WIDTH: usize = 5;

/// Largest numeric value representable in [`AREA_CODE_WIDTH`] digits.
const MAX_AREA_CODE_VALUE: u32 = 99_999;

/// Inclusive numeric range of area codes that belong to the target region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaCodeRange {
    /// Smallest valid code (inclusive).
    pub min: u32,
    /// Largest valid code (inclusive).
    pub max: u32,
}

impl AreaCodeRange {
    /// Creates a new inclusive range.
    #[must_use]
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Returns `true` if `value` lies within the range.
    #[must_use]
    pub const fn contains(self, value: u32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// A validated, zero-padded five-digit area code.
///
/// Ordering is lexicographic on the padded string, which matches numeric
/// ordering of the code.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AreaCode(String);

impl AreaCode {
    /// Normalizes and validates a raw area code.
    ///
    /// Accepts surrounding whitespace, leading zeros, and a zero fraction
    /// (`"10115.0"`, `"10115,0"`) left behind by numeric-typed columns.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidAreaCodeError`] if the text is empty, is not a whole
    /// number, has more than five significant digits, or falls outside
    /// `range`.
    pub fn parse(raw: &str, range: AreaCodeRange) -> Result<Self, InvalidAreaCodeError> {
        let value = parse_code_value(raw)?;

        if !range.contains(value) {
            return Err(InvalidAreaCodeError::OutOfRange {
                code: format!("{value:05}"),
                min: range.min,
                max: range.max,
            });
        }

        Ok(Self(format!("{value:05}")))
    }

    /// Returns the canonical string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the numeric value of the code.
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0.parse().unwrap_or_default()
    }
}

impl std::fmt::Display for AreaCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AreaCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn parse_code_value(raw: &str) -> Result<u32, InvalidAreaCodeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(InvalidAreaCodeError::Empty);
    }

    let (whole, fraction) = trimmed
        .split_once(['.', ','])
        .unwrap_or((trimmed, ""));

    let not_numeric = || InvalidAreaCodeError::NotNumeric {
        raw: trimmed.to_string(),
    };

    if whole.is_empty()
        || !whole.bytes().all(|b| b.is_ascii_digit())
        || !fraction.bytes().all(|b| b == b'0')
    {
        return Err(not_numeric());
    }

    let significant = whole.trim_start_matches('0');
    if significant.len() > AREA_CODE_WIDTH {
        return Err(InvalidAreaCodeError::TooLong {
            raw: trimmed.to_string(),
        });
    }

    let value = if significant.is_empty() {
        0
    } else {
        significant.parse::<u32>().map_err(|_| not_numeric())?
    };

    if value > MAX_AREA_CODE_VALUE {
        return Err(InvalidAreaCodeError::TooLong {
            raw: trimmed.to_string(),
        });
    }

    Ok(value)
}

/// Error returned when a raw value cannot be turned into an [`AreaCode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidAreaCodeError {
    /// The field was empty or whitespace.
    Empty,
    /// The field is not a whole decimal number.
    NotNumeric {
        /// The offending text.
        raw: String,
    },
    /// The number has more significant digits than an area code allows.
    TooLong {
        /// The offending text.
        raw: String,
    },
    /// The code is well-formed but outside the target region.
    OutOfRange {
        /// The zero-padded code.
        code: String,
        /// Smallest valid code.
        min: u32,
        /// Largest valid code.
        max: u32,
    },
}

impl InvalidAreaCodeError {
    /// Returns `true` if the code was well-formed but belongs to another
    /// region.
    #[must_use]
    pub const fn is_out_of_range(&self) -> bool {
        matches!(self, Self::OutOfRange { .. })
    }
}

impl std::fmt::Display for InvalidAreaCodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "area code is empty"),
            Self::NotNumeric { raw } => write!(f, "area code is not numeric: '{raw}'"),
            Self::TooLong { raw } => {
                write!(f, "area code has more than {AREA_CODE_WIDTH} digits: '{raw}'")
            }
            Self::OutOfRange { code, min, max } => {
                write!(f, "area code {code} outside region range {min}-{max}")
            }
        }
    }
}

impl std::error::Error for InvalidAreaCodeError {}
