//! Physical size descriptors and pixel conversion.
//!
//! Sizes are written as `"63mm"`, `"2.5in"` or a bare number. Bare numbers
//! are taken as already-resolved pixels ([`Unit::Raw`]).
//!
//! Pixel conversion always rounds up: a card converted to pixels is never
//! smaller than its physical footprint at the device resolution.
//!
//! ```
//! use cardsheet::units::{Dimension, Unit, parse_size};
//!
//! assert_eq!(parse_size("63mm").unwrap(), (63.0, Unit::Millimeter));
//!
//! let card = Dimension::parse("63mm").unwrap();
//! // 63 / 25.4 * 300 = 744.09..., rounded up.
//! assert_eq!(card.to_px(300), 745);
//! ```

use alloc::string::{String, ToString};
use core::fmt;
use core::str::FromStr;

use num_traits::Float;

/// Millimeters per inch.
pub const MM_PER_INCH: f64 = 25.4;
/// PostScript points per inch.
pub const POINTS_PER_INCH: f64 = 72.0;

/// Unit tag of a parsed size.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Unit {
    /// `mm` suffix.
    Millimeter,
    /// `in` suffix.
    Inch,
    /// No suffix: the number is used as-is (pixels).
    Raw,
}

impl Unit {
    /// Suffix used when formatting a [`Dimension`].
    pub const fn suffix(self) -> &'static str {
        match self {
            Unit::Millimeter => "mm",
            Unit::Inch => "in",
            Unit::Raw => "",
        }
    }
}

/// A physical length with an explicit unit.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Deserialize))]
#[cfg_attr(feature = "std", serde(try_from = "String"))]
pub struct Dimension {
    value: f64,
    unit: Unit,
}

impl Dimension {
    /// A length in millimeters.
    pub const fn mm(value: f64) -> Self {
        Self {
            value,
            unit: Unit::Millimeter,
        }
    }

    /// A length in inches.
    pub const fn inches(value: f64) -> Self {
        Self {
            value,
            unit: Unit::Inch,
        }
    }

    /// A unitless length, taken as pixels.
    pub const fn raw(value: f64) -> Self {
        Self {
            value,
            unit: Unit::Raw,
        }
    }

    /// Parse a size descriptor. See [`parse_size`].
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let (value, unit) = parse_size(text)?;
        Ok(Self { value, unit })
    }

    /// Numeric magnitude in [`unit`](Self::unit).
    pub const fn value(&self) -> f64 {
        self.value
    }

    pub const fn unit(&self) -> Unit {
        self.unit
    }

    /// Pixels at `ppi`, rounded up.
    pub fn to_px(&self, ppi: u32) -> u32 {
        let px = match self.unit {
            Unit::Millimeter => self.value / MM_PER_INCH * ppi as f64,
            Unit::Inch => self.value * ppi as f64,
            Unit::Raw => self.value,
        };
        // Saturating cast; negative and NaN values are rejected at parse time.
        Float::ceil(px) as u32
    }

    /// Length in millimeters. `ppi` is only used for [`Unit::Raw`].
    pub fn to_mm(&self, ppi: u32) -> f64 {
        match self.unit {
            Unit::Millimeter => self.value,
            Unit::Inch => self.value * MM_PER_INCH,
            Unit::Raw => px_to_mm(self.value, ppi),
        }
    }

    /// Length in inches. `ppi` is only used for [`Unit::Raw`].
    pub fn to_inches(&self, ppi: u32) -> f64 {
        match self.unit {
            Unit::Millimeter => self.value / MM_PER_INCH,
            Unit::Inch => self.value,
            Unit::Raw => px_to_inches(self.value, ppi),
        }
    }

    /// Length in PostScript points. `ppi` is only used for [`Unit::Raw`].
    pub fn to_points(&self, ppi: u32) -> f64 {
        self.to_inches(ppi) * POINTS_PER_INCH
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

impl FromStr for Dimension {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Dimension {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

/// Convert pixels back to millimeters.
pub fn px_to_mm(px: f64, ppi: u32) -> f64 {
    px * MM_PER_INCH / ppi as f64
}

/// Convert pixels back to inches.
pub fn px_to_inches(px: f64, ppi: u32) -> f64 {
    px / ppi as f64
}

/// Size parse failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// Text is neither `<number>mm`, `<number>in` nor a bare number.
    Malformed(String),
    /// Parsed, but negative, infinite or NaN.
    OutOfRange(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Malformed(text) => {
                write!(f, "cannot parse size {text:?}: expected <number>mm, <number>in or a number")
            }
            ParseError::OutOfRange(text) => {
                write!(f, "size {text:?} must be a finite, non-negative number")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ParseError {}

/// Parse a size descriptor into its magnitude and unit.
///
/// Surrounding whitespace is ignored. `<number>mm` and `<number>in` take a
/// plain decimal (`1`, `1.`, `1.5`, `.5`); anything else falls through to a
/// bare float parse and is tagged [`Unit::Raw`].
pub fn parse_size(text: &str) -> Result<(f64, Unit), ParseError> {
    let s = text.trim();

    let suffixed = [("mm", Unit::Millimeter), ("in", Unit::Inch)]
        .into_iter()
        .find_map(|(suffix, unit)| {
            let number = s.strip_suffix(suffix)?;
            is_plain_decimal(number).then_some((number, unit))
        });

    let (value, unit) = match suffixed {
        Some((number, unit)) => (number.parse::<f64>(), unit),
        None => (s.parse::<f64>(), Unit::Raw),
    };
    let value = value.map_err(|_| ParseError::Malformed(text.to_string()))?;

    if !value.is_finite() || value < 0.0 {
        return Err(ParseError::OutOfRange(text.to_string()));
    }
    Ok((value, unit))
}

/// `\d+\.\d*|\.\d+|\d+`
fn is_plain_decimal(s: &str) -> bool {
    let mut digits = 0;
    let mut dots = 0;
    for b in s.bytes() {
        match b {
            b'0'..=b'9' => digits += 1,
            b'.' => dots += 1,
            _ => return false,
        }
    }
    digits > 0 && dots <= 1
}
