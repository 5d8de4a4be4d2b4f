//! Length units and number formatting for CSS and ODF values.
//!
//! CSS lengths found in the source fragment (`12px`, `2.5cm`, `50%`) are
//! parsed into [`Length`] and converted to centimetres, the unit every
//! generated ODF property uses.

use crate::common::{Error, Result};
use fast_float2::parse_partial;
use std::fmt;
use std::str::FromStr;

/// Default number of CSS pixels in a centimetre.
pub const PX_PER_CM: f64 = 44.173513561;
pub const PT_PER_CM: f64 = 28.346456693;
pub const PC_PER_CM: f64 = 2.362204724;
pub const MM_PER_CM: f64 = 10.0;
pub const CM_PER_INCH: f64 = 2.54;

/// Supported length units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthUnit {
    /// CSS pixel
    Pixel,
    /// Centimeter
    Centimeter,
    /// Millimeter
    Millimeter,
    /// Inch
    Inch,
    /// Point (1/72 inch)
    Point,
    /// Pica (1/6 inch)
    Pica,
    /// Font-relative em
    Em,
    /// Percentage of the containing block
    Percent,
}

impl LengthUnit {
    /// Get the unit abbreviation
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pixel => "px",
            Self::Centimeter => "cm",
            Self::Millimeter => "mm",
            Self::Inch => "in",
            Self::Point => "pt",
            Self::Pica => "pc",
            Self::Em => "em",
            Self::Percent => "%",
        }
    }

    fn from_str_internal(s: &str) -> Option<Self> {
        match s {
            "px" => Some(Self::Pixel),
            "cm" => Some(Self::Centimeter),
            "mm" => Some(Self::Millimeter),
            "in" => Some(Self::Inch),
            "pt" => Some(Self::Point),
            "pc" => Some(Self::Pica),
            "em" | "rem" => Some(Self::Em),
            "%" => Some(Self::Percent),
            _ => None,
        }
    }
}

impl FromStr for LengthUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_str_internal(s)
            .ok_or_else(|| Error::Other(format!("Unknown length unit '{}'", s)))
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric value with an optional unit.
///
/// A bare number (`border="0"`, `width="300"`) has no unit; HTML treats
/// unitless widths as pixels, see [`Length::unit_or_px`].
///
/// # Examples
///
/// ```
/// use xhtml_odf::common::unit::{Length, LengthUnit};
///
/// let length = "2.5cm".parse::<Length>().unwrap();
/// assert_eq!(length.value(), 2.5);
/// assert_eq!(length.unit(), Some(LengthUnit::Centimeter));
///
/// let bare = "300".parse::<Length>().unwrap();
/// assert_eq!(bare.unit_or_px(), LengthUnit::Pixel);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Length {
    value: f64,
    unit: Option<LengthUnit>,
}

impl Length {
    /// Create a new length measurement
    #[inline]
    pub fn new(value: f64, unit: LengthUnit) -> Self {
        Self { value, unit: Some(unit) }
    }

    /// Get the numeric value
    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Get the unit, if one was written
    #[inline]
    pub fn unit(&self) -> Option<LengthUnit> {
        self.unit
    }

    /// Get the unit, reading a bare number as pixels
    #[inline]
    pub fn unit_or_px(&self) -> LengthUnit {
        self.unit.unwrap_or(LengthUnit::Pixel)
    }

    /// Whether this is a percentage
    #[inline]
    pub fn is_percent(&self) -> bool {
        self.unit == Some(LengthUnit::Percent)
    }

    /// Convert to centimetres.
    ///
    /// `px_per_cm` is the pixel ratio to use for pixel values. Relative units
    /// (`%`, `em`) have no absolute size and yield `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use xhtml_odf::common::unit::{Length, LengthUnit};
    ///
    /// let inch = Length::new(1.0, LengthUnit::Inch);
    /// assert_eq!(inch.to_cm(44.0), Some(2.54));
    /// assert_eq!(Length::new(50.0, LengthUnit::Percent).to_cm(44.0), None);
    /// ```
    pub fn to_cm(&self, px_per_cm: f64) -> Option<f64> {
        let cm = match self.unit_or_px() {
            LengthUnit::Pixel => self.value / px_per_cm,
            LengthUnit::Centimeter => self.value,
            LengthUnit::Millimeter => self.value / MM_PER_CM,
            LengthUnit::Inch => self.value * CM_PER_INCH,
            LengthUnit::Point => self.value / PT_PER_CM,
            LengthUnit::Pica => self.value / PC_PER_CM,
            LengthUnit::Em | LengthUnit::Percent => return None,
        };
        Some(cm)
    }
}

impl FromStr for Length {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (value, consumed) = parse_partial::<f64, _>(s)
            .map_err(|_| Error::Other(format!("Invalid length '{}'", s)))?;
        let rest = s[consumed..].trim();
        if rest.is_empty() {
            return Ok(Self { value, unit: None });
        }
        let unit = rest.to_ascii_lowercase().parse::<LengthUnit>()?;
        Ok(Self::new(value, unit))
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit {
            Some(unit) => write!(f, "{}{}", self.value, unit),
            None => write!(f, "{}", self.value),
        }
    }
}

/// Format a float with a fixed number of decimals and a `.` separator.
///
/// When `trim_zeros` is set, trailing zeros (and a dangling separator) are
/// removed.
///
/// # Examples
///
/// ```
/// use xhtml_odf::common::unit::format_number;
///
/// assert_eq!(format_number(16.5, 2, false), "16.50");
/// assert_eq!(format_number(0.32, 2, true), "0.32");
/// assert_eq!(format_number(1.0, 2, true), "1");
/// ```
pub fn format_number(value: f64, precision: usize, trim_zeros: bool) -> String {
    let mut s = format!("{:.*}", precision, value);
    if trim_zeros && s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(trimmed);
    }
    s
}
