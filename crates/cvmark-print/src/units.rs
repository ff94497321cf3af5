//! Physical lengths: `cm`, `in`, `px` and `pt`.
//!
//! `1in = 72pt = 2.54cm`, `1px = 0.75pt`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::RenderError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Pt,
    Px,
    Cm,
    In,
}

impl Unit {
    /// Points per unit.
    #[inline]
    pub fn points(self) -> f64 {
        match self {
            Unit::Pt => 1.0,
            Unit::Px => 0.75,
            Unit::Cm => 72.0 / 2.54,
            Unit::In => 72.0,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Unit::Pt => "pt",
            Unit::Px => "px",
            Unit::Cm => "cm",
            Unit::In => "in",
        }
    }
}

/// Convert `value` between units.
#[inline]
pub fn convert(value: f64, from: Unit, to: Unit) -> f64 {
    if from == to {
        value
    } else {
        value * from.points() / to.points()
    }
}

/// A signed length with its unit.
///
/// Text form is a number with an optional unit suffix; bare numbers are
/// points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Length {
    pub value: f64,
    pub unit: Unit,
}

impl Length {
    pub const ZERO: Length = Length {
        value: 0.0,
        unit: Unit::Pt,
    };

    #[inline]
    pub const fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    #[inline]
    pub fn to(self, unit: Unit) -> f64 {
        convert(self.value, self.unit, unit)
    }

    #[inline]
    pub fn to_pt(self) -> f64 {
        self.to(Unit::Pt)
    }
}

impl FromStr for Length {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        let (number, unit) = [Unit::Cm, Unit::In, Unit::Px, Unit::Pt]
            .into_iter()
            .find_map(|u| t.strip_suffix(u.suffix()).map(|n| (n, u)))
            .unwrap_or((t, Unit::Pt));
        let value: f64 = number
            .trim_end()
            .parse()
            .ok()
            .filter(|v: &f64| v.is_finite())
            .ok_or_else(|| RenderError::InvalidLength {
                input: s.to_string(),
            })?;
        Ok(Self { value, unit })
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

impl TryFrom<String> for Length {
    type Error = RenderError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Length> for String {
    fn from(value: Length) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn parses_suffixes() {
        assert_eq!("2.54cm".parse::<Length>().expect("cm"), Length::new(2.54, Unit::Cm));
        assert_eq!("-10px".parse::<Length>().expect("px"), Length::new(-10.0, Unit::Px));
        assert_eq!("12".parse::<Length>().expect("bare"), Length::new(12.0, Unit::Pt));
        assert!("12mm".parse::<Length>().is_err());
        assert!("cm".parse::<Length>().is_err());
    }

    #[test]
    fn conversions() {
        assert_relative_eq!(Length::new(1.0, Unit::In).to_pt(), 72.0);
        assert_relative_eq!(Length::new(2.54, Unit::Cm).to_pt(), 72.0, epsilon = 1e-9);
        assert_relative_eq!(Length::new(4.0, Unit::Px).to_pt(), 3.0);
        assert_relative_eq!(Length::new(3.0, Unit::Pt).to(Unit::Px), 4.0, epsilon = 1e-9);
        assert_relative_eq!(convert(1.0, Unit::In, Unit::Cm), 2.54, epsilon = 1e-9);
    }

    #[test]
    fn serde_uses_text_form() {
        let l: Length = serde_json::from_str(r#""0.1cm""#).expect("json");
        assert_eq!(l, Length::new(0.1, Unit::Cm));
        assert_eq!(serde_json::to_string(&l).expect("json"), r#""0.1cm""#);
    }
}
