//! Variable kinds and their expected physical ranges

use crate::error::SeriesError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Inclusive range of plausible values for a variable
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    /// Whether `value` lies inside `[min, max]`
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Sensor/target variable selecting the dataset column and the range policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    /// Direct Normal Irradiance (W/m²)
    Dni,
    /// Global Horizontal Irradiance (W/m²)
    Ghi,
    /// Diffuse Horizontal Irradiance (W/m²)
    Dhi,
    /// Derived PV output estimate
    Pv,
}

impl VariableKind {
    pub const ALL: [VariableKind; 4] = [
        VariableKind::Dni,
        VariableKind::Ghi,
        VariableKind::Dhi,
        VariableKind::Pv,
    ];

    /// Lowercase tag, also the dataset column name
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableKind::Dni => "dni",
            VariableKind::Ghi => "ghi",
            VariableKind::Dhi => "dhi",
            VariableKind::Pv => "pv",
        }
    }

    /// Dataset column holding this variable
    pub fn column(&self) -> &'static str {
        self.as_str()
    }

    /// Expected value range
    pub fn range(&self) -> ValueRange {
        let max = match self {
            VariableKind::Dni => 1200.0,
            VariableKind::Ghi => 1000.0,
            VariableKind::Dhi => 600.0,
            VariableKind::Pv => 2000.0,
        };
        ValueRange { min: 0.0, max }
    }

    /// Check a value against this kind's range
    pub fn validate(&self, value: f64) -> Result<f64, SeriesError> {
        if !value.is_finite() {
            return Err(SeriesError::NonFinite { kind: *self });
        }
        let range = self.range();
        if range.contains(value) {
            Ok(value)
        } else {
            Err(SeriesError::OutOfRange {
                kind: *self,
                value,
                min: range.min,
                max: range.max,
            })
        }
    }
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

impl FromStr for VariableKind {
    type Err = SeriesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dni" => Ok(VariableKind::Dni),
            "ghi" => Ok(VariableKind::Ghi),
            "dhi" => Ok(VariableKind::Dhi),
            "pv" => Ok(VariableKind::Pv),
            _ => Err(SeriesError::UnknownKind(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranges() {
        assert_eq!(VariableKind::Dni.range().max, 1200.0);
        assert_eq!(VariableKind::Ghi.range().max, 1000.0);
        assert_eq!(VariableKind::Dhi.range().max, 600.0);
        assert_eq!(VariableKind::Pv.range().max, 2000.0);
        for kind in VariableKind::ALL {
            assert_eq!(kind.range().min, 0.0);
        }
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("GHI".parse::<VariableKind>().unwrap(), VariableKind::Ghi);
        assert_eq!("dni".parse::<VariableKind>().unwrap(), VariableKind::Dni);
        assert_eq!(" Pv ".parse::<VariableKind>().unwrap(), VariableKind::Pv);
        assert!(matches!(
            "temperature".parse::<VariableKind>(),
            Err(SeriesError::UnknownKind(_))
        ));
    }

    #[test]
    fn test_validate_bounds_inclusive() {
        let kind = VariableKind::Dhi;
        assert!(kind.validate(0.0).is_ok());
        assert!(kind.validate(600.0).is_ok());
        assert!(kind.validate(600.1).is_err());
        assert!(kind.validate(-0.1).is_err());
        assert!(matches!(
            kind.validate(f64::NAN),
            Err(SeriesError::NonFinite { .. })
        ));
    }
}
