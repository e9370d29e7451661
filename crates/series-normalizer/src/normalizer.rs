//! Value coercion and one-shot unit rescaling

use crate::error::SeriesError;
use crate::kind::VariableKind;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Divisor applied once to values above the kind's maximum (W vs kW mix-ups)
pub const RESCALE_DIVISOR: f64 = 1000.0;

/// A value as it arrives: JSON number or CSV string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl RawValue {
    /// Coerce to a number without any range policy
    pub fn coerce(&self) -> Result<f64, SeriesError> {
        match self {
            RawValue::Number(v) => Ok(*v),
            RawValue::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| SeriesError::InvalidNumber(s.clone())),
        }
    }
}

/// A projected `{date, value}` row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPair {
    pub date: String,
    #[serde(default)]
    pub value: Option<RawValue>,
}

impl RawPair {
    pub fn new(date: impl Into<String>, value: impl Into<RawValue>) -> Self {
        Self {
            date: date.into(),
            value: Some(value.into()),
        }
    }
}

/// Coerce and range-check a raw value for `kind`.
///
/// Values above the maximum are divided by [`RESCALE_DIVISOR`] exactly once and
/// re-checked; anything still outside `[min, max]`, or not finite, is rejected.
pub fn normalize_value(raw: &RawValue, kind: VariableKind) -> Result<f64, SeriesError> {
    let mut value = raw.coerce()?;
    if !value.is_finite() {
        return Err(SeriesError::NonFinite { kind });
    }

    let range = kind.range();
    if value > range.max {
        let rescaled = value / RESCALE_DIVISOR;
        debug!(
            "{} value {} exceeds maximum {}, rescaled to {}",
            kind, value, range.max, rescaled
        );
        value = rescaled;
    }

    kind.validate(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_string_pass_through_and_rescale() {
        // 1100 > 1000: one rescale to 1.1, which is in range
        let v = normalize_value(&RawValue::from("1100"), VariableKind::Ghi).unwrap();
        assert!((v - 1.1).abs() < 1e-12);

        // 900000 -> 900
        let v = normalize_value(&RawValue::Number(900_000.0), VariableKind::Ghi).unwrap();
        assert!((v - 900.0).abs() < 1e-9);

        let v = normalize_value(&RawValue::from(" 512.5 "), VariableKind::Ghi).unwrap();
        assert_eq!(v, 512.5);
    }

    #[test]
    fn test_rescale_is_single_shot() {
        // 5e6 / 1000 = 5000 is still above 1000 and is not divided again
        let err = normalize_value(&RawValue::Number(5_000_000.0), VariableKind::Ghi).unwrap_err();
        assert!(matches!(err, SeriesError::OutOfRange { value, .. } if value == 5000.0));
    }

    #[test]
    fn test_rejects_negative_and_garbage() {
        assert!(matches!(
            normalize_value(&RawValue::Number(-3.0), VariableKind::Dni),
            Err(SeriesError::OutOfRange { .. })
        ));
        assert!(matches!(
            normalize_value(&RawValue::from("n/a"), VariableKind::Dni),
            Err(SeriesError::InvalidNumber(_))
        ));
        assert!(matches!(
            normalize_value(&RawValue::from(""), VariableKind::Dni),
            Err(SeriesError::InvalidNumber(_))
        ));
        assert!(matches!(
            normalize_value(&RawValue::Number(f64::INFINITY), VariableKind::Pv),
            Err(SeriesError::NonFinite { .. })
        ));
    }

    #[test]
    fn test_raw_pair_json_shapes() {
        let pairs: Vec<RawPair> = serde_json::from_str(
            r#"[{"date":"2023-01-01","value":"1100"},{"date":"2023-01-02","value":900000},{"date":"2023-01-03"},{"date":"2023-01-04","value":null}]"#,
        )
        .unwrap();
        assert_eq!(pairs[0].value, Some(RawValue::Text("1100".into())));
        assert_eq!(pairs[1].value, Some(RawValue::Number(900000.0)));
        assert_eq!(pairs[2].value, None);
        assert_eq!(pairs[3].value, None);
    }

    fn any_kind() -> impl Strategy<Value = VariableKind> {
        prop::sample::select(VariableKind::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn prop_identity_in_range(kind in any_kind(), frac in 0.0f64..=1.0) {
            let v = frac * kind.range().max;
            prop_assert_eq!(normalize_value(&RawValue::Number(v), kind).unwrap(), v);
        }

        #[test]
        fn prop_single_rescale_lands_in_range(kind in any_kind(), factor in 1.0001f64..999.0) {
            let max = kind.range().max;
            let v = max * factor;
            let out = normalize_value(&RawValue::Number(v), kind).unwrap();
            prop_assert_eq!(out, v / RESCALE_DIVISOR);
            prop_assert!(kind.range().contains(out));
        }
    }
}
