#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DType {
    Null,
    Int64,
    Float64,
    Utf8,
}

/// One cell of a table. `Missing` is the explicit marker for absent or
/// uncoercible fields; it is never silently collapsed to zero or to the
/// empty string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Scalar {
    Missing,
    Int64(i64),
    Float64(f64),
    Utf8(String),
}

impl Scalar {
    #[must_use]
    pub fn dtype(&self) -> DType {
        match self {
            Self::Missing => DType::Null,
            Self::Int64(_) => DType::Int64,
            Self::Float64(_) => DType::Float64,
            Self::Utf8(_) => DType::Utf8,
        }
    }

    #[must_use]
    pub fn is_missing(&self) -> bool {
        match self {
            Self::Missing => true,
            Self::Float64(v) => v.is_nan(),
            _ => false,
        }
    }

    pub fn to_f64(&self) -> Result<f64, TypeError> {
        match self {
            Self::Int64(v) => Ok(*v as f64),
            Self::Float64(v) => Ok(*v),
            Self::Missing => Err(TypeError::ValueIsMissing),
            Self::Utf8(v) => Err(TypeError::NonNumericValue { value: v.clone() }),
        }
    }

    /// Equality used for join keys and group keys: exact value equality,
    /// with all missing markers (including float NaN) treated as one key.
    #[must_use]
    pub fn key_eq(&self, other: &Self) -> bool {
        if self.is_missing() && other.is_missing() {
            return true;
        }
        self == other
    }

    /// Render the scalar the way the writer emits it: missing becomes the
    /// empty field, numbers use Rust's shortest round-trip formatting.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Missing => String::new(),
            Self::Int64(v) => v.to_string(),
            Self::Float64(v) => {
                if v.is_nan() {
                    String::new()
                } else {
                    render_f64(*v)
                }
            }
            Self::Utf8(v) => v.clone(),
        }
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Int64(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Float64(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Utf8(value.to_owned())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::Utf8(value)
    }
}

/// Float rendering for the writer. Rust's `Display` never uses exponent
/// form, but e-values parsed from scientific notation must round-trip in
/// scientific shape, so very small and very large magnitudes go through
/// `{:e}`.
#[must_use]
pub fn render_f64(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude != 0.0 && (magnitude < 1e-4 || magnitude >= 1e16) {
        format!("{value:e}")
    } else {
        value.to_string()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("dtypes {left:?} and {right:?} have no common type")]
    IncompatibleDtypes { left: DType, right: DType },
    #[error("value {value:?} is not numeric")]
    NonNumericValue { value: String },
    #[error("value is missing")]
    ValueIsMissing,
}

/// Hashable view of a scalar for multimap join indexes and group tables.
/// Floats hash by bit pattern with every NaN collapsed to one key so that
/// missing floats land in the missing group.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum KeyScalar<'a> {
    Missing,
    Int64(i64),
    FloatBits(u64),
    Utf8(&'a str),
}

impl<'a> KeyScalar<'a> {
    #[must_use]
    pub fn from_scalar(value: &'a Scalar) -> Self {
        match value {
            Scalar::Missing => Self::Missing,
            Scalar::Int64(v) => Self::Int64(*v),
            Scalar::Float64(v) => {
                if v.is_nan() {
                    Self::Missing
                } else {
                    Self::FloatBits(v.to_bits())
                }
            }
            Scalar::Utf8(v) => Self::Utf8(v.as_str()),
        }
    }
}

/// Parse one delimited field into a scalar. Blank fields are missing; numeric
/// parses (including scientific notation e-values) win over strings.
#[must_use]
pub fn parse_field(field: &str) -> Scalar {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Scalar::Missing;
    }

    if let Ok(value) = trimmed.parse::<i64>() {
        return Scalar::Int64(value);
    }
    if let Ok(value) = trimmed.parse::<f64>() {
        return Scalar::Float64(value);
    }

    Scalar::Utf8(trimmed.to_owned())
}

/// Coerce a scalar to a numeric one. A string that fails to parse becomes
/// `Missing` rather than an error, so downstream filters can exclude the row.
#[must_use]
pub fn coerce_numeric(value: &Scalar) -> Scalar {
    match value {
        Scalar::Int64(_) | Scalar::Float64(_) => value.clone(),
        Scalar::Missing => Scalar::Missing,
        Scalar::Utf8(v) => {
            let trimmed = v.trim();
            if let Ok(parsed) = trimmed.parse::<i64>() {
                Scalar::Int64(parsed)
            } else if let Ok(parsed) = trimmed.parse::<f64>() {
                Scalar::Float64(parsed)
            } else {
                Scalar::Missing
            }
        }
    }
}

pub fn common_dtype(left: DType, right: DType) -> Result<DType, TypeError> {
    use DType::{Float64, Int64, Null, Utf8};

    let out = match (left, right) {
        (a, b) if a == b => a,
        (Null, other) | (other, Null) => other,
        (Int64, Float64) | (Float64, Int64) => Float64,
        (Utf8, Utf8) => Utf8,
        _ => return Err(TypeError::IncompatibleDtypes { left, right }),
    };

    Ok(out)
}

/// Widest dtype covering every value, falling back to Utf8 when a column
/// mixes strings and numbers (delimited files give no stronger guarantee).
#[must_use]
pub fn infer_dtype(values: &[Scalar]) -> DType {
    let mut current = DType::Null;
    for value in values {
        current = match common_dtype(current, value.dtype()) {
            Ok(dtype) => dtype,
            Err(_) => return DType::Utf8,
        };
    }
    current
}

#[cfg(test)]
mod tests {
    use super::{DType, Scalar, coerce_numeric, infer_dtype, parse_field};

    #[test]
    fn parse_field_handles_scientific_notation() {
        assert_eq!(parse_field("1e-7"), Scalar::Float64(1e-7));
        assert_eq!(parse_field("42"), Scalar::Int64(42));
        assert_eq!(parse_field("  "), Scalar::Missing);
        assert_eq!(parse_field("K00001"), Scalar::Utf8("K00001".to_owned()));
    }

    #[test]
    fn coerce_numeric_turns_garbage_into_missing() {
        assert_eq!(coerce_numeric(&Scalar::Utf8("3.5".into())), Scalar::Float64(3.5));
        assert_eq!(coerce_numeric(&Scalar::Utf8("n/a".into())), Scalar::Missing);
        assert_eq!(coerce_numeric(&Scalar::Int64(7)), Scalar::Int64(7));
    }

    #[test]
    fn mixed_columns_infer_as_utf8() {
        let values = vec![Scalar::Utf8("g1".into()), Scalar::Int64(3)];
        assert_eq!(infer_dtype(&values), DType::Utf8);
    }

    #[test]
    fn numeric_columns_widen_to_float() {
        let values = vec![Scalar::Int64(3), Scalar::Float64(0.5), Scalar::Missing];
        assert_eq!(infer_dtype(&values), DType::Float64);
    }

    #[test]
    fn nan_counts_as_missing() {
        assert!(Scalar::Float64(f64::NAN).is_missing());
        assert!(Scalar::Float64(f64::NAN).key_eq(&Scalar::Missing));
    }

    #[test]
    fn render_preserves_float_shape() {
        assert_eq!(Scalar::Float64(1e-7).render(), "1e-7");
        assert_eq!(Scalar::Missing.render(), "");
    }

    #[test]
    fn scalar_serialization_round_trips() {
        let json = serde_json::to_string(&Scalar::Int64(5)).expect("serialize");
        assert_eq!(json, r#"{"kind":"int64","value":5}"#);
        let back: Scalar = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, Scalar::Int64(5));
    }
}
