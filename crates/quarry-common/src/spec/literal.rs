use std::cmp::Ordering;
use std::fmt::Display;

use chrono::{DateTime, SecondsFormat, Utc};
use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::spec::DType;

/// A single cell value of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Literal {
    Null,
    Boolean(bool),
    Char(char),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Instant(DateTime<Utc>),
    BigInteger(BigInt),
    BigDecimal(BigDecimal),
    Json(serde_json::Value),
    Array {
        element_type: DType,
        elements: Vec<Literal>,
    },
}

enum Numeric {
    Integer(BigInt),
    Decimal(BigDecimal),
    Floating(f64),
}

impl Numeric {
    fn to_f64(&self) -> Option<f64> {
        match self {
            Numeric::Integer(x) => x.to_string().parse().ok(),
            Numeric::Decimal(x) => x.to_f64(),
            Numeric::Floating(x) => Some(*x),
        }
    }

    fn compare(&self, other: &Numeric) -> Option<Ordering> {
        match (self, other) {
            (Numeric::Integer(a), Numeric::Integer(b)) => Some(a.cmp(b)),
            (Numeric::Decimal(a), Numeric::Decimal(b)) => Some(a.cmp(b)),
            (Numeric::Integer(a), Numeric::Decimal(b)) => {
                Some(BigDecimal::from(a.clone()).cmp(b))
            }
            (Numeric::Decimal(_), Numeric::Integer(_)) => {
                other.compare(self).map(Ordering::reverse)
            }
            _ => self.to_f64()?.partial_cmp(&other.to_f64()?),
        }
    }
}

impl Literal {
    /// Returns the data type of the literal, or `None` for a null literal.
    pub fn data_type(&self) -> Option<DType> {
        match self {
            Literal::Null => None,
            Literal::Boolean(_) => Some(DType::Boolean),
            Literal::Char(_) => Some(DType::Char),
            Literal::Byte(_) => Some(DType::Byte),
            Literal::Short(_) => Some(DType::Short),
            Literal::Int(_) => Some(DType::Int),
            Literal::Long(_) => Some(DType::Long),
            Literal::Float(_) => Some(DType::Float),
            Literal::Double(_) => Some(DType::Double),
            Literal::String(_) => Some(DType::String),
            Literal::Instant(_) => Some(DType::Instant),
            Literal::BigInteger(_) => Some(DType::BigInteger),
            Literal::BigDecimal(_) => Some(DType::BigDecimal),
            Literal::Json(_) => Some(DType::Object),
            Literal::Array { element_type, .. } => Some(DType::array_of(element_type.clone())),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Literal::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::String(x) => Some(x),
            _ => None,
        }
    }

    fn as_numeric(&self) -> Option<Numeric> {
        match self {
            Literal::Byte(x) => Some(Numeric::Integer(BigInt::from(*x))),
            Literal::Short(x) => Some(Numeric::Integer(BigInt::from(*x))),
            Literal::Int(x) => Some(Numeric::Integer(BigInt::from(*x))),
            Literal::Long(x) => Some(Numeric::Integer(BigInt::from(*x))),
            Literal::BigInteger(x) => Some(Numeric::Integer(x.clone())),
            Literal::BigDecimal(x) => Some(Numeric::Decimal(x.clone())),
            Literal::Float(x) => Some(Numeric::Floating(f64::from(*x))),
            Literal::Double(x) => Some(Numeric::Floating(*x)),
            _ => None,
        }
    }

    /// Compares two literals.
    /// Numeric kinds are compared by value regardless of their width,
    /// and an instant can be compared with an RFC 3339 string.
    /// Returns `None` when the literals are not comparable, including when either is null.
    pub fn compare(&self, other: &Literal) -> Option<Ordering> {
        match (self, other) {
            (Literal::Null, _) | (_, Literal::Null) => None,
            (Literal::Boolean(a), Literal::Boolean(b)) => Some(a.cmp(b)),
            (Literal::String(a), Literal::String(b)) => Some(a.cmp(b)),
            (Literal::Char(a), Literal::Char(b)) => Some(a.cmp(b)),
            (Literal::Char(a), Literal::String(b)) => Some(a.to_string().as_str().cmp(b)),
            (Literal::String(a), Literal::Char(b)) => Some(a.as_str().cmp(b.to_string().as_str())),
            (Literal::Instant(a), Literal::Instant(b)) => Some(a.cmp(b)),
            (Literal::Instant(a), Literal::String(b)) => {
                let b = DateTime::parse_from_rfc3339(b).ok()?;
                Some(a.cmp(&b.with_timezone(&Utc)))
            }
            (Literal::String(_), Literal::Instant(_)) => {
                other.compare(self).map(Ordering::reverse)
            }
            _ => self.as_numeric()?.compare(&other.as_numeric()?),
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Null => write!(f, "null"),
            Literal::Boolean(x) => write!(f, "{x}"),
            Literal::Char(x) => write!(f, "{x}"),
            Literal::Byte(x) => write!(f, "{x}"),
            Literal::Short(x) => write!(f, "{x}"),
            Literal::Int(x) => write!(f, "{x}"),
            Literal::Long(x) => write!(f, "{x}"),
            Literal::Float(x) => write!(f, "{x}"),
            Literal::Double(x) => write!(f, "{x}"),
            Literal::String(x) => write!(f, "{x}"),
            Literal::Instant(x) => write!(f, "{}", x.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Literal::BigInteger(x) => write!(f, "{x}"),
            Literal::BigDecimal(x) => write!(f, "{x}"),
            Literal::Json(x) => write!(f, "{x}"),
            Literal::Array { elements, .. } => {
                write!(f, "[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{element}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Boolean(value)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Literal::Int(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Long(value)
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Double(value)
    }
}

impl From<i8> for Literal {
    fn from(value: i8) -> Self {
        Literal::Byte(value)
    }
}

impl From<i16> for Literal {
    fn from(value: i16) -> Self {
        Literal::Short(value)
    }
}

impl From<f32> for Literal {
    fn from(value: f32) -> Self {
        Literal::Float(value)
    }
}

impl From<char> for Literal {
    fn from(value: char) -> Self {
        Literal::Char(value)
    }
}

impl From<DateTime<Utc>> for Literal {
    fn from(value: DateTime<Utc>) -> Self {
        Literal::Instant(value)
    }
}

impl From<BigInt> for Literal {
    fn from(value: BigInt) -> Self {
        Literal::BigInteger(value)
    }
}

impl From<BigDecimal> for Literal {
    fn from(value: BigDecimal) -> Self {
        Literal::BigDecimal(value)
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::String(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::String(value)
    }
}

impl From<serde_json::Value> for Literal {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Literal::Null,
            value => Literal::Json(value),
        }
    }
}

impl<T: Into<Literal>> From<Option<T>> for Literal {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Literal::Null)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_compare_numeric_literals() {
        assert_eq!(Literal::Int(3).compare(&Literal::Long(3)), Some(Ordering::Equal));
        assert_eq!(
            Literal::Byte(-1).compare(&Literal::Double(0.5)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Literal::BigDecimal(BigDecimal::new(BigInt::from(125), 2)).compare(&Literal::Int(1)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            Literal::BigInteger(BigInt::from(10))
                .compare(&Literal::BigDecimal(BigDecimal::new(BigInt::from(105), 1))),
            Some(Ordering::Less)
        );
        assert_eq!(Literal::Int(1).compare(&Literal::Null), None);
        assert_eq!(Literal::Int(1).compare(&Literal::from("1")), None);
    }

    #[test]
    fn test_compare_instant_with_string() {
        let t = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            Literal::Instant(t).compare(&Literal::from("2019-12-31T23:59:59Z")),
            Some(Ordering::Greater)
        );
        assert_eq!(
            Literal::from("2020-01-01T00:00:00Z").compare(&Literal::Instant(t)),
            Some(Ordering::Equal)
        );
    }

    #[test]
    fn test_display_literal() {
        let t = Utc.with_ymd_and_hms(2021, 6, 1, 12, 30, 0).unwrap();
        assert_eq!(Literal::Instant(t).to_string(), "2021-06-01T12:30:00Z");
        let array = Literal::Array {
            element_type: DType::Int,
            elements: vec![Literal::Int(1), Literal::Null, Literal::Int(3)],
        };
        assert_eq!(array.to_string(), "[1, null, 3]");
        assert_eq!(array.data_type(), Some(DType::array_of(DType::Int)));
        assert_eq!(Literal::Json(serde_json::json!({"a": 1})).to_string(), r#"{"a":1}"#);
        assert_eq!(Literal::Null.data_type(), None);
    }

    #[test]
    fn test_literal_from_option() {
        assert_eq!(Literal::from(Some(5)), Literal::Int(5));
        assert_eq!(Literal::from(None::<i32>), Literal::Null);
    }
}
