use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CommonError, CommonResult};

/// The logical type of a table column.
///
/// Every scalar kind that a JSON value option can produce has a corresponding variant.
/// Array columns carry the element type as `component`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum DType {
    Boolean,
    /// A single UTF-16 code unit on the wire, represented as a Rust `char`.
    Char,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    String,
    /// A point in time with nanosecond precision in UTC.
    Instant,
    BigInteger,
    BigDecimal,
    /// An opaque JSON value.
    Object,
    Array {
        component: Box<DType>,
    },
}

impl DType {
    pub fn array_of(component: DType) -> Self {
        DType::Array {
            component: Box::new(component),
        }
    }

    pub fn component_type(&self) -> Option<&DType> {
        match self {
            DType::Array { component } => Some(component),
            _ => None,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, DType::Array { .. })
    }

    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            DType::Boolean
                | DType::Char
                | DType::Byte
                | DType::Short
                | DType::Int
                | DType::Long
                | DType::Float
                | DType::Double
        )
    }
}

impl Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DType::Boolean => "bool",
            DType::Char => "char",
            DType::Byte => "byte",
            DType::Short => "short",
            DType::Int => "int",
            DType::Long => "long",
            DType::Float => "float",
            DType::Double => "double",
            DType::String => "string",
            DType::Instant => "instant",
            DType::BigInteger => "big_integer",
            DType::BigDecimal => "big_decimal",
            DType::Object => "object",
            DType::Array { component } => return write!(f, "{component}[]"),
        };
        write!(f, "{name}")
    }
}

impl FromStr for DType {
    type Err = CommonError;

    fn from_str(s: &str) -> CommonResult<Self> {
        let s = s.trim();
        if let Some(component) = s.strip_suffix("[]") {
            return Ok(DType::array_of(component.parse()?));
        }
        match s.to_lowercase().as_str() {
            "bool" | "boolean" => Ok(DType::Boolean),
            "char" => Ok(DType::Char),
            "byte" | "int8" => Ok(DType::Byte),
            "short" | "int16" => Ok(DType::Short),
            "int" | "int32" => Ok(DType::Int),
            "long" | "int64" => Ok(DType::Long),
            "float" | "float32" => Ok(DType::Float),
            "double" | "float64" => Ok(DType::Double),
            "string" | "str" => Ok(DType::String),
            "instant" | "datetime" => Ok(DType::Instant),
            "big_integer" | "biginteger" => Ok(DType::BigInteger),
            "big_decimal" | "bigdecimal" => Ok(DType::BigDecimal),
            "object" => Ok(DType::Object),
            _ => Err(CommonError::invalid(format!("unknown data type: {s}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_data_type() -> CommonResult<()> {
        assert_eq!("int".parse::<DType>()?, DType::Int);
        assert_eq!("int64".parse::<DType>()?, DType::Long);
        assert_eq!("datetime".parse::<DType>()?, DType::Instant);
        assert_eq!("double[]".parse::<DType>()?, DType::array_of(DType::Double));
        assert_eq!(
            "string[][]".parse::<DType>()?,
            DType::array_of(DType::array_of(DType::String))
        );
        assert!("uint".parse::<DType>().is_err());
        Ok(())
    }

    #[test]
    fn test_display_data_type() {
        assert_eq!(DType::BigDecimal.to_string(), "big_decimal");
        assert_eq!(DType::array_of(DType::Instant).to_string(), "instant[]");
    }

    #[test]
    fn test_component_type() {
        let array = DType::array_of(DType::Char);
        assert!(array.is_array());
        assert!(!array.is_primitive());
        assert_eq!(array.component_type(), Some(&DType::Char));
        assert_eq!(DType::Char.component_type(), None);
        assert!(DType::Char.is_primitive());
        assert!(!DType::String.is_primitive());
    }

    #[test]
    fn test_serde_data_type() -> Result<(), serde_json::Error> {
        let json = serde_json::to_string(&DType::array_of(DType::BigInteger))?;
        assert_eq!(json, r#"{"array":{"component":"bigInteger"}}"#);
        assert_eq!(
            serde_json::from_str::<DType>(&json)?,
            DType::array_of(DType::BigInteger)
        );
        Ok(())
    }
}
