use std::fmt::Display;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use quarry_common::spec::{DType, Literal};

use crate::error::{TableError, TableResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ColumnType {
    #[default]
    Normal,
    Partitioning,
}

impl Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnType::Normal => write!(f, "normal"),
            ColumnType::Partitioning => write!(f, "partitioning"),
        }
    }
}

/// The name and type of a table column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnDefinition {
    name: String,
    data_type: DType,
    component_type: Option<DType>,
    column_type: ColumnType,
}

impl ColumnDefinition {
    /// Creates a column definition.
    /// For an array data type, the component type defaults to the array element type.
    pub fn of(
        name: impl Into<String>,
        data_type: DType,
        component_type: Option<DType>,
        column_type: ColumnType,
    ) -> TableResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(TableError::invalid("column name must not be empty"));
        }
        let component_type = match (data_type.component_type(), component_type) {
            (Some(element), None) => Some(element.clone()),
            (Some(element), Some(component)) if element == &component => Some(component),
            (Some(element), Some(component)) => {
                return Err(TableError::invalid(format!(
                    "component type {component} does not match the element type {element} of column {name}"
                )))
            }
            (None, Some(component)) => {
                return Err(TableError::invalid(format!(
                    "component type {component} is not allowed for non-array column {name} of type {data_type}"
                )))
            }
            (None, None) => None,
        };
        Ok(Self {
            name,
            data_type,
            component_type,
            column_type,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> &DType {
        &self.data_type
    }

    pub fn component_type(&self) -> Option<&DType> {
        self.component_type.as_ref()
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn is_partitioning(&self) -> bool {
        self.column_type == ColumnType::Partitioning
    }
}

/// A column definition together with the column data.
#[derive(Debug, Clone, PartialEq)]
pub struct InputColumn {
    definition: ColumnDefinition,
    data: Vec<Literal>,
}

impl InputColumn {
    pub fn new<T: Into<Literal>>(
        name: impl Into<String>,
        data_type: DType,
        component_type: Option<DType>,
        column_type: ColumnType,
        input_data: impl IntoIterator<Item = T>,
    ) -> TableResult<Self> {
        let name = name.into();
        Self::try_new(name.clone(), data_type, component_type, column_type, input_data).map_err(
            |e| TableError::construction(format!("failed to create an InputColumn ({name})."), e),
        )
    }

    fn try_new<T: Into<Literal>>(
        name: String,
        data_type: DType,
        component_type: Option<DType>,
        column_type: ColumnType,
        input_data: impl IntoIterator<Item = T>,
    ) -> TableResult<Self> {
        let definition = ColumnDefinition::of(name, data_type, component_type, column_type)?;
        let data = input_data
            .into_iter()
            .enumerate()
            .map(|(i, value)| {
                coerce(value.into(), definition.data_type())
                    .map_err(|e| TableError::invalid(format!("row {i}: {e}")))
            })
            .collect::<TableResult<Vec<_>>>()?;
        Ok(Self { definition, data })
    }

    pub fn definition(&self) -> &ColumnDefinition {
        &self.definition
    }

    pub fn name(&self) -> &str {
        self.definition.name()
    }

    pub fn data(&self) -> &[Literal] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_parts(self) -> (ColumnDefinition, Vec<Literal>) {
        (self.definition, self.data)
    }
}

fn integral(value: &Literal) -> Option<BigInt> {
    match value {
        Literal::Byte(x) => Some(BigInt::from(*x)),
        Literal::Short(x) => Some(BigInt::from(*x)),
        Literal::Int(x) => Some(BigInt::from(*x)),
        Literal::Long(x) => Some(BigInt::from(*x)),
        Literal::BigInteger(x) => Some(x.clone()),
        _ => None,
    }
}

fn floating(value: &Literal) -> Option<f64> {
    match value {
        Literal::Float(x) => Some(f64::from(*x)),
        Literal::Double(x) => Some(*x),
        Literal::BigDecimal(x) => x.to_f64(),
        other => integral(other)?.to_string().parse().ok(),
    }
}

fn narrow<T: TryFrom<BigInt>>(value: &Literal, target: &DType) -> Result<T, String> {
    let x = integral(value).ok_or_else(|| mismatch(value, target))?;
    T::try_from(x).map_err(|_| format!("value {value} is out of range for {target}"))
}

fn mismatch(value: &Literal, target: &DType) -> String {
    match value.data_type() {
        Some(t) => format!("cannot convert {value} of type {t} to {target}"),
        None => format!("cannot convert {value} to {target}"),
    }
}

/// Converts a literal to the given column data type.
/// Null is a valid value of every data type.
pub fn coerce(value: Literal, target: &DType) -> Result<Literal, String> {
    if value.is_null() || value.data_type().as_ref() == Some(target) {
        return Ok(value);
    }
    let out = match target {
        DType::Object => value,
        DType::Byte => Literal::Byte(narrow(&value, target)?),
        DType::Short => Literal::Short(narrow(&value, target)?),
        DType::Int => Literal::Int(narrow(&value, target)?),
        DType::Long => Literal::Long(narrow(&value, target)?),
        DType::BigInteger => {
            Literal::BigInteger(integral(&value).ok_or_else(|| mismatch(&value, target))?)
        }
        DType::Float => {
            Literal::Float(floating(&value).ok_or_else(|| mismatch(&value, target))? as f32)
        }
        DType::Double => {
            Literal::Double(floating(&value).ok_or_else(|| mismatch(&value, target))?)
        }
        DType::BigDecimal => {
            let x = match &value {
                Literal::Float(x) => BigDecimal::from_str(&x.to_string()).ok(),
                Literal::Double(x) => BigDecimal::from_str(&x.to_string()).ok(),
                other => integral(other).map(BigDecimal::from),
            };
            Literal::BigDecimal(x.ok_or_else(|| mismatch(&value, target))?)
        }
        DType::Char => match &value {
            Literal::String(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Literal::Char(c),
                    _ => return Err(format!("expected a single character, found {s:?}")),
                }
            }
            _ => return Err(mismatch(&value, target)),
        },
        DType::String => match &value {
            Literal::Char(c) => Literal::String(c.to_string()),
            _ => return Err(mismatch(&value, target)),
        },
        DType::Instant => match &value {
            Literal::String(s) => DateTime::parse_from_rfc3339(s)
                .map(|x| Literal::Instant(x.with_timezone(&Utc)))
                .map_err(|e| format!("invalid instant {s:?}: {e}"))?,
            other => {
                let nanos: i64 = narrow(other, target)?;
                Literal::Instant(DateTime::from_timestamp_nanos(nanos))
            }
        },
        DType::Array { component } => match value {
            Literal::Array { elements, .. } => Literal::Array {
                element_type: component.as_ref().clone(),
                elements: elements
                    .into_iter()
                    .map(|x| coerce(x, component))
                    .collect::<Result<Vec<_>, _>>()?,
            },
            other => return Err(mismatch(&other, target)),
        },
        DType::Boolean => return Err(mismatch(&value, target)),
    };
    Ok(out)
}

macro_rules! define_column_helper {
    ($name:ident, $data_type:expr, $doc:literal) => {
        #[doc = $doc]
        pub fn $name<T: Into<Literal>>(
            name: impl Into<String>,
            data: impl IntoIterator<Item = T>,
        ) -> TableResult<InputColumn> {
            InputColumn::new(name, $data_type, None, ColumnType::Normal, data)
        }
    };
}

define_column_helper!(bool_col, DType::Boolean, "Creates a boolean input column.");
define_column_helper!(byte_col, DType::Byte, "Creates a byte input column.");
define_column_helper!(char_col, DType::Char, "Creates a char input column.");
define_column_helper!(short_col, DType::Short, "Creates a short input column.");
define_column_helper!(int_col, DType::Int, "Creates an int input column.");
define_column_helper!(long_col, DType::Long, "Creates a long input column.");
define_column_helper!(float_col, DType::Float, "Creates a float input column.");
define_column_helper!(double_col, DType::Double, "Creates a double input column.");
define_column_helper!(string_col, DType::String, "Creates a string input column.");
define_column_helper!(
    datetime_col,
    DType::Instant,
    "Creates an instant input column from datetimes, RFC 3339 strings or epoch nanoseconds."
);
define_column_helper!(
    jobj_col,
    DType::Object,
    "Creates an input column of arbitrary JSON values."
);
