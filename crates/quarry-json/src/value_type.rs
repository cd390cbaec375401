use std::str::FromStr;

use indexmap::IndexMap;
use quarry_common::spec::DType;
use serde_json::Value;

use crate::builder::{any_, array_, object_, skip_, tuple_, ArrayArgs, ObjectArgs, SkipArgs, TupleArgs};
use crate::defaults::{dtype_options, native_options};
use crate::error::{JsonError, JsonResult};
use crate::options::JsonOptions;

/// A plain value type that has a default JSON value option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeType {
    Bool,
    Int,
    Float,
    Str,
    DateTime,
    Object,
}

impl FromStr for NativeType {
    type Err = JsonError;

    fn from_str(s: &str) -> JsonResult<Self> {
        match s {
            "bool" => Ok(NativeType::Bool),
            "int" => Ok(NativeType::Int),
            "float" => Ok(NativeType::Float),
            "str" => Ok(NativeType::Str),
            "datetime" => Ok(NativeType::DateTime),
            "object" => Ok(NativeType::Object),
            _ => Err(JsonError::invalid(format!("unknown native type: {s}"))),
        }
    }
}

/// Anything that can be normalized into [`JsonOptions`] by [`json`].
#[derive(Debug, Clone, PartialEq)]
pub enum JsonValueType {
    /// An option that is already built.
    Options(JsonOptions),
    DType(DType),
    Native(NativeType),
    /// Shorthand for an object option with default flags.
    Fields(IndexMap<String, JsonValueType>),
    /// Shorthand for an array option. The list must have exactly one element.
    List(Vec<JsonValueType>),
    /// Shorthand for a tuple option with default flags.
    Tuple(Vec<JsonValueType>),
}

impl JsonValueType {
    pub fn fields<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<JsonValueType>,
    {
        JsonValueType::Fields(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn list(element: impl Into<JsonValueType>) -> Self {
        JsonValueType::List(vec![element.into()])
    }

    pub fn tuple<V: Into<JsonValueType>>(values: impl IntoIterator<Item = V>) -> Self {
        JsonValueType::Tuple(values.into_iter().map(Into::into).collect())
    }

    /// Reads a value type from its JSON rendering.
    ///
    /// * A string names a data type (e.g. `"long"` or `"string[]"`), or `"any"` / `"skip"`.
    /// * An array is a list of value types.
    /// * An object with the single key `"$tuple"`, `"$native"` or `"$options"` denotes
    ///   a tuple, a native type, or fully specified value options respectively.
    /// * Any other object maps field names to value types.
    pub fn from_json_value(value: &Value) -> JsonResult<Self> {
        match value {
            Value::String(s) => match s.as_str() {
                "any" => Ok(JsonValueType::Options(any_())),
                "skip" => Ok(JsonValueType::Options(skip_(SkipArgs::default())?)),
                _ => Ok(JsonValueType::DType(s.parse()?)),
            },
            Value::Array(elements) => Ok(JsonValueType::List(
                elements
                    .iter()
                    .map(JsonValueType::from_json_value)
                    .collect::<JsonResult<_>>()?,
            )),
            Value::Object(map) => {
                if map.len() == 1 {
                    if let Some(Value::Array(values)) = map.get("$tuple") {
                        return Ok(JsonValueType::Tuple(
                            values
                                .iter()
                                .map(JsonValueType::from_json_value)
                                .collect::<JsonResult<_>>()?,
                        ));
                    }
                    if let Some(Value::String(name)) = map.get("$native") {
                        return Ok(JsonValueType::Native(name.parse()?));
                    }
                    if let Some(options) = map.get("$options") {
                        let options = serde_json::from_value::<JsonOptions>(options.clone())?;
                        return Ok(JsonValueType::Options(options));
                    }
                }
                Ok(JsonValueType::Fields(
                    map.iter()
                        .map(|(k, v)| Ok((k.clone(), JsonValueType::from_json_value(v)?)))
                        .collect::<JsonResult<_>>()?,
                ))
            }
            _ => Err(JsonError::invalid(format!(
                "unexpected JSON value type description: {value}"
            ))),
        }
    }
}

impl From<JsonOptions> for JsonValueType {
    fn from(value: JsonOptions) -> Self {
        JsonValueType::Options(value)
    }
}

impl From<DType> for JsonValueType {
    fn from(value: DType) -> Self {
        JsonValueType::DType(value)
    }
}

impl From<NativeType> for JsonValueType {
    fn from(value: NativeType) -> Self {
        JsonValueType::Native(value)
    }
}

impl From<IndexMap<String, JsonValueType>> for JsonValueType {
    fn from(value: IndexMap<String, JsonValueType>) -> Self {
        JsonValueType::Fields(value)
    }
}

/// Normalizes a value type into JSON value options.
///
/// The variants are resolved in the order built option, data type, native type,
/// field map, list and tuple, recursing into composite members.
pub fn json(value: impl Into<JsonValueType>) -> JsonResult<JsonOptions> {
    match value.into() {
        JsonValueType::Options(options) => Ok(options),
        JsonValueType::DType(dtype) => dtype_options(&dtype),
        JsonValueType::Native(native) => native_options(native),
        JsonValueType::Fields(fields) => object_(fields, ObjectArgs::default()),
        JsonValueType::List(mut elements) => {
            if elements.len() != 1 {
                return Err(JsonError::invalid(
                    "Expected List as json type to have exactly one element",
                ));
            }
            array_(elements.remove(0), ArrayArgs::default())
        }
        JsonValueType::Tuple(values) => tuple_(values, TupleArgs::default()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json as json_value;

    use super::*;
    use crate::builder::{bool_, int_, long_, string_, BoolArgs, IntegerArgs, StringArgs};
    use crate::options::{RepeatedFieldBehavior, ValueOptions};

    #[test]
    fn test_list_is_array_of_element() -> JsonResult<()> {
        assert_eq!(
            json(JsonValueType::list(DType::Int))?,
            array_(json(DType::Int)?, ArrayArgs::default())?
        );
        assert_eq!(
            json(JsonValueType::list(NativeType::Str))?,
            array_(string_(StringArgs::default())?, ArrayArgs::default())?
        );
        Ok(())
    }

    #[test]
    fn test_list_arity() {
        for elements in [vec![], vec![DType::Int.into(), DType::String.into()]] {
            let error = json(JsonValueType::List(elements)).unwrap_err();
            assert!(matches!(error, JsonError::InvalidArgument(_)));
            assert!(error
                .to_string()
                .contains("Expected List as json type to have exactly one element"));
        }
    }

    #[test]
    fn test_fields_are_object() -> JsonResult<()> {
        let sugar = json(JsonValueType::fields([
            ("a", NativeType::Int),
            ("b", NativeType::Str),
        ]))?;
        let explicit = object_(
            [("a", json(NativeType::Int)?), ("b", json(NativeType::Str)?)],
            ObjectArgs::default(),
        )?;
        assert_eq!(sugar, explicit);
        let ValueOptions::Object(object) = sugar.value_options() else {
            panic!("expected object options");
        };
        assert_eq!(object.repeated_field_behavior, RepeatedFieldBehavior::UseFirst);
        assert!(object.allow_unknown_fields);
        Ok(())
    }

    #[test]
    fn test_tuple_preserves_slot_order() -> JsonResult<()> {
        let options = json(JsonValueType::tuple([NativeType::Bool, NativeType::Int]))?;
        let ValueOptions::Tuple(tuple) = options.value_options() else {
            panic!("expected tuple options");
        };
        assert_eq!(
            tuple.values,
            vec![
                bool_(BoolArgs::default())?,
                long_(IntegerArgs::default())?
            ]
        );
        Ok(())
    }

    #[test]
    fn test_explicit_options_take_precedence() -> JsonResult<()> {
        let options = int_(IntegerArgs {
            allow_string: true,
            ..Default::default()
        })?;
        assert_eq!(json(options.clone())?, options);
        Ok(())
    }

    #[test]
    fn test_from_json_value() -> JsonResult<()> {
        let value = json_value!({
            "id": "long",
            "tags": ["string"],
            "point": {"$tuple": ["double", "double"]},
            "when": {"$native": "datetime"},
            "extra": "any",
        });
        let value_type = JsonValueType::from_json_value(&value)?;
        let expected = JsonValueType::fields([
            ("id", JsonValueType::DType(DType::Long)),
            ("tags", JsonValueType::list(DType::String)),
            (
                "point",
                JsonValueType::tuple([DType::Double, DType::Double]),
            ),
            ("when", JsonValueType::Native(NativeType::DateTime)),
            ("extra", JsonValueType::Options(any_())),
        ]);
        assert_eq!(value_type, expected);
        assert!(JsonValueType::from_json_value(&json_value!(1)).is_err());
        assert!(JsonValueType::from_json_value(&json_value!("uint")).is_err());
        Ok(())
    }

    #[test]
    fn test_from_json_value_options() -> JsonResult<()> {
        let value = json_value!({"$options": {
            "type": "int",
            "allowMissing": false,
            "desiredTypes": ["int", "string"],
        }});
        let JsonValueType::Options(options) = JsonValueType::from_json_value(&value)? else {
            panic!("expected options");
        };
        assert_eq!(
            options,
            int_(IntegerArgs {
                allow_string: true,
                allow_missing: false,
                allow_null: false,
                ..Default::default()
            })?
        );
        Ok(())
    }

    #[test]
    fn test_from_json_value_options_with_default() -> JsonResult<()> {
        let value = serde_json::from_str::<serde_json::Value>(
            r#"{"$options": {"type": "long", "allowMissing": true, "desiredTypes": ["int", "null"], "onNull": 7}}"#,
        )?;
        let JsonValueType::Options(options) = JsonValueType::from_json_value(&value)? else {
            panic!("expected options");
        };
        let ValueOptions::Long(x) = options.value_options() else {
            panic!("expected long options: {options:?}");
        };
        assert_eq!(x.on_null, Some(7));
        Ok(())
    }
}
