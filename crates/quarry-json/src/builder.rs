//! Constructors for JSON value options.
//!
//! Every constructor takes an argument struct whose [`Default`] matches the
//! documented defaults, so callers only spell out what they change:
//!
//! ```
//! use quarry_json::{int_, IntegerArgs};
//!
//! let options = int_(IntegerArgs {
//!     allow_string: true,
//!     on_null: Some(0),
//!     ..Default::default()
//! });
//! assert!(options.is_ok());
//! ```

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use num_bigint::BigInt;

use crate::error::{JsonError, JsonResult};
use crate::options::{
    ArrayOptions, FieldMatching, InstantNumberFormat, InstantNumberOptions, JsonKind,
    JsonOptions, JsonValueTypes, ObjectKvOptions, ObjectOptions, RepeatedFieldBehavior,
    ScalarOptions, SkipOptions, TupleOptions, TypedObjectOptions, ValueOptions,
};
use crate::value_type::{json, JsonValueType};

fn desired(allow_null: bool) -> JsonValueTypes {
    JsonValueTypes::default().with(JsonKind::Null, allow_null)
}

#[derive(Debug, Clone)]
pub struct BoolArgs {
    pub allow_string: bool,
    pub allow_missing: bool,
    pub allow_null: bool,
    pub on_missing: Option<bool>,
    pub on_null: Option<bool>,
}

impl Default for BoolArgs {
    fn default() -> Self {
        Self {
            allow_string: false,
            allow_missing: true,
            allow_null: true,
            on_missing: None,
            on_null: None,
        }
    }
}

pub(crate) fn bool_options(args: BoolArgs) -> ValueOptions {
    let desired = desired(args.allow_null)
        .with(JsonKind::Bool, true)
        .with(JsonKind::String, args.allow_string);
    ValueOptions::Bool(
        ScalarOptions::new(args.allow_missing, desired).with_defaults(args.on_null, args.on_missing),
    )
}

pub fn bool_(args: BoolArgs) -> JsonResult<JsonOptions> {
    JsonOptions::try_new(bool_options(args))
}

#[derive(Debug, Clone)]
pub struct CharArgs {
    pub allow_missing: bool,
    pub allow_null: bool,
    pub on_missing: Option<char>,
    pub on_null: Option<char>,
}

impl Default for CharArgs {
    fn default() -> Self {
        Self {
            allow_missing: true,
            allow_null: true,
            on_missing: None,
            on_null: None,
        }
    }
}

pub(crate) fn char_options(args: CharArgs) -> ValueOptions {
    let desired = desired(args.allow_null).with(JsonKind::String, true);
    ValueOptions::Char(
        ScalarOptions::new(args.allow_missing, desired).with_defaults(args.on_null, args.on_missing),
    )
}

pub fn char_(args: CharArgs) -> JsonResult<JsonOptions> {
    JsonOptions::try_new(char_options(args))
}

/// Arguments for the integral kinds `byte_`, `short_`, `int_` and `long_`.
/// JSON decimals are truncated toward zero when `allow_decimal` is set.
#[derive(Debug, Clone)]
pub struct IntegerArgs<T> {
    pub allow_decimal: bool,
    pub allow_string: bool,
    pub allow_missing: bool,
    pub allow_null: bool,
    pub on_missing: Option<T>,
    pub on_null: Option<T>,
}

impl<T> Default for IntegerArgs<T> {
    fn default() -> Self {
        Self {
            allow_decimal: false,
            allow_string: false,
            allow_missing: true,
            allow_null: true,
            on_missing: None,
            on_null: None,
        }
    }
}

fn integer_options<T>(args: IntegerArgs<T>) -> ScalarOptions<T> {
    let desired = desired(args.allow_null)
        .with(JsonKind::Int, true)
        .with(JsonKind::Decimal, args.allow_decimal)
        .with(JsonKind::String, args.allow_string);
    ScalarOptions::new(args.allow_missing, desired).with_defaults(args.on_null, args.on_missing)
}

pub(crate) fn byte_options(args: IntegerArgs<i8>) -> ValueOptions {
    ValueOptions::Byte(integer_options(args))
}

pub(crate) fn short_options(args: IntegerArgs<i16>) -> ValueOptions {
    ValueOptions::Short(integer_options(args))
}

pub(crate) fn int_options(args: IntegerArgs<i32>) -> ValueOptions {
    ValueOptions::Int(integer_options(args))
}

pub(crate) fn long_options(args: IntegerArgs<i64>) -> ValueOptions {
    ValueOptions::Long(integer_options(args))
}

pub fn byte_(args: IntegerArgs<i8>) -> JsonResult<JsonOptions> {
    JsonOptions::try_new(byte_options(args))
}

pub fn short_(args: IntegerArgs<i16>) -> JsonResult<JsonOptions> {
    JsonOptions::try_new(short_options(args))
}

pub fn int_(args: IntegerArgs<i32>) -> JsonResult<JsonOptions> {
    JsonOptions::try_new(int_options(args))
}

pub fn long_(args: IntegerArgs<i64>) -> JsonResult<JsonOptions> {
    JsonOptions::try_new(long_options(args))
}

/// Arguments for the floating point kinds `float_` and `double_`.
#[derive(Debug, Clone)]
pub struct FloatArgs<T> {
    pub allow_string: bool,
    pub allow_missing: bool,
    pub allow_null: bool,
    pub on_missing: Option<T>,
    pub on_null: Option<T>,
}

impl<T> Default for FloatArgs<T> {
    fn default() -> Self {
        Self {
            allow_string: false,
            allow_missing: true,
            allow_null: true,
            on_missing: None,
            on_null: None,
        }
    }
}

fn floating_options<T>(args: FloatArgs<T>) -> ScalarOptions<T> {
    let desired = desired(args.allow_null)
        .with(JsonKind::Int, true)
        .with(JsonKind::Decimal, true)
        .with(JsonKind::String, args.allow_string);
    ScalarOptions::new(args.allow_missing, desired).with_defaults(args.on_null, args.on_missing)
}

pub(crate) fn float_options(args: FloatArgs<f32>) -> ValueOptions {
    ValueOptions::Float(floating_options(args))
}

pub(crate) fn double_options(args: FloatArgs<f64>) -> ValueOptions {
    ValueOptions::Double(floating_options(args))
}

pub fn float_(args: FloatArgs<f32>) -> JsonResult<JsonOptions> {
    JsonOptions::try_new(float_options(args))
}

pub fn double_(args: FloatArgs<f64>) -> JsonResult<JsonOptions> {
    JsonOptions::try_new(double_options(args))
}

#[derive(Debug, Clone)]
pub struct StringArgs {
    pub allow_int: bool,
    pub allow_decimal: bool,
    pub allow_bool: bool,
    pub allow_missing: bool,
    pub allow_null: bool,
    pub on_missing: Option<String>,
    pub on_null: Option<String>,
}

impl Default for StringArgs {
    fn default() -> Self {
        Self {
            allow_int: false,
            allow_decimal: false,
            allow_bool: false,
            allow_missing: true,
            allow_null: true,
            on_missing: None,
            on_null: None,
        }
    }
}

pub(crate) fn string_options(args: StringArgs) -> ValueOptions {
    let desired = desired(args.allow_null)
        .with(JsonKind::String, true)
        .with(JsonKind::Int, args.allow_int)
        .with(JsonKind::Decimal, args.allow_decimal)
        .with(JsonKind::Bool, args.allow_bool);
    ValueOptions::String(
        ScalarOptions::new(args.allow_missing, desired).with_defaults(args.on_null, args.on_missing),
    )
}

pub fn string_(args: StringArgs) -> JsonResult<JsonOptions> {
    JsonOptions::try_new(string_options(args))
}

/// Arguments for `instant_`.
/// Without a `number_format`, instants are parsed from RFC 3339 strings.
/// With a `number_format`, instants are parsed from epoch numbers in that unit.
#[derive(Debug, Clone)]
pub struct InstantArgs {
    pub allow_missing: bool,
    pub allow_null: bool,
    pub number_format: Option<InstantNumberFormat>,
    pub allow_decimal: bool,
    pub on_missing: Option<DateTime<Utc>>,
    pub on_null: Option<DateTime<Utc>>,
}

impl Default for InstantArgs {
    fn default() -> Self {
        Self {
            allow_missing: true,
            allow_null: true,
            number_format: None,
            allow_decimal: false,
            on_missing: None,
            on_null: None,
        }
    }
}

fn instant_options(args: InstantArgs) -> JsonResult<ValueOptions> {
    match args.number_format {
        Some(format) => {
            let desired = desired(args.allow_null)
                .with(JsonKind::Int, true)
                .with(JsonKind::Decimal, args.allow_decimal);
            Ok(ValueOptions::InstantNumber(InstantNumberOptions {
                format,
                allow_missing: args.allow_missing,
                desired_types: desired,
                on_null: args.on_null,
                on_missing: args.on_missing,
            }))
        }
        None => {
            if args.allow_decimal {
                return Err(JsonError::invalid(
                    "allow_decimal is only valid when using number_format",
                ));
            }
            Ok(instant_string_options(args))
        }
    }
}

pub(crate) fn instant_string_options(args: InstantArgs) -> ValueOptions {
    let desired = desired(args.allow_null).with(JsonKind::String, true);
    ValueOptions::Instant(
        ScalarOptions::new(args.allow_missing, desired).with_defaults(args.on_null, args.on_missing),
    )
}

pub fn instant_(args: InstantArgs) -> JsonResult<JsonOptions> {
    JsonOptions::try_new(instant_options(args)?)
}

#[derive(Debug, Clone)]
pub struct BigIntegerArgs {
    pub allow_string: bool,
    pub allow_decimal: bool,
    pub allow_missing: bool,
    pub allow_null: bool,
    pub on_missing: Option<BigInt>,
    pub on_null: Option<BigInt>,
}

impl Default for BigIntegerArgs {
    fn default() -> Self {
        Self {
            allow_string: false,
            allow_decimal: false,
            allow_missing: true,
            allow_null: true,
            on_missing: None,
            on_null: None,
        }
    }
}

pub(crate) fn big_integer_options(args: BigIntegerArgs) -> ValueOptions {
    let desired = desired(args.allow_null)
        .with(JsonKind::Int, true)
        .with(JsonKind::Decimal, args.allow_decimal)
        .with(JsonKind::String, args.allow_string);
    ValueOptions::BigInteger(
        ScalarOptions::new(args.allow_missing, desired).with_defaults(args.on_null, args.on_missing),
    )
}

pub fn big_integer_(args: BigIntegerArgs) -> JsonResult<JsonOptions> {
    JsonOptions::try_new(big_integer_options(args))
}

#[derive(Debug, Clone)]
pub struct BigDecimalArgs {
    pub allow_string: bool,
    pub allow_missing: bool,
    pub allow_null: bool,
    pub on_missing: Option<BigDecimal>,
    pub on_null: Option<BigDecimal>,
}

impl Default for BigDecimalArgs {
    fn default() -> Self {
        Self {
            allow_string: false,
            allow_missing: true,
            allow_null: true,
            on_missing: None,
            on_null: None,
        }
    }
}

pub(crate) fn big_decimal_options(args: BigDecimalArgs) -> ValueOptions {
    let desired = desired(args.allow_null)
        .with(JsonKind::Int, true)
        .with(JsonKind::Decimal, true)
        .with(JsonKind::String, args.allow_string);
    ValueOptions::BigDecimal(
        ScalarOptions::new(args.allow_missing, desired).with_defaults(args.on_null, args.on_missing),
    )
}

pub fn big_decimal_(args: BigDecimalArgs) -> JsonResult<JsonOptions> {
    JsonOptions::try_new(big_decimal_options(args))
}

#[derive(Debug, Clone)]
pub struct ObjectArgs {
    pub allow_unknown_fields: bool,
    pub allow_missing: bool,
    pub allow_null: bool,
    pub repeated_field_behavior: RepeatedFieldBehavior,
    /// Aliases, case-insensitive matching and repeated field behavior by field name.
    pub field_matching: IndexMap<String, FieldMatching>,
}

impl Default for ObjectArgs {
    fn default() -> Self {
        Self {
            allow_unknown_fields: true,
            allow_missing: true,
            allow_null: true,
            repeated_field_behavior: RepeatedFieldBehavior::UseFirst,
            field_matching: IndexMap::new(),
        }
    }
}

fn resolve_fields<K, V>(
    fields: impl IntoIterator<Item = (K, V)>,
) -> JsonResult<IndexMap<String, JsonOptions>>
where
    K: Into<String>,
    V: Into<JsonValueType>,
{
    fields
        .into_iter()
        .map(|(name, value)| Ok((name.into(), json(value)?)))
        .collect()
}

fn object_options(fields: IndexMap<String, JsonOptions>, args: ObjectArgs) -> ObjectOptions {
    ObjectOptions {
        fields,
        allow_unknown_fields: args.allow_unknown_fields,
        allow_missing: args.allow_missing,
        desired_types: desired(args.allow_null).with(JsonKind::Object, true),
        repeated_field_behavior: args.repeated_field_behavior,
        field_matching: args.field_matching,
    }
}

/// Builds an object option from a map of field names to value types.
/// Repeated fields in a JSON object are resolved at parse time per `repeated_field_behavior`.
pub fn object_<K, V>(
    fields: impl IntoIterator<Item = (K, V)>,
    args: ObjectArgs,
) -> JsonResult<JsonOptions>
where
    K: Into<String>,
    V: Into<JsonValueType>,
{
    let fields = resolve_fields(fields)?;
    JsonOptions::try_new(ValueOptions::Object(object_options(fields, args)))
}

#[derive(Debug, Clone)]
pub struct ArrayArgs {
    pub allow_missing: bool,
    pub allow_null: bool,
}

impl Default for ArrayArgs {
    fn default() -> Self {
        Self {
            allow_missing: true,
            allow_null: true,
        }
    }
}

pub(crate) fn array_options(element: JsonOptions, args: ArrayArgs) -> ValueOptions {
    ValueOptions::Array(ArrayOptions {
        element,
        allow_missing: args.allow_missing,
        desired_types: desired(args.allow_null).with(JsonKind::Array, true),
    })
}

pub fn array_(element: impl Into<JsonValueType>, args: ArrayArgs) -> JsonResult<JsonOptions> {
    JsonOptions::try_new(array_options(json(element)?, args))
}

#[derive(Debug, Clone)]
pub struct ObjectKvArgs {
    /// Defaults to string options.
    pub key_element: Option<JsonValueType>,
    /// Defaults to any options.
    pub value_element: Option<JsonValueType>,
    pub allow_missing: bool,
    pub allow_null: bool,
}

impl Default for ObjectKvArgs {
    fn default() -> Self {
        Self {
            key_element: None,
            value_element: None,
            allow_missing: true,
            allow_null: true,
        }
    }
}

pub fn object_kv_(args: ObjectKvArgs) -> JsonResult<JsonOptions> {
    let key = match args.key_element {
        Some(x) => json(x)?,
        None => string_(StringArgs::default())?,
    };
    let value = match args.value_element {
        Some(x) => json(x)?,
        None => any_(),
    };
    JsonOptions::try_new(ValueOptions::ObjectKv(ObjectKvOptions {
        key,
        value,
        allow_missing: args.allow_missing,
        desired_types: desired(args.allow_null).with(JsonKind::Object, true),
    }))
}

#[derive(Debug, Clone)]
pub struct TupleArgs {
    pub allow_missing: bool,
    pub allow_null: bool,
}

impl Default for TupleArgs {
    fn default() -> Self {
        Self {
            allow_missing: true,
            allow_null: true,
        }
    }
}

/// Builds a tuple option whose slots are, in order, the given value types.
pub fn tuple_<V: Into<JsonValueType>>(
    values: impl IntoIterator<Item = V>,
    args: TupleArgs,
) -> JsonResult<JsonOptions> {
    let values = values
        .into_iter()
        .map(json)
        .collect::<JsonResult<Vec<_>>>()?;
    JsonOptions::try_new(ValueOptions::Tuple(TupleOptions {
        values,
        allow_missing: args.allow_missing,
        desired_types: desired(args.allow_null).with(JsonKind::Array, true),
    }))
}

#[derive(Debug, Clone)]
pub struct TypedObjectArgs {
    pub shared_fields: IndexMap<String, JsonValueType>,
    pub allow_unknown_types: bool,
    pub allow_missing: bool,
    pub allow_null: bool,
    pub repeated_field_behavior: RepeatedFieldBehavior,
}

impl Default for TypedObjectArgs {
    fn default() -> Self {
        Self {
            shared_fields: IndexMap::new(),
            allow_unknown_types: true,
            allow_missing: true,
            allow_null: true,
            repeated_field_behavior: RepeatedFieldBehavior::UseFirst,
        }
    }
}

/// Builds a discriminated union of objects.
/// The value of `type_field` selects the object option in `objects` for the rest of the fields.
pub fn typed_object_<K, V>(
    type_field: impl Into<String>,
    objects: impl IntoIterator<Item = (K, V)>,
    args: TypedObjectArgs,
) -> JsonResult<JsonOptions>
where
    K: Into<String>,
    V: Into<JsonValueType>,
{
    let objects = objects
        .into_iter()
        .map(|(tag, value)| {
            let tag = tag.into();
            match json(value)?.value_options() {
                ValueOptions::Object(x) => Ok((tag, x.clone())),
                other => Err(JsonError::invalid(format!(
                    "typed_object options for type '{tag}' must be object options, found {}",
                    other.kind_name()
                ))),
            }
        })
        .collect::<JsonResult<IndexMap<_, _>>>()?;
    JsonOptions::try_new(ValueOptions::TypedObject(TypedObjectOptions {
        type_field: type_field.into(),
        shared_fields: resolve_fields(args.shared_fields)?,
        objects,
        allow_unknown_types: args.allow_unknown_types,
        allow_missing: args.allow_missing,
        desired_types: desired(args.allow_null).with(JsonKind::Object, true),
        repeated_field_behavior: args.repeated_field_behavior,
    }))
}

pub fn any_() -> JsonOptions {
    JsonOptions::new_unchecked(ValueOptions::Any)
}

#[derive(Debug, Clone)]
pub struct SkipArgs {
    pub allow_missing: bool,
    pub allow_null: bool,
    pub allow_int: bool,
    pub allow_decimal: bool,
    pub allow_string: bool,
    pub allow_bool: bool,
    pub allow_object: bool,
    pub allow_array: bool,
}

impl Default for SkipArgs {
    fn default() -> Self {
        Self {
            allow_missing: true,
            allow_null: true,
            allow_int: true,
            allow_decimal: true,
            allow_string: true,
            allow_bool: true,
            allow_object: true,
            allow_array: true,
        }
    }
}

pub fn skip_(args: SkipArgs) -> JsonResult<JsonOptions> {
    let desired = desired(args.allow_null)
        .with(JsonKind::Int, args.allow_int)
        .with(JsonKind::Decimal, args.allow_decimal)
        .with(JsonKind::String, args.allow_string)
        .with(JsonKind::Bool, args.allow_bool)
        .with(JsonKind::Object, args.allow_object)
        .with(JsonKind::Array, args.allow_array);
    JsonOptions::try_new(ValueOptions::Skip(SkipOptions {
        allow_missing: args.allow_missing,
        desired_types: desired,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::JsonKind::{Decimal as DecimalKind, Int, Null, String as StringKind};

    fn scalar_parts(options: &JsonOptions) -> (bool, JsonValueTypes) {
        let options = options.value_options();
        (
            options.allow_missing(),
            options.desired_types().cloned().unwrap_or_default(),
        )
    }

    #[test]
    fn test_flags_are_propagated() -> JsonResult<()> {
        let options = long_(IntegerArgs {
            allow_decimal: true,
            allow_string: true,
            allow_missing: false,
            allow_null: false,
            ..Default::default()
        })?;
        assert_eq!(
            scalar_parts(&options),
            (false, JsonValueTypes::of([Int, DecimalKind, StringKind]))
        );
        let options = string_(StringArgs {
            allow_int: true,
            ..Default::default()
        })?;
        assert_eq!(
            scalar_parts(&options),
            (true, JsonValueTypes::of([StringKind, Int, Null]))
        );
        Ok(())
    }

    #[test]
    fn test_falsy_defaults_are_kept() -> JsonResult<()> {
        let options = int_(IntegerArgs {
            on_null: Some(0),
            on_missing: Some(0),
            ..Default::default()
        })?;
        let ValueOptions::Int(x) = options.value_options() else {
            panic!("expected int options");
        };
        assert_eq!((x.on_null, x.on_missing), (Some(0), Some(0)));
        let options = bool_(BoolArgs {
            on_null: Some(false),
            ..Default::default()
        })?;
        let ValueOptions::Bool(x) = options.value_options() else {
            panic!("expected bool options");
        };
        assert_eq!(x.on_null, Some(false));
        let options = string_(StringArgs {
            on_missing: Some(String::new()),
            ..Default::default()
        })?;
        let ValueOptions::String(x) = options.value_options() else {
            panic!("expected string options");
        };
        assert_eq!(x.on_missing.as_deref(), Some(""));
        Ok(())
    }

    #[test]
    fn test_default_without_permission_fails() {
        let result = double_(FloatArgs {
            allow_null: false,
            on_null: Some(0.0),
            ..Default::default()
        });
        assert!(matches!(result, Err(JsonError::InvalidArgument(_))));
        let result = char_(CharArgs {
            allow_missing: false,
            on_missing: Some('x'),
            ..Default::default()
        });
        assert!(matches!(result, Err(JsonError::InvalidArgument(_))));
    }

    #[test]
    fn test_instant_decimal_requires_number_format() -> JsonResult<()> {
        let error = instant_(InstantArgs {
            allow_decimal: true,
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(
            error.to_string(),
            "invalid argument: allow_decimal is only valid when using number_format"
        );
        let options = instant_(InstantArgs {
            number_format: Some(InstantNumberFormat::EpochMillis),
            allow_decimal: true,
            ..Default::default()
        })?;
        let ValueOptions::InstantNumber(x) = options.value_options() else {
            panic!("expected instant number options");
        };
        assert_eq!(x.format, InstantNumberFormat::EpochMillis);
        assert!(x.desired_types.contains(DecimalKind));
        Ok(())
    }

    #[test]
    fn test_repeated_field_behavior_is_propagated() -> JsonResult<()> {
        let options = object_(
            [("a", long_(IntegerArgs::default())?)],
            ObjectArgs {
                repeated_field_behavior: RepeatedFieldBehavior::Error,
                ..Default::default()
            },
        )?;
        let ValueOptions::Object(x) = options.value_options() else {
            panic!("expected object options");
        };
        assert_eq!(x.repeated_field_behavior, RepeatedFieldBehavior::Error);
        Ok(())
    }

    #[test]
    fn test_object_kv_defaults() -> JsonResult<()> {
        let options = object_kv_(ObjectKvArgs::default())?;
        let ValueOptions::ObjectKv(x) = options.value_options() else {
            panic!("expected object_kv options");
        };
        assert_eq!(x.key, string_(StringArgs::default())?);
        assert_eq!(x.value, any_());
        let tuple_key = object_kv_(ObjectKvArgs {
            key_element: Some(JsonValueType::tuple([
                quarry_common::spec::DType::Int,
                quarry_common::spec::DType::Int,
            ])),
            ..Default::default()
        });
        assert!(tuple_key.is_err());
        Ok(())
    }

    #[test]
    fn test_typed_object_validation() -> JsonResult<()> {
        let quote = JsonValueType::fields([("bid", quarry_common::spec::DType::Double)]);
        let args = TypedObjectArgs {
            shared_fields: [("symbol".to_string(), quarry_common::spec::DType::String.into())]
                .into_iter()
                .collect(),
            ..Default::default()
        };
        let options = typed_object_("type", [("quote", quote.clone())], args.clone())?;
        let ValueOptions::TypedObject(x) = options.value_options() else {
            panic!("expected typed_object options");
        };
        assert_eq!(x.type_field, "type");
        assert!(x.objects.contains_key("quote"));

        assert!(typed_object_("symbol", [("quote", quote.clone())], args.clone()).is_err());
        let strict = object_(
            [("bid", quarry_common::spec::DType::Double)],
            ObjectArgs {
                allow_missing: false,
                ..Default::default()
            },
        )?;
        assert!(typed_object_("type", [("quote", strict)], args.clone()).is_err());
        assert!(
            typed_object_("type", [("quote", quarry_common::spec::DType::Int)], args).is_err()
        );
        Ok(())
    }

    #[test]
    fn test_skip_defaults_accept_everything() -> JsonResult<()> {
        let options = skip_(SkipArgs::default())?;
        assert_eq!(
            options.value_options().desired_types(),
            Some(&JsonValueTypes::all())
        );
        Ok(())
    }
}
