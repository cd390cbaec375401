//! Turns JSON documents into rows of literals as described by value options.

mod context;
mod process;
mod scalar;
mod schema;

use std::collections::HashSet;

use log::debug;
use quarry_common::config::NamingConfig;
use quarry_common::spec::{DType, Literal};

pub use schema::{OutputColumn, KEY_PATH, VALUE_PATH};

use crate::error::{JsonError, JsonResult};
use crate::node::JsonNode;
use crate::options::{JsonOptions, ValueOptions};
use crate::processor::context::Context;

/// Produces table rows from JSON values.
///
/// When the root option is an array option, every element of the root array is a row.
/// Otherwise every JSON value is a single row.
#[derive(Debug, Clone)]
pub struct JsonProcessor {
    options: JsonOptions,
    columns: Vec<OutputColumn>,
    names: Vec<String>,
}

impl JsonProcessor {
    pub fn try_new(options: JsonOptions, naming: &NamingConfig) -> JsonResult<Self> {
        let columns = match options.value_options() {
            ValueOptions::Array(x) => x.element.value_options().output_columns(),
            other => other.output_columns(),
        };
        let names = columns
            .iter()
            .map(|c| naming.column_name(&c.path))
            .collect::<Vec<_>>();
        let mut seen = HashSet::new();
        if let Some(name) = names.iter().find(|x| !seen.insert(x.as_str())) {
            return Err(JsonError::invalid(format!("duplicate output column name: {name}")));
        }
        debug!(
            "JSON processor with {} output columns: {}",
            names.len(),
            names.join(", ")
        );
        Ok(Self {
            options,
            columns,
            names,
        })
    }

    pub fn options(&self) -> &JsonOptions {
        &self.options
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn column_types(&self) -> impl Iterator<Item = &DType> {
        self.columns.iter().map(|c| &c.data_type)
    }

    /// Processes one JSON value into rows.
    /// `None` denotes a missing value.
    pub fn process(&self, value: Option<&JsonNode>) -> JsonResult<Vec<Vec<Literal>>> {
        let ctx = Context::root();
        match self.options.value_options() {
            ValueOptions::Array(x) => {
                self.options.value_options().check(value, &ctx)?;
                let element = x.element.value_options();
                match value {
                    Some(JsonNode::Array(items)) => items
                        .iter()
                        .enumerate()
                        .map(|(i, item)| {
                            let mut row = Vec::with_capacity(self.columns.len());
                            element.process(Some(item), &ctx.index(i), &mut row)?;
                            Ok(row)
                        })
                        .collect(),
                    _ => Ok(vec![]),
                }
            }
            other => {
                let mut row = Vec::with_capacity(self.columns.len());
                other.process(value, &ctx, &mut row)?;
                Ok(vec![row])
            }
        }
    }

    pub fn process_str(&self, text: &str) -> JsonResult<Vec<Vec<Literal>>> {
        self.process(Some(&JsonNode::parse_str(text)?))
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use chrono::{DateTime, Utc};
    use num_bigint::BigInt;

    use super::*;
    use crate::builder::*;
    use crate::options::{FieldMatching, InstantNumberFormat, RepeatedFieldBehavior};
    use crate::value_type::{json, JsonValueType, NativeType};

    fn processor(options: JsonOptions) -> JsonProcessor {
        JsonProcessor::try_new(options, &NamingConfig::default()).unwrap()
    }

    fn single_row(options: JsonOptions, text: &str) -> JsonResult<Vec<Literal>> {
        let mut rows = processor(options).process_str(text)?;
        assert_eq!(rows.len(), 1);
        Ok(rows.remove(0))
    }

    fn error_message(result: JsonResult<impl std::fmt::Debug>) -> String {
        result.unwrap_err().to_string()
    }

    #[test]
    fn test_column_names() -> JsonResult<()> {
        let options = json(JsonValueType::fields([
            ("id", JsonValueType::DType(DType::Long)),
            (
                "quote",
                JsonValueType::fields([("bid", DType::Double), ("ask", DType::Double)]),
            ),
            ("point", JsonValueType::tuple([DType::Int, DType::Int])),
        ]))?;
        assert_eq!(
            processor(options).column_names(),
            ["id", "quote_bid", "quote_ask", "point_0", "point_1"]
        );
        assert_eq!(processor(json(DType::Int)?).column_names(), ["Value"]);
        Ok(())
    }

    #[test]
    fn test_duplicate_column_names() -> JsonResult<()> {
        let options = json(JsonValueType::fields([
            ("a_b", JsonValueType::DType(DType::Int)),
            ("a", JsonValueType::fields([("b", DType::Int)])),
        ]))?;
        assert!(JsonProcessor::try_new(options, &NamingConfig::default()).is_err());
        Ok(())
    }

    #[test]
    fn test_missing_and_null_handling() -> JsonResult<()> {
        let options = object_(
            [
                ("a", int_(IntegerArgs::default())?),
                (
                    "b",
                    int_(IntegerArgs {
                        on_missing: Some(0),
                        on_null: Some(-1),
                        ..Default::default()
                    })?,
                ),
            ],
            ObjectArgs::default(),
        )?;
        assert_eq!(
            single_row(options.clone(), "{}")?,
            vec![Literal::Null, Literal::Int(0)]
        );
        assert_eq!(
            single_row(options.clone(), r#"{"a": null, "b": null}"#)?,
            vec![Literal::Null, Literal::Int(-1)]
        );
        assert_eq!(
            single_row(options, r#"{"a": 1, "b": 2}"#)?,
            vec![Literal::Int(1), Literal::Int(2)]
        );
        Ok(())
    }

    #[test]
    fn test_disallowed_missing_is_rejected() -> JsonResult<()> {
        let options = object_(
            [(
                "a",
                long_(IntegerArgs {
                    allow_missing: false,
                    ..Default::default()
                })?,
            )],
            ObjectArgs::default(),
        )?;
        let message = error_message(single_row(options, r#"{"b": 1}"#));
        assert!(message.contains("<root>/a"), "{message}");
        assert!(message.contains("missing value is not allowed"), "{message}");
        Ok(())
    }

    #[test]
    fn test_disallowed_null_is_rejected() -> JsonResult<()> {
        let options = double_(FloatArgs {
            allow_null: false,
            ..Default::default()
        })?;
        assert!(single_row(options, "null").is_err());
        Ok(())
    }

    #[test]
    fn test_coercions() -> JsonResult<()> {
        let options = json(JsonValueType::fields([
            (
                "i",
                JsonValueType::Options(int_(IntegerArgs {
                    allow_decimal: true,
                    allow_string: true,
                    ..Default::default()
                })?),
            ),
            (
                "s",
                JsonValueType::Options(string_(StringArgs {
                    allow_int: true,
                    allow_bool: true,
                    ..Default::default()
                })?),
            ),
            (
                "b",
                JsonValueType::Options(bool_(BoolArgs {
                    allow_string: true,
                    ..Default::default()
                })?),
            ),
            ("d", JsonValueType::DType(DType::Double)),
        ]))?;
        assert_eq!(
            single_row(options.clone(), r#"{"i": 3.9, "s": 12, "b": "true", "d": 1}"#)?,
            vec![
                Literal::Int(3),
                Literal::from("12"),
                Literal::Boolean(true),
                Literal::Double(1.0)
            ]
        );
        assert_eq!(
            single_row(options.clone(), r#"{"i": "-7.5", "s": false}"#)?,
            vec![
                Literal::Int(-7),
                Literal::from("false"),
                Literal::Null,
                Literal::Null
            ]
        );
        let message = error_message(single_row(options, r#"{"d": "1.5"}"#));
        assert!(message.contains("unexpected string value for double"), "{message}");
        Ok(())
    }

    #[test]
    fn test_integer_rejects_decimal_by_default() -> JsonResult<()> {
        assert!(single_row(json(DType::Long)?, "1.5").is_err());
        assert!(single_row(json(DType::Byte)?, "128").is_err());
        assert_eq!(single_row(json(DType::Byte)?, "-128")?, vec![Literal::Byte(-128)]);
        Ok(())
    }

    #[test]
    fn test_repeated_fields() -> JsonResult<()> {
        let text = r#"{"a": 1, "a": 2}"#;
        let use_first = json(JsonValueType::fields([("a", DType::Int)]))?;
        assert_eq!(single_row(use_first, text)?, vec![Literal::Int(1)]);
        let error = object_(
            [("a", DType::Int)],
            ObjectArgs {
                repeated_field_behavior: RepeatedFieldBehavior::Error,
                ..Default::default()
            },
        )?;
        let message = error_message(single_row(error, text));
        assert!(message.contains("field 'a' is repeated"), "{message}");
        Ok(())
    }

    #[test]
    fn test_unknown_fields() -> JsonResult<()> {
        let strict = object_(
            [("a", DType::Int)],
            ObjectArgs {
                allow_unknown_fields: false,
                ..Default::default()
            },
        )?;
        let message = error_message(single_row(strict, r#"{"a": 1, "b": 2}"#));
        assert!(message.contains("unexpected field 'b'"), "{message}");
        let lenient = json(JsonValueType::fields([("a", DType::Int)]))?;
        assert_eq!(
            single_row(lenient, r#"{"a": 1, "b": 2}"#)?,
            vec![Literal::Int(1)]
        );
        Ok(())
    }

    #[test]
    fn test_null_and_missing_objects() -> JsonResult<()> {
        let options = json(JsonValueType::fields([(
            "inner",
            JsonValueType::fields([
                ("x", JsonValueType::DType(DType::Int)),
                (
                    "y",
                    JsonValueType::Options(int_(IntegerArgs {
                        on_missing: Some(5),
                        on_null: Some(6),
                        ..Default::default()
                    })?),
                ),
            ]),
        )]))?;
        assert_eq!(
            single_row(options.clone(), r#"{"inner": null}"#)?,
            vec![Literal::Null, Literal::Int(6)]
        );
        assert_eq!(
            single_row(options, "{}")?,
            vec![Literal::Null, Literal::Int(5)]
        );
        Ok(())
    }

    #[test]
    fn test_nested_array_columns() -> JsonResult<()> {
        let options = json(JsonValueType::fields([(
            "points",
            JsonValueType::list(JsonValueType::fields([("x", DType::Int), ("y", DType::Int)])),
        )]))?;
        let processor = processor(options);
        assert_eq!(processor.column_names(), ["points_x", "points_y"]);
        assert_eq!(
            processor.column_types().cloned().collect::<Vec<_>>(),
            vec![DType::array_of(DType::Int), DType::array_of(DType::Int)]
        );
        let rows = processor.process_str(r#"{"points": [{"x": 1, "y": 2}, {"x": 3}]}"#)?;
        assert_eq!(
            rows,
            vec![vec![
                Literal::Array {
                    element_type: DType::Int,
                    elements: vec![Literal::Int(1), Literal::Int(3)],
                },
                Literal::Array {
                    element_type: DType::Int,
                    elements: vec![Literal::Int(2), Literal::Null],
                },
            ]]
        );
        let rows = processor.process_str(r#"{"points": null}"#)?;
        assert_eq!(rows, vec![vec![Literal::Null, Literal::Null]]);
        let message = error_message(processor.process_str(r#"{"points": [{"x": "1"}]}"#));
        assert!(message.contains("<root>/points[0]/x"), "{message}");
        Ok(())
    }

    #[test]
    fn test_root_array_rows() -> JsonResult<()> {
        let options = json(JsonValueType::list(JsonValueType::fields([
            ("name", NativeType::Str),
            ("age", NativeType::Int),
        ])))?;
        let processor = processor(options);
        assert_eq!(processor.column_names(), ["name", "age"]);
        let rows = processor.process_str(r#"[{"name": "a", "age": 1}, {"name": "b"}]"#)?;
        assert_eq!(
            rows,
            vec![
                vec![Literal::from("a"), Literal::Long(1)],
                vec![Literal::from("b"), Literal::Null],
            ]
        );
        assert!(processor.process_str("null")?.is_empty());
        assert!(processor.process(None)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_tuple() -> JsonResult<()> {
        let options = json(JsonValueType::tuple([DType::String, DType::Double]))?;
        assert_eq!(
            single_row(options.clone(), r#"["x", 1.5]"#)?,
            vec![Literal::from("x"), Literal::Double(1.5)]
        );
        assert_eq!(
            single_row(options.clone(), "null")?,
            vec![Literal::Null, Literal::Null]
        );
        let message = error_message(single_row(options, r#"["x"]"#));
        assert!(message.contains("expected a tuple of 2 elements, found 1"), "{message}");
        Ok(())
    }

    #[test]
    fn test_object_kv() -> JsonResult<()> {
        let options = object_kv_(ObjectKvArgs {
            value_element: Some(DType::Long.into()),
            ..Default::default()
        })?;
        let processor = processor(options);
        assert_eq!(processor.column_names(), ["Key", "Value"]);
        assert_eq!(
            processor.process_str(r#"{"a": 1, "b": 2}"#)?,
            vec![vec![
                Literal::Array {
                    element_type: DType::String,
                    elements: vec![Literal::from("a"), Literal::from("b")],
                },
                Literal::Array {
                    element_type: DType::Long,
                    elements: vec![Literal::Long(1), Literal::Long(2)],
                },
            ]]
        );
        Ok(())
    }

    #[test]
    fn test_typed_object() -> JsonResult<()> {
        let options = typed_object_(
            "type",
            [
                ("quote", JsonValueType::fields([("bid", DType::Double)])),
                ("trade", JsonValueType::fields([("price", DType::Double)])),
            ],
            TypedObjectArgs {
                shared_fields: [("symbol".to_string(), DType::String.into())]
                    .into_iter()
                    .collect(),
                allow_unknown_types: false,
                ..Default::default()
            },
        )?;
        let processor = processor(options);
        assert_eq!(
            processor.column_names(),
            ["type", "symbol", "quote_bid", "trade_price"]
        );
        assert_eq!(
            processor.process_str(r#"{"type": "trade", "symbol": "X", "price": 2.5}"#)?,
            vec![vec![
                Literal::from("trade"),
                Literal::from("X"),
                Literal::Null,
                Literal::Double(2.5)
            ]]
        );
        assert_eq!(
            processor.process_str("null")?,
            vec![vec![Literal::Null; 4]]
        );
        let message = error_message(processor.process_str(r#"{"type": "cancel"}"#));
        assert!(message.contains("unknown type 'cancel'"), "{message}");
        let message = error_message(processor.process_str(r#"{"symbol": "X"}"#));
        assert!(message.contains("missing type field 'type'"), "{message}");
        Ok(())
    }

    #[test]
    fn test_typed_object_unknown_types_allowed() -> JsonResult<()> {
        let options = typed_object_(
            "kind",
            [("a", JsonValueType::fields([("x", DType::Int)]))],
            TypedObjectArgs {
                shared_fields: [("id".to_string(), DType::Long.into())]
                    .into_iter()
                    .collect(),
                ..Default::default()
            },
        )?;
        assert_eq!(
            single_row(options, r#"{"kind": "b", "id": 9, "x": 1}"#)?,
            vec![Literal::from("b"), Literal::Long(9), Literal::Null]
        );
        Ok(())
    }

    #[test]
    fn test_instants_and_big_numbers() -> JsonResult<()> {
        let options = json(JsonValueType::fields([
            ("t", JsonValueType::DType(DType::Instant)),
            (
                "ms",
                JsonValueType::Options(instant_(InstantArgs {
                    number_format: Some(InstantNumberFormat::EpochMillis),
                    ..Default::default()
                })?),
            ),
            (
                "big",
                JsonValueType::Options(big_integer_(BigIntegerArgs {
                    allow_string: true,
                    ..Default::default()
                })?),
            ),
            ("dec", JsonValueType::DType(DType::BigDecimal)),
        ]))?;
        let row = single_row(
            options,
            r#"{"t": "2024-03-01T10:00:00+01:00", "ms": 0, "big": "99999999999999999999", "dec": 2.25}"#,
        )?;
        let t = DateTime::parse_from_rfc3339("2024-03-01T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(
            row,
            vec![
                Literal::Instant(t),
                Literal::Instant(DateTime::from_timestamp_nanos(0)),
                Literal::BigInteger(BigInt::from_str("99999999999999999999").unwrap()),
                Literal::BigDecimal(BigDecimal::from_str("2.25").unwrap()),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_any_and_skip() -> JsonResult<()> {
        let options = json(JsonValueType::fields([
            ("keep", JsonValueType::Options(any_())),
            ("drop", JsonValueType::Options(skip_(SkipArgs::default())?)),
        ]))?;
        let processor = processor(options);
        assert_eq!(processor.column_names(), ["keep"]);
        assert_eq!(
            processor.process_str(r#"{"keep": {"a": [1]}, "drop": [1, 2]}"#)?,
            vec![vec![Literal::Json(serde_json::json!({"a": [1]}))]]
        );
        let strict_skip = json(JsonValueType::fields([(
            "drop",
            skip_(SkipArgs {
                allow_array: false,
                ..Default::default()
            })?,
        )]))?;
        assert!(single_row(strict_skip, r#"{"drop": [1]}"#).is_err());
        Ok(())
    }

    #[test]
    fn test_big_numbers_keep_their_digits() -> JsonResult<()> {
        let big = "123456789012345678901234567890";
        assert_eq!(
            single_row(json(DType::BigInteger)?, big)?,
            vec![Literal::BigInteger(BigInt::from_str(big).unwrap())]
        );
        assert_eq!(
            single_row(json(DType::BigInteger)?, "18446744073709551616")?,
            vec![Literal::BigInteger(BigInt::from_str("18446744073709551616").unwrap())]
        );
        let pi = "3.14159265358979323846264338327950288";
        assert_eq!(
            single_row(json(DType::BigDecimal)?, pi)?,
            vec![Literal::BigDecimal(BigDecimal::from_str(pi).unwrap())]
        );
        assert_eq!(
            single_row(json(DType::BigDecimal)?, "1e40")?,
            vec![Literal::BigDecimal(BigDecimal::from_str("1e40").unwrap())]
        );
        let message = error_message(single_row(json(DType::Long)?, "18446744073709551616"));
        assert!(message.contains("out of range"), "{message}");
        Ok(())
    }

    #[test]
    fn test_float_overflow_is_rejected() -> JsonResult<()> {
        let message = error_message(single_row(json(DType::Float)?, "1e40"));
        assert!(message.contains("out of range for float"), "{message}");
        assert_eq!(
            single_row(json(DType::Double)?, "1e40")?,
            vec![Literal::Double(1e40)]
        );
        assert_eq!(single_row(json(DType::Float)?, "0.5")?, vec![Literal::Float(0.5)]);
        Ok(())
    }

    #[test]
    fn test_typed_object_repeated_type_field() -> JsonResult<()> {
        let objects = || [("quote", JsonValueType::fields([("bid", DType::Double)]))];
        let text = r#"{"type": "quote", "type": "trade", "bid": 1.5}"#;
        let lenient = typed_object_("type", objects(), TypedObjectArgs::default())?;
        assert_eq!(
            single_row(lenient, text)?,
            vec![Literal::from("quote"), Literal::Double(1.5)]
        );
        let strict = typed_object_(
            "type",
            objects(),
            TypedObjectArgs {
                repeated_field_behavior: RepeatedFieldBehavior::Error,
                ..Default::default()
            },
        )?;
        let message = error_message(single_row(strict, text));
        assert!(message.contains("field 'type' is repeated"), "{message}");
        Ok(())
    }

    fn matching(
        aliases: &[&str],
        case_insensitive_match: bool,
        repeated_behavior: Option<RepeatedFieldBehavior>,
    ) -> FieldMatching {
        FieldMatching {
            aliases: aliases.iter().map(|x| x.to_string()).collect(),
            case_insensitive_match,
            repeated_behavior,
        }
    }

    fn object_with_matching(
        fields: &[&str],
        field_matching: &[(&str, FieldMatching)],
    ) -> JsonResult<JsonOptions> {
        object_(
            fields.iter().map(|x| (x.to_string(), DType::Int)),
            ObjectArgs {
                allow_unknown_fields: false,
                field_matching: field_matching
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_field_aliases_and_case() -> JsonResult<()> {
        let case_insensitive =
            processor(object_with_matching(&["Foo"], &[("Foo", matching(&[], true, None))])?);
        assert_eq!(case_insensitive.column_names(), ["Foo"]);
        assert_eq!(case_insensitive.process_str(r#"{"fOO": 43}"#)?, vec![vec![Literal::Int(43)]]);

        let case_sensitive = processor(object_with_matching(&["Foo", "foo"], &[])?);
        assert_eq!(
            case_sensitive.process_str(r#"{"Foo": 42, "foo": 43}"#)?,
            vec![vec![Literal::Int(42), Literal::Int(43)]]
        );

        let alias = processor(object_with_matching(
            &["FooBar"],
            &[("FooBar", matching(&["Foo_Bar"], false, None))],
        )?);
        assert_eq!(alias.process_str(r#"{"Foo_Bar": 43}"#)?, vec![vec![Literal::Int(43)]]);
        assert!(alias.process_str(r#"{"foo_bar": 43}"#).is_err());

        let alias = processor(object_with_matching(
            &["FooBar"],
            &[("FooBar", matching(&["Foo_Bar"], true, None))],
        )?);
        assert_eq!(alias.process_str(r#"{"fOO_BAR": 43}"#)?, vec![vec![Literal::Int(43)]]);
        assert_eq!(alias.process_str(r#"{"fooBar": 42}"#)?, vec![vec![Literal::Int(42)]]);
        Ok(())
    }

    #[test]
    fn test_field_repeated_behavior() -> JsonResult<()> {
        let options = object_with_matching(
            &["a"],
            &[("a", matching(&["b"], false, Some(RepeatedFieldBehavior::Error)))],
        )?;
        let message = error_message(single_row(options, r#"{"a": 1, "b": 2}"#));
        assert!(message.contains("field 'a' is repeated"), "{message}");
        Ok(())
    }

    #[test]
    fn test_overlapping_field_names() {
        let message = error_message(object_with_matching(
            &["Foo", "foo"],
            &[("foo", matching(&[], true, None))],
        ));
        assert!(message.contains("found overlapping field name 'foo'"), "{message}");
        let message = error_message(object_with_matching(
            &["a"],
            &[("a", matching(&["A"], true, None))],
        ));
        assert!(message.contains("found 'A' overlaps"), "{message}");
        let message = error_message(object_with_matching(
            &["a"],
            &[("a", matching(&["a"], false, None))],
        ));
        assert!(message.contains("found 'a' overlaps"), "{message}");
        assert!(object_with_matching(&["a"], &[("b", matching(&[], true, None))]).is_err());
    }
}
