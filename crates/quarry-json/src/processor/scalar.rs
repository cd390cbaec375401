use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use quarry_common::spec::Literal;
use serde_json::Number;

use crate::error::JsonResult;
use crate::node::{is_integer_literal, JsonNode};
use crate::options::{InstantNumberFormat, InstantNumberOptions, JsonKind, JsonValueTypes, ScalarOptions};
use crate::processor::context::Context;

/// The null and missing handling of a scalar option.
pub(crate) struct Leaf<'a, T> {
    kind: &'static str,
    allow_missing: bool,
    desired_types: &'a JsonValueTypes,
    on_null: Option<&'a T>,
    on_missing: Option<&'a T>,
}

impl<'a, T> Leaf<'a, T> {
    pub fn new(kind: &'static str, options: &'a ScalarOptions<T>) -> Self {
        Self {
            kind,
            allow_missing: options.allow_missing,
            desired_types: &options.desired_types,
            on_null: options.on_null.as_ref(),
            on_missing: options.on_missing.as_ref(),
        }
    }
}

impl<'a> From<&'a InstantNumberOptions> for Leaf<'a, DateTime<Utc>> {
    fn from(options: &'a InstantNumberOptions) -> Self {
        Self {
            kind: "instant_number",
            allow_missing: options.allow_missing,
            desired_types: &options.desired_types,
            on_null: options.on_null.as_ref(),
            on_missing: options.on_missing.as_ref(),
        }
    }
}

impl<T: Clone + Into<Literal>> Leaf<'_, T> {
    fn accepts(&self, kind: JsonKind) -> bool {
        self.desired_types.contains(kind)
    }

    /// Handles missing and null values and the accepted token kinds,
    /// and delegates everything else to `parse`.
    pub fn process<F>(&self, value: Option<&JsonNode>, ctx: &Context, parse: F) -> JsonResult<Literal>
    where
        F: FnOnce(&JsonNode) -> Result<T, String>,
    {
        match value {
            None => {
                if !self.allow_missing {
                    return Err(ctx.error(format!("missing value is not allowed for {}", self.kind)));
                }
                Ok(self.on_missing.cloned().map(Into::into).unwrap_or(Literal::Null))
            }
            Some(JsonNode::Null) => {
                if !self.accepts(JsonKind::Null) {
                    return Err(ctx.error(format!("null value is not allowed for {}", self.kind)));
                }
                Ok(self.on_null.cloned().map(Into::into).unwrap_or(Literal::Null))
            }
            Some(node) => {
                let kind = node.kind();
                if !self.accepts(kind) {
                    return Err(ctx.error(format!("unexpected {kind} value for {}", self.kind)));
                }
                parse(node).map(Into::into).map_err(|e| ctx.error(e))
            }
        }
    }
}

fn unexpected<T>(node: &JsonNode, target: &str) -> Result<T, String> {
    Err(format!("cannot parse {} value as {target}", node.kind()))
}

/// The largest number of integer digits a decimal is expanded to.
const MAX_INTEGER_DIGITS: i64 = 1000;

pub(crate) fn parse_decimal(text: &str) -> Result<BigDecimal, String> {
    BigDecimal::from_str(text).map_err(|e| format!("cannot parse '{text}' as decimal: {e}"))
}

/// Returns the integer part of a decimal, truncating toward zero.
fn integer_part(value: &BigDecimal) -> Result<BigInt, String> {
    let (_, scale) = value.as_bigint_and_exponent();
    let digits = i64::try_from(value.digits()).unwrap_or(i64::MAX);
    match digits.saturating_sub(scale) {
        x if x <= 0 => Ok(BigInt::default()),
        x if x > MAX_INTEGER_DIGITS => Err(format!("{value} has too many integer digits")),
        _ => Ok(value.with_scale(0).into_bigint_and_exponent().0),
    }
}

fn decimal_to_i64(value: &BigDecimal) -> Result<i64, String> {
    integer_part(value)?
        .to_i64()
        .ok_or_else(|| format!("{value} is out of range for a 64-bit integer"))
}

fn number_to_i64(number: &Number) -> Result<i64, String> {
    if let Some(x) = number.as_i64() {
        Ok(x)
    } else if is_integer_literal(number) {
        Err(format!("{number} is out of range for a 64-bit integer"))
    } else {
        decimal_to_i64(&number_to_decimal(number)?)
    }
}

fn number_to_decimal(number: &Number) -> Result<BigDecimal, String> {
    parse_decimal(number.as_str())
}

pub(crate) fn parse_bool(node: &JsonNode) -> Result<bool, String> {
    match node {
        JsonNode::Bool(x) => Ok(*x),
        JsonNode::String(s) => match s.as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(format!("cannot parse '{s}' as bool")),
        },
        _ => unexpected(node, "bool"),
    }
}

pub(crate) fn parse_char(node: &JsonNode) -> Result<char, String> {
    match node {
        JsonNode::String(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(c),
                _ => Err(format!("expected a single character, found '{s}'")),
            }
        }
        _ => unexpected(node, "char"),
    }
}

/// Parses an integral value. Decimals are truncated toward zero.
/// A string is parsed as a decimal when `allow_decimal` is set, and as an integer otherwise.
pub(crate) fn parse_integral<T>(
    node: &JsonNode,
    target: &str,
    allow_decimal: bool,
) -> Result<T, String>
where
    T: TryFrom<i64>,
{
    let value = match node {
        JsonNode::Number(n) => number_to_i64(n)?,
        JsonNode::String(s) if allow_decimal => decimal_to_i64(&parse_decimal(s)?)?,
        JsonNode::String(s) => s
            .parse::<i64>()
            .map_err(|e| format!("cannot parse '{s}' as {target}: {e}"))?,
        _ => return unexpected(node, target),
    };
    T::try_from(value).map_err(|_| format!("{value} is out of range for {target}"))
}

pub(crate) fn parse_f64(node: &JsonNode) -> Result<f64, String> {
    match node {
        JsonNode::Number(n) => n
            .as_f64()
            .ok_or_else(|| format!("{n} is out of range for double")),
        JsonNode::String(s) => s
            .parse::<f64>()
            .map_err(|e| format!("cannot parse '{s}' as double: {e}")),
        _ => unexpected(node, "double"),
    }
}

/// Parses a float. A finite value beyond the range of a float is an error.
pub(crate) fn parse_f32(node: &JsonNode) -> Result<f32, String> {
    let value = match node {
        JsonNode::String(s) => s
            .parse::<f32>()
            .map_err(|e| format!("cannot parse '{s}' as float: {e}"))?,
        _ => parse_f64(node)? as f32,
    };
    if value.is_infinite() {
        let wide = parse_f64(node)?;
        if wide.is_finite() {
            return Err(format!("{wide} is out of range for float"));
        }
    }
    Ok(value)
}

pub(crate) fn parse_string(node: &JsonNode) -> Result<String, String> {
    match node {
        JsonNode::String(s) => Ok(s.clone()),
        JsonNode::Number(n) => Ok(n.to_string()),
        JsonNode::Bool(b) => Ok(b.to_string()),
        _ => unexpected(node, "string"),
    }
}

pub(crate) fn parse_instant(node: &JsonNode) -> Result<DateTime<Utc>, String> {
    match node {
        JsonNode::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|x| x.with_timezone(&Utc))
            .map_err(|e| format!("cannot parse '{s}' as instant: {e}")),
        _ => unexpected(node, "instant"),
    }
}

/// Parses an epoch timestamp in the given unit.
pub(crate) fn parse_instant_number(
    node: &JsonNode,
    format: InstantNumberFormat,
    allow_decimal: bool,
) -> Result<DateTime<Utc>, String> {
    let scale = format.nanos_per_unit();
    let out_of_range = || format!("epoch value is out of range for unit {format}");
    let scaled = |value: BigDecimal| decimal_to_i64(&(value * BigDecimal::from(scale)));
    let nanos = match node {
        JsonNode::Number(n) if !is_integer_literal(n) => scaled(number_to_decimal(n)?)?,
        JsonNode::Number(n) => number_to_i64(n)?
            .checked_mul(scale)
            .ok_or_else(out_of_range)?,
        JsonNode::String(s) if allow_decimal => scaled(parse_decimal(s)?)?,
        JsonNode::String(s) => s
            .parse::<i64>()
            .map_err(|e| format!("cannot parse '{s}' as epoch value: {e}"))?
            .checked_mul(scale)
            .ok_or_else(out_of_range)?,
        _ => return unexpected(node, "instant"),
    };
    Ok(DateTime::from_timestamp_nanos(nanos))
}

pub(crate) fn parse_big_integer(node: &JsonNode, allow_decimal: bool) -> Result<BigInt, String> {
    match node {
        JsonNode::Number(n) if is_integer_literal(n) => BigInt::from_str(n.as_str())
            .map_err(|e| format!("cannot parse '{n}' as big integer: {e}")),
        JsonNode::Number(n) => integer_part(&number_to_decimal(n)?),
        JsonNode::String(s) => match BigInt::from_str(s) {
            Ok(x) => Ok(x),
            Err(_) if allow_decimal => integer_part(&parse_decimal(s)?),
            Err(e) => Err(format!("cannot parse '{s}' as big integer: {e}")),
        },
        _ => unexpected(node, "big integer"),
    }
}

/// Parses a decimal from the text of a number or a string, keeping every digit.
pub(crate) fn parse_big_decimal(node: &JsonNode) -> Result<BigDecimal, String> {
    match node {
        JsonNode::Number(n) => number_to_decimal(n),
        JsonNode::String(s) => parse_decimal(s),
        _ => unexpected(node, "big decimal"),
    }
}
