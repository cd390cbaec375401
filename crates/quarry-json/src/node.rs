use std::fmt;
use std::str::FromStr;

use serde::de::{Error, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Number, Value};

use crate::error::JsonResult;
use crate::options::JsonKind;

/// A parsed JSON document.
///
/// Unlike [`serde_json::Value`], object entries keep their source order and
/// repeated keys are preserved, so that value options can decide how to treat them.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonNode {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<JsonNode>),
    Object(Vec<(String, JsonNode)>),
}

impl JsonNode {
    pub fn parse_str(text: &str) -> JsonResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn parse_slice(data: &[u8]) -> JsonResult<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Parses a sequence of concatenated or whitespace-separated JSON values.
    pub fn parse_stream(data: &[u8]) -> impl Iterator<Item = JsonResult<JsonNode>> + '_ {
        serde_json::Deserializer::from_slice(data)
            .into_iter::<JsonNode>()
            .map(|x| x.map_err(Into::into))
    }

    pub fn kind(&self) -> JsonKind {
        match self {
            JsonNode::Null => JsonKind::Null,
            JsonNode::Bool(_) => JsonKind::Bool,
            JsonNode::Number(n) if is_integer_literal(n) => JsonKind::Int,
            JsonNode::Number(_) => JsonKind::Decimal,
            JsonNode::String(_) => JsonKind::String,
            JsonNode::Array(_) => JsonKind::Array,
            JsonNode::Object(_) => JsonKind::Object,
        }
    }

    /// Converts the node into a [`serde_json::Value`].
    /// Only the first occurrence of a repeated key is kept.
    pub fn to_value(&self) -> Value {
        match self {
            JsonNode::Null => Value::Null,
            JsonNode::Bool(x) => Value::Bool(*x),
            JsonNode::Number(x) => Value::Number(x.clone()),
            JsonNode::String(x) => Value::String(x.clone()),
            JsonNode::Array(x) => Value::Array(x.iter().map(JsonNode::to_value).collect()),
            JsonNode::Object(entries) => {
                let mut map = Map::new();
                for (key, value) in entries {
                    if !map.contains_key(key) {
                        map.insert(key.clone(), value.to_value());
                    }
                }
                Value::Object(map)
            }
        }
    }
}

/// Whether the number was written without a fraction or an exponent.
pub(crate) fn is_integer_literal(number: &Number) -> bool {
    !number.as_str().contains(['.', 'e', 'E'])
}

impl From<Value> for JsonNode {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => JsonNode::Null,
            Value::Bool(x) => JsonNode::Bool(x),
            Value::Number(x) => JsonNode::Number(x),
            Value::String(x) => JsonNode::String(x),
            Value::Array(x) => JsonNode::Array(x.into_iter().map(JsonNode::from).collect()),
            Value::Object(x) => {
                JsonNode::Object(x.into_iter().map(|(k, v)| (k, JsonNode::from(v))).collect())
            }
        }
    }
}

/// The key under which serde_json passes the text of an arbitrary-precision number.
const NUMBER_TOKEN: &str = "$serde_json::private::Number";

struct JsonNodeVisitor;

impl<'de> Visitor<'de> for JsonNodeVisitor {
    type Value = JsonNode;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("any valid JSON value")
    }

    fn visit_bool<E>(self, v: bool) -> Result<JsonNode, E> {
        Ok(JsonNode::Bool(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<JsonNode, E> {
        Ok(JsonNode::Number(v.into()))
    }

    fn visit_u64<E>(self, v: u64) -> Result<JsonNode, E> {
        Ok(JsonNode::Number(v.into()))
    }

    fn visit_f64<E>(self, v: f64) -> Result<JsonNode, E> {
        Ok(Number::from_f64(v).map_or(JsonNode::Null, JsonNode::Number))
    }

    fn visit_str<E>(self, v: &str) -> Result<JsonNode, E> {
        Ok(JsonNode::String(v.to_string()))
    }

    fn visit_string<E>(self, v: String) -> Result<JsonNode, E> {
        Ok(JsonNode::String(v))
    }

    fn visit_none<E>(self) -> Result<JsonNode, E> {
        Ok(JsonNode::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<JsonNode, D::Error>
    where
        D: Deserializer<'de>,
    {
        Deserialize::deserialize(deserializer)
    }

    fn visit_unit<E>(self) -> Result<JsonNode, E> {
        Ok(JsonNode::Null)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<JsonNode, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut elements = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(element) = seq.next_element()? {
            elements.push(element);
        }
        Ok(JsonNode::Array(elements))
    }

    fn visit_map<A>(self, mut map: A) -> Result<JsonNode, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        let Some(first) = map.next_key::<String>()? else {
            return Ok(JsonNode::Object(entries));
        };
        if first == NUMBER_TOKEN {
            let text = map.next_value::<String>()?;
            return Number::from_str(&text)
                .map(JsonNode::Number)
                .map_err(A::Error::custom);
        }
        entries.push((first, map.next_value()?));
        while let Some((key, value)) = map.next_entry::<String, JsonNode>()? {
            entries.push((key, value));
        }
        Ok(JsonNode::Object(entries))
    }
}

impl<'de> Deserialize<'de> for JsonNode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(JsonNodeVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_keys_are_preserved() -> JsonResult<()> {
        let node = JsonNode::parse_str(r#"{"a": 1, "b": 2, "a": 3}"#)?;
        let JsonNode::Object(entries) = &node else {
            panic!("expected an object: {node:?}");
        };
        let keys = entries.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>();
        assert_eq!(keys, vec!["a", "b", "a"]);
        assert_eq!(node.to_value(), serde_json::json!({"a": 1, "b": 2}));
        Ok(())
    }

    #[test]
    fn test_kind() -> JsonResult<()> {
        assert_eq!(JsonNode::parse_str("1")?.kind(), JsonKind::Int);
        assert_eq!(JsonNode::parse_str("-1")?.kind(), JsonKind::Int);
        assert_eq!(JsonNode::parse_str("1.5")?.kind(), JsonKind::Decimal);
        assert_eq!(JsonNode::parse_str("1e3")?.kind(), JsonKind::Decimal);
        assert_eq!(
            JsonNode::parse_str("123456789012345678901234567890")?.kind(),
            JsonKind::Int
        );
        assert_eq!(JsonNode::parse_str("1E400")?.kind(), JsonKind::Decimal);
        assert_eq!(JsonNode::parse_str("\"x\"")?.kind(), JsonKind::String);
        assert_eq!(JsonNode::parse_str("null")?.kind(), JsonKind::Null);
        assert_eq!(JsonNode::parse_str("[]")?.kind(), JsonKind::Array);
        Ok(())
    }

    #[test]
    fn test_number_text_is_preserved() -> JsonResult<()> {
        let text = "[18446744073709551616, 3.14159265358979323846264338327950288, 1.50]";
        let JsonNode::Array(elements) = JsonNode::parse_str(text)? else {
            panic!("expected an array");
        };
        let numbers = elements
            .iter()
            .map(|x| match x {
                JsonNode::Number(n) => n.to_string(),
                other => panic!("expected a number: {other:?}"),
            })
            .collect::<Vec<_>>();
        assert_eq!(
            numbers,
            vec![
                "18446744073709551616",
                "3.14159265358979323846264338327950288",
                "1.50"
            ]
        );
        Ok(())
    }

    #[test]
    fn test_parse_stream() -> JsonResult<()> {
        let nodes = JsonNode::parse_stream(b"{\"a\": 1} {\"a\": 2}\n[3]")
            .collect::<JsonResult<Vec<_>>>()?;
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[2], JsonNode::Array(vec![JsonNode::Number(3.into())]));
        Ok(())
    }
}
