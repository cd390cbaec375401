use std::collections::BTreeSet;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use log::debug;
use num_bigint::BigInt;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{JsonError, JsonResult};

/// The kind of a JSON token as seen by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JsonKind {
    String,
    Null,
    Int,
    Decimal,
    Bool,
    Object,
    Array,
}

impl JsonKind {
    pub const ALL: [JsonKind; 7] = [
        JsonKind::String,
        JsonKind::Null,
        JsonKind::Int,
        JsonKind::Decimal,
        JsonKind::Bool,
        JsonKind::Object,
        JsonKind::Array,
    ];
}

impl Display for JsonKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            JsonKind::String => "string",
            JsonKind::Null => "null",
            JsonKind::Int => "int",
            JsonKind::Decimal => "decimal",
            JsonKind::Bool => "bool",
            JsonKind::Object => "object",
            JsonKind::Array => "array",
        };
        write!(f, "{name}")
    }
}

/// The set of JSON token kinds that a value option accepts.
/// Null values are allowed if and only if the set contains [`JsonKind::Null`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonValueTypes(BTreeSet<JsonKind>);

impl JsonValueTypes {
    pub fn of(kinds: impl IntoIterator<Item = JsonKind>) -> Self {
        Self(kinds.into_iter().collect())
    }

    pub fn all() -> Self {
        Self::of(JsonKind::ALL)
    }

    /// Adds the kind to the set when `enabled` is true.
    pub fn with(mut self, kind: JsonKind, enabled: bool) -> Self {
        if enabled {
            self.0.insert(kind);
        }
        self
    }

    pub fn contains(&self, kind: JsonKind) -> bool {
        self.0.contains(&kind)
    }

    pub fn allows_null(&self) -> bool {
        self.contains(JsonKind::Null)
    }

    pub fn is_subset(&self, other: &JsonValueTypes) -> bool {
        self.0.is_subset(&other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = JsonKind> + '_ {
        self.0.iter().copied()
    }
}

/// How an object option handles a field that appears more than once in a JSON object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RepeatedFieldBehavior {
    /// Fail when the field is repeated.
    Error,
    /// Keep the first occurrence and ignore the rest.
    #[default]
    UseFirst,
}

impl FromStr for RepeatedFieldBehavior {
    type Err = JsonError;

    fn from_str(s: &str) -> JsonResult<Self> {
        match s.to_lowercase().as_str() {
            "error" => Ok(RepeatedFieldBehavior::Error),
            "use_first" | "usefirst" => Ok(RepeatedFieldBehavior::UseFirst),
            _ => Err(JsonError::invalid(format!(
                "invalid repeated field behavior: {s}"
            ))),
        }
    }
}

/// How a field of an object option is matched against the keys of a JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMatching {
    /// Other keys that are read as this field.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub case_insensitive_match: bool,
    /// Overrides the repeated field behavior of the object for this field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeated_behavior: Option<RepeatedFieldBehavior>,
}

/// Matches the field name exactly.
pub(crate) static EXACT_MATCH: FieldMatching = FieldMatching {
    aliases: Vec::new(),
    case_insensitive_match: false,
    repeated_behavior: None,
};

fn same_name(a: &str, b: &str, case_insensitive: bool) -> bool {
    if case_insensitive {
        a.to_lowercase() == b.to_lowercase()
    } else {
        a == b
    }
}

impl FieldMatching {
    pub fn names<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> {
        std::iter::once(name).chain(self.aliases.iter().map(String::as_str))
    }

    /// Whether the key of a JSON object refers to the field `name`.
    pub fn matches(&self, name: &str, key: &str) -> bool {
        self.names(name)
            .any(|x| same_name(x, key, self.case_insensitive_match))
    }

    fn validate(&self, name: &str) -> JsonResult<()> {
        let names = self.names(name).collect::<Vec<_>>();
        for (i, alias) in names.iter().enumerate().skip(1) {
            if names[..i]
                .iter()
                .any(|x| same_name(x, alias, self.case_insensitive_match))
            {
                return Err(JsonError::invalid(format!(
                    "name and aliases must be non-overlapping, found '{alias}' overlaps"
                )));
            }
        }
        Ok(())
    }
}

/// The unit of an epoch timestamp number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InstantNumberFormat {
    EpochSeconds,
    EpochMillis,
    EpochMicros,
    EpochNanos,
}

impl InstantNumberFormat {
    pub fn nanos_per_unit(&self) -> i64 {
        match self {
            InstantNumberFormat::EpochSeconds => 1_000_000_000,
            InstantNumberFormat::EpochMillis => 1_000_000,
            InstantNumberFormat::EpochMicros => 1_000,
            InstantNumberFormat::EpochNanos => 1,
        }
    }
}

impl FromStr for InstantNumberFormat {
    type Err = JsonError;

    fn from_str(s: &str) -> JsonResult<Self> {
        match s {
            "s" => Ok(InstantNumberFormat::EpochSeconds),
            "ms" => Ok(InstantNumberFormat::EpochMillis),
            "us" => Ok(InstantNumberFormat::EpochMicros),
            "ns" => Ok(InstantNumberFormat::EpochNanos),
            _ => Err(JsonError::invalid(format!("Invalid number format: {s}"))),
        }
    }
}

impl Display for InstantNumberFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            InstantNumberFormat::EpochSeconds => "s",
            InstantNumberFormat::EpochMillis => "ms",
            InstantNumberFormat::EpochMicros => "us",
            InstantNumberFormat::EpochNanos => "ns",
        };
        write!(f, "{name}")
    }
}

/// Options shared by every scalar kind.
/// `on_null` and `on_missing` are substituted for a JSON null and an absent value respectively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalarOptions<T> {
    pub allow_missing: bool,
    pub desired_types: JsonValueTypes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_null: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_missing: Option<T>,
}

impl<T> ScalarOptions<T> {
    pub(crate) fn new(allow_missing: bool, desired_types: JsonValueTypes) -> Self {
        Self {
            allow_missing,
            desired_types,
            on_null: None,
            on_missing: None,
        }
    }

    pub(crate) fn with_defaults(mut self, on_null: Option<T>, on_missing: Option<T>) -> Self {
        self.on_null = on_null;
        self.on_missing = on_missing;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstantNumberOptions {
    pub format: InstantNumberFormat,
    pub allow_missing: bool,
    pub desired_types: JsonValueTypes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_null: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_missing: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectOptions {
    pub fields: IndexMap<String, JsonOptions>,
    pub allow_unknown_fields: bool,
    pub allow_missing: bool,
    pub desired_types: JsonValueTypes,
    #[serde(default)]
    pub repeated_field_behavior: RepeatedFieldBehavior,
    /// Fields without an entry match their exact name.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub field_matching: IndexMap<String, FieldMatching>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrayOptions {
    pub element: JsonOptions,
    pub allow_missing: bool,
    pub desired_types: JsonValueTypes,
}

/// A JSON object interpreted as a map from keys to values of a uniform shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectKvOptions {
    pub key: JsonOptions,
    pub value: JsonOptions,
    pub allow_missing: bool,
    pub desired_types: JsonValueTypes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TupleOptions {
    pub values: Vec<JsonOptions>,
    pub allow_missing: bool,
    pub desired_types: JsonValueTypes,
}

/// A JSON object whose shape is selected by the string value of `type_field`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedObjectOptions {
    pub type_field: String,
    pub shared_fields: IndexMap<String, JsonOptions>,
    pub objects: IndexMap<String, ObjectOptions>,
    pub allow_unknown_types: bool,
    pub allow_missing: bool,
    pub desired_types: JsonValueTypes,
    /// Applies to the type field and the shared fields.
    #[serde(default)]
    pub repeated_field_behavior: RepeatedFieldBehavior,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipOptions {
    pub allow_missing: bool,
    pub desired_types: JsonValueTypes,
}

/// A node of the value option tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ValueOptions {
    Bool(ScalarOptions<bool>),
    Char(ScalarOptions<char>),
    Byte(ScalarOptions<i8>),
    Short(ScalarOptions<i16>),
    Int(ScalarOptions<i32>),
    Long(ScalarOptions<i64>),
    Float(ScalarOptions<f32>),
    Double(ScalarOptions<f64>),
    String(ScalarOptions<String>),
    Instant(ScalarOptions<DateTime<Utc>>),
    InstantNumber(InstantNumberOptions),
    BigInteger(ScalarOptions<BigInt>),
    BigDecimal(ScalarOptions<BigDecimal>),
    Object(ObjectOptions),
    Array(ArrayOptions),
    ObjectKv(ObjectKvOptions),
    Tuple(TupleOptions),
    TypedObject(TypedObjectOptions),
    Any,
    Skip(SkipOptions),
}

impl ValueOptions {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ValueOptions::Bool(_) => "bool",
            ValueOptions::Char(_) => "char",
            ValueOptions::Byte(_) => "byte",
            ValueOptions::Short(_) => "short",
            ValueOptions::Int(_) => "int",
            ValueOptions::Long(_) => "long",
            ValueOptions::Float(_) => "float",
            ValueOptions::Double(_) => "double",
            ValueOptions::String(_) => "string",
            ValueOptions::Instant(_) => "instant",
            ValueOptions::InstantNumber(_) => "instant_number",
            ValueOptions::BigInteger(_) => "big_integer",
            ValueOptions::BigDecimal(_) => "big_decimal",
            ValueOptions::Object(_) => "object",
            ValueOptions::Array(_) => "array",
            ValueOptions::ObjectKv(_) => "object_kv",
            ValueOptions::Tuple(_) => "tuple",
            ValueOptions::TypedObject(_) => "typed_object",
            ValueOptions::Any => "any",
            ValueOptions::Skip(_) => "skip",
        }
    }

    pub fn allow_missing(&self) -> bool {
        match self {
            ValueOptions::Bool(x) => x.allow_missing,
            ValueOptions::Char(x) => x.allow_missing,
            ValueOptions::Byte(x) => x.allow_missing,
            ValueOptions::Short(x) => x.allow_missing,
            ValueOptions::Int(x) => x.allow_missing,
            ValueOptions::Long(x) => x.allow_missing,
            ValueOptions::Float(x) => x.allow_missing,
            ValueOptions::Double(x) => x.allow_missing,
            ValueOptions::String(x) => x.allow_missing,
            ValueOptions::Instant(x) => x.allow_missing,
            ValueOptions::InstantNumber(x) => x.allow_missing,
            ValueOptions::BigInteger(x) => x.allow_missing,
            ValueOptions::BigDecimal(x) => x.allow_missing,
            ValueOptions::Object(x) => x.allow_missing,
            ValueOptions::Array(x) => x.allow_missing,
            ValueOptions::ObjectKv(x) => x.allow_missing,
            ValueOptions::Tuple(x) => x.allow_missing,
            ValueOptions::TypedObject(x) => x.allow_missing,
            ValueOptions::Any => true,
            ValueOptions::Skip(x) => x.allow_missing,
        }
    }

    /// Returns the accepted JSON token kinds, or `None` if every kind is accepted.
    pub fn desired_types(&self) -> Option<&JsonValueTypes> {
        match self {
            ValueOptions::Bool(x) => Some(&x.desired_types),
            ValueOptions::Char(x) => Some(&x.desired_types),
            ValueOptions::Byte(x) => Some(&x.desired_types),
            ValueOptions::Short(x) => Some(&x.desired_types),
            ValueOptions::Int(x) => Some(&x.desired_types),
            ValueOptions::Long(x) => Some(&x.desired_types),
            ValueOptions::Float(x) => Some(&x.desired_types),
            ValueOptions::Double(x) => Some(&x.desired_types),
            ValueOptions::String(x) => Some(&x.desired_types),
            ValueOptions::Instant(x) => Some(&x.desired_types),
            ValueOptions::InstantNumber(x) => Some(&x.desired_types),
            ValueOptions::BigInteger(x) => Some(&x.desired_types),
            ValueOptions::BigDecimal(x) => Some(&x.desired_types),
            ValueOptions::Object(x) => Some(&x.desired_types),
            ValueOptions::Array(x) => Some(&x.desired_types),
            ValueOptions::ObjectKv(x) => Some(&x.desired_types),
            ValueOptions::Tuple(x) => Some(&x.desired_types),
            ValueOptions::TypedObject(x) => Some(&x.desired_types),
            ValueOptions::Any => None,
            ValueOptions::Skip(x) => Some(&x.desired_types),
        }
    }

    pub fn allow_null(&self) -> bool {
        self.desired_types()
            .map(JsonValueTypes::allows_null)
            .unwrap_or(true)
    }

    pub fn accepts(&self, kind: JsonKind) -> bool {
        self.desired_types()
            .map(|x| x.contains(kind))
            .unwrap_or(true)
    }

    /// The JSON token kinds that this kind of option knows how to parse.
    pub fn parseable_types(&self) -> JsonValueTypes {
        use JsonKind::{Array, Bool, Decimal, Int, Null, Object, String};

        match self {
            ValueOptions::Bool(_) => JsonValueTypes::of([Bool, String, Null]),
            ValueOptions::Char(_) | ValueOptions::Instant(_) => JsonValueTypes::of([String, Null]),
            ValueOptions::Byte(_)
            | ValueOptions::Short(_)
            | ValueOptions::Int(_)
            | ValueOptions::Long(_)
            | ValueOptions::Float(_)
            | ValueOptions::Double(_)
            | ValueOptions::InstantNumber(_)
            | ValueOptions::BigInteger(_)
            | ValueOptions::BigDecimal(_) => JsonValueTypes::of([Int, Decimal, String, Null]),
            ValueOptions::String(_) => JsonValueTypes::of([String, Int, Decimal, Bool, Null]),
            ValueOptions::Object(_) | ValueOptions::ObjectKv(_) | ValueOptions::TypedObject(_) => {
                JsonValueTypes::of([Object, Null])
            }
            ValueOptions::Array(_) | ValueOptions::Tuple(_) => JsonValueTypes::of([Array, Null]),
            ValueOptions::Any | ValueOptions::Skip(_) => JsonValueTypes::all(),
        }
    }

    fn has_on_null(&self) -> bool {
        match self {
            ValueOptions::Bool(x) => x.on_null.is_some(),
            ValueOptions::Char(x) => x.on_null.is_some(),
            ValueOptions::Byte(x) => x.on_null.is_some(),
            ValueOptions::Short(x) => x.on_null.is_some(),
            ValueOptions::Int(x) => x.on_null.is_some(),
            ValueOptions::Long(x) => x.on_null.is_some(),
            ValueOptions::Float(x) => x.on_null.is_some(),
            ValueOptions::Double(x) => x.on_null.is_some(),
            ValueOptions::String(x) => x.on_null.is_some(),
            ValueOptions::Instant(x) => x.on_null.is_some(),
            ValueOptions::InstantNumber(x) => x.on_null.is_some(),
            ValueOptions::BigInteger(x) => x.on_null.is_some(),
            ValueOptions::BigDecimal(x) => x.on_null.is_some(),
            _ => false,
        }
    }

    fn has_on_missing(&self) -> bool {
        match self {
            ValueOptions::Bool(x) => x.on_missing.is_some(),
            ValueOptions::Char(x) => x.on_missing.is_some(),
            ValueOptions::Byte(x) => x.on_missing.is_some(),
            ValueOptions::Short(x) => x.on_missing.is_some(),
            ValueOptions::Int(x) => x.on_missing.is_some(),
            ValueOptions::Long(x) => x.on_missing.is_some(),
            ValueOptions::Float(x) => x.on_missing.is_some(),
            ValueOptions::Double(x) => x.on_missing.is_some(),
            ValueOptions::String(x) => x.on_missing.is_some(),
            ValueOptions::Instant(x) => x.on_missing.is_some(),
            ValueOptions::InstantNumber(x) => x.on_missing.is_some(),
            ValueOptions::BigInteger(x) => x.on_missing.is_some(),
            ValueOptions::BigDecimal(x) => x.on_missing.is_some(),
            _ => false,
        }
    }

    /// Checks the consistency of this node.
    /// Child options are validated when they are constructed.
    pub fn validate(&self) -> JsonResult<()> {
        let kind = self.kind_name();
        if let Some(desired) = self.desired_types() {
            let parseable = self.parseable_types();
            if let Some(x) = desired.iter().find(|x| !parseable.contains(*x)) {
                return Err(JsonError::invalid(format!(
                    "{kind} options cannot accept {x} values"
                )));
            }
        }
        if self.has_on_null() && !self.allow_null() {
            return Err(JsonError::invalid(format!(
                "{kind} options: on_null is only valid when null is allowed"
            )));
        }
        if self.has_on_missing() && !self.allow_missing() {
            return Err(JsonError::invalid(format!(
                "{kind} options: on_missing is only valid when missing is allowed"
            )));
        }
        match self {
            ValueOptions::ObjectKv(x) => {
                let n = x.key.value_options().output_columns().len();
                if n != 1 {
                    return Err(JsonError::invalid(format!(
                        "object_kv key options must produce exactly one column, found {n}"
                    )));
                }
            }
            ValueOptions::Object(x) => x.validate_fields()?,
            ValueOptions::TypedObject(x) => x.validate()?,
            _ => {}
        }
        Ok(())
    }
}

impl ObjectOptions {
    fn validate(&self) -> JsonResult<()> {
        ValueOptions::Object(self.clone()).validate()
    }

    pub(crate) fn matching(&self, name: &str) -> &FieldMatching {
        self.field_matching.get(name).unwrap_or(&EXACT_MATCH)
    }

    /// Whether some field of the object reads the key.
    pub(crate) fn knows(&self, key: &str) -> bool {
        self.fields
            .keys()
            .any(|name| self.matching(name).matches(name, key))
    }

    fn validate_fields(&self) -> JsonResult<()> {
        if let Some(name) = self
            .field_matching
            .keys()
            .find(|x| !self.fields.contains_key(*x))
        {
            return Err(JsonError::invalid(format!(
                "field matching given for unknown field '{name}'"
            )));
        }
        let fields = self
            .fields
            .keys()
            .map(|name| (name.as_str(), self.matching(name)))
            .collect::<Vec<_>>();
        for (i, (name, matching)) in fields.iter().enumerate() {
            matching.validate(name)?;
            for (other_name, other) in &fields[..i] {
                let case_insensitive = matching.case_insensitive_match || other.case_insensitive_match;
                let overlap = matching.names(name).find(|x| {
                    other
                        .names(other_name)
                        .any(|y| same_name(x, y, case_insensitive))
                });
                if let Some(x) = overlap {
                    return Err(JsonError::invalid(format!(
                        "found overlapping field name '{x}'"
                    )));
                }
            }
        }
        Ok(())
    }
}

impl TypedObjectOptions {
    fn validate(&self) -> JsonResult<()> {
        if self.shared_fields.contains_key(&self.type_field) {
            return Err(JsonError::invalid(format!(
                "type field '{}' collides with a shared field",
                self.type_field
            )));
        }
        for (tag, object) in &self.objects {
            object.validate()?;
            if !object.allow_missing {
                return Err(JsonError::invalid(format!(
                    "object options for type '{tag}' must allow missing"
                )));
            }
            if let Some(name) = self
                .shared_fields
                .keys()
                .chain([&self.type_field])
                .find(|x| object.knows(x))
            {
                return Err(JsonError::invalid(format!(
                    "field '{name}' for type '{tag}' collides with a shared field or the type field"
                )));
            }
        }
        Ok(())
    }
}

/// A validated, immutable value option tree.
/// Cloning is cheap and shares the underlying tree.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonOptions {
    inner: Arc<ValueOptions>,
}

impl JsonOptions {
    pub fn try_new(options: ValueOptions) -> JsonResult<Self> {
        options.validate()?;
        debug!("built {} value options", options.kind_name());
        Ok(Self::new_unchecked(options))
    }

    /// Wraps options that are valid by construction.
    pub(crate) fn new_unchecked(options: ValueOptions) -> Self {
        Self {
            inner: Arc::new(options),
        }
    }

    pub fn value_options(&self) -> &ValueOptions {
        &self.inner
    }
}

impl Serialize for JsonOptions {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.inner.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for JsonOptions {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let options = ValueOptions::deserialize(deserializer)?;
        JsonOptions::try_new(options).map_err(serde::de::Error::custom)
    }
}
