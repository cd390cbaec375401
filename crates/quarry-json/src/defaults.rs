use std::collections::HashMap;

use lazy_static::lazy_static;
use quarry_common::spec::DType;

use crate::builder::{
    any_, array_options, big_decimal_options, big_integer_options, bool_options, byte_options,
    char_options, double_options, float_options, instant_string_options, int_options,
    long_options, short_options, string_options,
};
use crate::error::{JsonError, JsonResult};
use crate::options::{JsonOptions, ValueOptions};
use crate::value_type::NativeType;

lazy_static! {
    static ref DTYPE_OPTIONS: HashMap<DType, JsonOptions> = build_dtype_options();
    static ref NATIVE_OPTIONS: HashMap<NativeType, JsonOptions> = build_native_options();
}

fn default_scalar_options(dtype: &DType) -> Option<ValueOptions> {
    let options = match dtype {
        DType::Boolean => bool_options(Default::default()),
        DType::Char => char_options(Default::default()),
        DType::Byte => byte_options(Default::default()),
        DType::Short => short_options(Default::default()),
        DType::Int => int_options(Default::default()),
        DType::Long => long_options(Default::default()),
        DType::Float => float_options(Default::default()),
        DType::Double => double_options(Default::default()),
        DType::String => string_options(Default::default()),
        DType::Instant => instant_string_options(Default::default()),
        DType::BigInteger => big_integer_options(Default::default()),
        DType::BigDecimal => big_decimal_options(Default::default()),
        DType::Object => ValueOptions::Any,
        DType::Array { .. } => return None,
    };
    Some(options)
}

fn build_dtype_options() -> HashMap<DType, JsonOptions> {
    let scalars = [
        DType::Boolean,
        DType::Char,
        DType::Byte,
        DType::Short,
        DType::Int,
        DType::Long,
        DType::Float,
        DType::Double,
        DType::String,
        DType::Instant,
        DType::BigInteger,
        DType::BigDecimal,
        DType::Object,
    ];
    let arrays = [
        DType::Boolean,
        DType::Char,
        DType::Byte,
        DType::Short,
        DType::Int,
        DType::Long,
        DType::Float,
        DType::Double,
        DType::String,
        DType::Instant,
    ];
    let mut map = HashMap::new();
    for dtype in scalars {
        if let Some(options) = default_scalar_options(&dtype) {
            map.insert(dtype, JsonOptions::new_unchecked(options));
        }
    }
    for dtype in arrays {
        if let Some(element) = map.get(&dtype).cloned() {
            let options = array_options(element, Default::default());
            map.insert(DType::array_of(dtype), JsonOptions::new_unchecked(options));
        }
    }
    map
}

fn build_native_options() -> HashMap<NativeType, JsonOptions> {
    [
        (NativeType::Bool, bool_options(Default::default())),
        (NativeType::Int, long_options(Default::default())),
        (NativeType::Float, double_options(Default::default())),
        (NativeType::Str, string_options(Default::default())),
        (NativeType::DateTime, instant_string_options(Default::default())),
        (NativeType::Object, any_().value_options().clone()),
    ]
    .into_iter()
    .map(|(native, options)| (native, JsonOptions::new_unchecked(options)))
    .collect()
}

/// Returns the default value options for a data type.
pub fn dtype_options(dtype: &DType) -> JsonResult<JsonOptions> {
    DTYPE_OPTIONS.get(dtype).cloned().ok_or_else(|| {
        JsonError::invalid(format!("no default JSON value options for data type {dtype}"))
    })
}

/// Returns the default value options for a native type.
pub fn native_options(native: NativeType) -> JsonResult<JsonOptions> {
    NATIVE_OPTIONS.get(&native).cloned().ok_or_else(|| {
        JsonError::internal(format!("no default JSON value options for {native:?}"))
    })
}
