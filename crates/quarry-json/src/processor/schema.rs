use quarry_common::spec::DType;

use crate::options::ValueOptions;

/// A column produced by a value option.
/// The path is relative to the option that produces it; an empty path denotes the value itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputColumn {
    pub path: Vec<String>,
    pub data_type: DType,
}

impl OutputColumn {
    fn new(data_type: DType) -> Self {
        Self {
            path: vec![],
            data_type,
        }
    }

    fn prefixed(mut self, prefix: &str) -> Self {
        self.path.insert(0, prefix.to_string());
        self
    }

    fn into_array(self) -> Self {
        Self {
            path: self.path,
            data_type: DType::array_of(self.data_type),
        }
    }
}

pub const KEY_PATH: &str = "Key";
pub const VALUE_PATH: &str = "Value";

impl ValueOptions {
    /// Returns the columns produced by this option, in order.
    pub fn output_columns(&self) -> Vec<OutputColumn> {
        match self {
            ValueOptions::Bool(_) => vec![OutputColumn::new(DType::Boolean)],
            ValueOptions::Char(_) => vec![OutputColumn::new(DType::Char)],
            ValueOptions::Byte(_) => vec![OutputColumn::new(DType::Byte)],
            ValueOptions::Short(_) => vec![OutputColumn::new(DType::Short)],
            ValueOptions::Int(_) => vec![OutputColumn::new(DType::Int)],
            ValueOptions::Long(_) => vec![OutputColumn::new(DType::Long)],
            ValueOptions::Float(_) => vec![OutputColumn::new(DType::Float)],
            ValueOptions::Double(_) => vec![OutputColumn::new(DType::Double)],
            ValueOptions::String(_) => vec![OutputColumn::new(DType::String)],
            ValueOptions::Instant(_) | ValueOptions::InstantNumber(_) => {
                vec![OutputColumn::new(DType::Instant)]
            }
            ValueOptions::BigInteger(_) => vec![OutputColumn::new(DType::BigInteger)],
            ValueOptions::BigDecimal(_) => vec![OutputColumn::new(DType::BigDecimal)],
            ValueOptions::Any => vec![OutputColumn::new(DType::Object)],
            ValueOptions::Skip(_) => vec![],
            ValueOptions::Object(x) => x
                .fields
                .iter()
                .flat_map(|(name, child)| {
                    child
                        .value_options()
                        .output_columns()
                        .into_iter()
                        .map(move |c| c.prefixed(name))
                })
                .collect(),
            ValueOptions::Array(x) => x
                .element
                .value_options()
                .output_columns()
                .into_iter()
                .map(OutputColumn::into_array)
                .collect(),
            ValueOptions::ObjectKv(x) => {
                let keys = x
                    .key
                    .value_options()
                    .output_columns()
                    .into_iter()
                    .map(|c| c.prefixed(KEY_PATH).into_array());
                let values = x
                    .value
                    .value_options()
                    .output_columns()
                    .into_iter()
                    .map(|c| c.prefixed(VALUE_PATH).into_array());
                keys.chain(values).collect()
            }
            ValueOptions::Tuple(x) => {
                if let [single] = x.values.as_slice() {
                    return single.value_options().output_columns();
                }
                x.values
                    .iter()
                    .enumerate()
                    .flat_map(|(i, child)| {
                        let prefix = i.to_string();
                        child
                            .value_options()
                            .output_columns()
                            .into_iter()
                            .map(move |c| c.prefixed(&prefix))
                    })
                    .collect()
            }
            ValueOptions::TypedObject(x) => {
                let mut columns = vec![OutputColumn::new(DType::String).prefixed(&x.type_field)];
                for (name, child) in &x.shared_fields {
                    columns.extend(
                        child
                            .value_options()
                            .output_columns()
                            .into_iter()
                            .map(|c| c.prefixed(name)),
                    );
                }
                for (tag, object) in &x.objects {
                    for (name, child) in &object.fields {
                        columns.extend(
                            child
                                .value_options()
                                .output_columns()
                                .into_iter()
                                .map(|c| c.prefixed(name).prefixed(tag)),
                        );
                    }
                }
                columns
            }
        }
    }

    pub fn output_count(&self) -> usize {
        self.output_columns().len()
    }
}
