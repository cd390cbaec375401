pub mod builder;
pub mod defaults;
pub mod error;
pub mod node;
pub mod options;
pub mod processor;
pub mod value_type;

pub use builder::*;
pub use options::{JsonOptions, ValueOptions};
pub use processor::JsonProcessor;
pub use value_type::{json, JsonValueType, NativeType};
