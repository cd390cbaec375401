mod application;

/// The column name used for a value that has no path, e.g. a top-level scalar.
pub const DEFAULT_ROOT_COLUMN_NAME: &str = "Value";
/// The separator used to join the path parts of a nested value into a column name.
pub const DEFAULT_PATH_SEPARATOR: &str = "_";
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

pub use application::*;
