pub mod column;
pub mod error;
pub mod filter;
pub mod ingest;
pub mod table;

pub use column::{ColumnDefinition, ColumnType, InputColumn};
pub use filter::{Filter, PatternMode};
pub use ingest::{from_table, json_table, JsonTableOptions, Source};
pub use table::{new_table, Table};
