use std::io::Write;

use quarry_common::spec::Literal;
use quarry_json::JsonValueType;
use quarry_table::error::TableResult;
use quarry_table::{json_table, JsonTableOptions, Source, Table};
use tempfile::NamedTempFile;

/// Returns the table content row by row.
pub fn rows(table: &Table) -> Vec<Vec<Literal>> {
    (0..table.num_rows())
        .filter_map(|i| table.row(i))
        .map(|row| row.into_iter().cloned().collect())
        .collect()
}

/// Ingests JSON text sources with a single worker thread.
pub fn ingest(
    options: impl Into<JsonValueType>,
    sources: impl IntoIterator<Item = &'static str>,
) -> TableResult<Table> {
    let mut options = JsonTableOptions::new(options, sources.into_iter().map(Source::from));
    options.max_threads = 1;
    json_table(options)
}

/// Writes JSON content to a temporary file that is removed when dropped.
pub fn json_file(contents: &str) -> std::io::Result<NamedTempFile> {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile()?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    Ok(file)
}
