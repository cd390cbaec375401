//! Entry points that build tables from JSON.

use std::borrow::Cow;
use std::fmt::Display;
use std::path::PathBuf;

use indexmap::IndexMap;
use log::{debug, info};
use quarry_common::config::{AppConfig, NamingConfig};
use quarry_common::spec::Literal;
use quarry_json::node::JsonNode;
use quarry_json::{json, JsonProcessor, JsonValueType};
use uuid::Uuid;

use crate::column::{ColumnDefinition, ColumnType};
use crate::error::{TableError, TableResult};
use crate::table::Table;

/// Where JSON content is read from.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Text(String),
    Bytes(Vec<u8>),
    File(PathBuf),
}

impl Source {
    fn read(&self) -> TableResult<Cow<'_, [u8]>> {
        match self {
            Source::Text(x) => Ok(Cow::Borrowed(x.as_bytes())),
            Source::Bytes(x) => Ok(Cow::Borrowed(x)),
            Source::File(path) => Ok(Cow::Owned(std::fs::read(path)?)),
        }
    }
}

impl Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Text(x) => write!(f, "text ({} bytes)", x.len()),
            Source::Bytes(x) => write!(f, "bytes ({} bytes)", x.len()),
            Source::File(path) => write!(f, "file {}", path.display()),
        }
    }
}

impl From<&str> for Source {
    fn from(value: &str) -> Self {
        Source::Text(value.to_string())
    }
}

impl From<String> for Source {
    fn from(value: String) -> Self {
        Source::Text(value)
    }
}

impl From<Vec<u8>> for Source {
    fn from(value: Vec<u8>) -> Self {
        Source::Bytes(value)
    }
}

impl From<PathBuf> for Source {
    fn from(value: PathBuf) -> Self {
        Source::File(value)
    }
}

#[derive(Debug, Clone)]
pub struct JsonTableOptions {
    /// How each JSON value maps onto table columns.
    pub options: JsonValueType,
    pub sources: Vec<Source>,
    /// Whether a source may contain multiple whitespace-separated JSON values.
    pub multi_value_support: bool,
    pub chunk_size: usize,
    pub max_threads: usize,
    /// The table name. A random UUID is used when absent.
    pub name: Option<String>,
    pub extra_attributes: IndexMap<String, String>,
    pub naming: NamingConfig,
}

impl JsonTableOptions {
    pub fn new(
        options: impl Into<JsonValueType>,
        sources: impl IntoIterator<Item = impl Into<Source>>,
    ) -> Self {
        Self::from_config(options, sources, &AppConfig::default())
    }

    /// Creates options with the ingestion defaults of the given configuration.
    pub fn from_config(
        options: impl Into<JsonValueType>,
        sources: impl IntoIterator<Item = impl Into<Source>>,
        config: &AppConfig,
    ) -> Self {
        Self {
            options: options.into(),
            sources: sources.into_iter().map(Into::into).collect(),
            multi_value_support: config.ingest.multi_value_support,
            chunk_size: config.ingest.chunk_size,
            max_threads: config.ingest.effective_max_threads(),
            name: None,
            extra_attributes: IndexMap::new(),
            naming: config.naming.clone(),
        }
    }

    fn validate(&self) -> TableResult<()> {
        if self.sources.is_empty() {
            return Err(TableError::invalid("at least one source is required"));
        }
        if self.chunk_size == 0 {
            return Err(TableError::invalid("chunk_size must be positive"));
        }
        if self.max_threads == 0 {
            return Err(TableError::invalid("max_threads must be positive"));
        }
        Ok(())
    }
}

/// Collects rows into column buffers one chunk at a time.
struct ColumnBuffer {
    columns: Vec<Vec<Literal>>,
    chunk: Vec<Vec<Literal>>,
    chunk_size: usize,
}

impl ColumnBuffer {
    fn new(num_columns: usize, chunk_size: usize) -> Self {
        Self {
            columns: vec![vec![]; num_columns],
            chunk: Vec::with_capacity(chunk_size),
            chunk_size,
        }
    }

    fn extend(&mut self, rows: impl IntoIterator<Item = Vec<Literal>>) -> TableResult<()> {
        for row in rows {
            if row.len() != self.columns.len() {
                return Err(TableError::internal(format!(
                    "expected {} values in a row, found {}",
                    self.columns.len(),
                    row.len()
                )));
            }
            self.chunk.push(row);
            if self.chunk.len() >= self.chunk_size {
                self.flush();
            }
        }
        Ok(())
    }

    fn flush(&mut self) {
        if self.chunk.is_empty() {
            return;
        }
        debug!("appending a chunk of {} rows", self.chunk.len());
        for row in self.chunk.drain(..) {
            for (column, value) in self.columns.iter_mut().zip(row) {
                column.push(value);
            }
        }
    }

    fn finish(mut self) -> Vec<Vec<Literal>> {
        self.flush();
        self.columns
    }
}

fn ingest_source(
    processor: &JsonProcessor,
    source: &Source,
    multi_value_support: bool,
    chunk_size: usize,
) -> TableResult<Vec<Vec<Literal>>> {
    let data = source.read()?;
    let mut buffer = ColumnBuffer::new(processor.column_names().len(), chunk_size);
    if multi_value_support {
        for node in JsonNode::parse_stream(&data) {
            buffer.extend(processor.process(Some(&node?))?)?;
        }
    } else {
        let node = JsonNode::parse_slice(&data)?;
        buffer.extend(processor.process(Some(&node))?)?;
    }
    Ok(buffer.finish())
}

fn column_definitions(processor: &JsonProcessor) -> TableResult<Vec<ColumnDefinition>> {
    processor
        .column_names()
        .iter()
        .zip(processor.column_types())
        .map(|(name, data_type)| {
            ColumnDefinition::of(name.clone(), data_type.clone(), None, ColumnType::Normal)
        })
        .collect()
}

fn concat(parts: Vec<Vec<Vec<Literal>>>, num_columns: usize) -> Vec<Vec<Literal>> {
    let mut columns = vec![vec![]; num_columns];
    for part in parts {
        for (column, values) in columns.iter_mut().zip(part) {
            column.extend(values);
        }
    }
    columns
}

/// Creates a table from JSON sources.
///
/// Sources are processed on up to `max_threads` worker threads,
/// and the rows are concatenated in source order.
pub fn json_table(options: JsonTableOptions) -> TableResult<Table> {
    options.validate()?;
    let JsonTableOptions {
        options: value_type,
        sources,
        multi_value_support,
        chunk_size,
        max_threads,
        name,
        extra_attributes,
        naming,
    } = options;
    let processor = JsonProcessor::try_new(json(value_type)?, &naming)?;
    let definitions = column_definitions(&processor)?;
    let num_threads = max_threads.min(sources.len());
    debug!(
        "ingesting {} JSON sources on {num_threads} threads",
        sources.len()
    );

    let results = std::thread::scope(|s| {
        let handles = (0..num_threads)
            .map(|worker| {
                let processor = &processor;
                let sources = &sources;
                s.spawn(move || {
                    sources
                        .iter()
                        .enumerate()
                        .skip(worker)
                        .step_by(num_threads)
                        .map(|(i, source)| {
                            let result =
                                ingest_source(processor, source, multi_value_support, chunk_size)
                                    .map_err(|e| {
                                        TableError::construction(
                                            format!("failed to ingest JSON from {source}."),
                                            e,
                                        )
                                    });
                            (i, result)
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .map(|h| {
                h.join()
                    .map_err(|_| TableError::internal("ingestion thread panicked"))
            })
            .collect::<TableResult<Vec<_>>>()
    })?;

    let mut parts = results.into_iter().flatten().collect::<Vec<_>>();
    parts.sort_by_key(|(i, _)| *i);
    let parts = parts
        .into_iter()
        .map(|(_, result)| result)
        .collect::<TableResult<Vec<_>>>()?;
    let columns = concat(parts, definitions.len());
    let name = name.unwrap_or_else(|| Uuid::new_v4().to_string());
    let table = Table::try_new(name, definitions, columns)?.with_attributes(extra_attributes);
    info!(
        "ingested {} rows into table {} from {} JSON sources",
        table.num_rows(),
        table.name(),
        sources.len()
    );
    Ok(table)
}

/// Creates a table by parsing one JSON value from each cell of a table column.
///
/// The first column is used when `column_name` is absent.
/// A null cell is processed as a missing value.
pub fn from_table(
    table: &Table,
    column_name: Option<&str>,
    options: impl Into<JsonValueType>,
    chunk_size: usize,
) -> TableResult<Table> {
    if chunk_size == 0 {
        return Err(TableError::invalid("chunk_size must be positive"));
    }
    let column_name = match column_name {
        Some(x) => x,
        None => table
            .column_names()
            .first()
            .copied()
            .ok_or_else(|| TableError::invalid("table has no columns"))?,
    };
    let cells = table.column(column_name)?;
    let processor = JsonProcessor::try_new(json(options)?, &NamingConfig::default())?;
    let definitions = column_definitions(&processor)?;
    let mut buffer = ColumnBuffer::new(definitions.len(), chunk_size);
    for (i, cell) in cells.iter().enumerate() {
        let rows = match cell {
            Literal::Null => processor.process(None)?,
            Literal::String(x) => processor.process(Some(&JsonNode::parse_str(x)?))?,
            Literal::Json(x) => processor.process(Some(&JsonNode::from(x.clone())))?,
            other => {
                return Err(TableError::invalid(format!(
                    "row {i} of column {column_name} is not a JSON string: {other}"
                )))
            }
        };
        buffer.extend(rows)?;
    }
    let derived = Table::try_new(Uuid::new_v4().to_string(), definitions, buffer.finish())?;
    info!(
        "parsed {} rows from column {column_name} of table {} into table {}",
        cells.len(),
        table.name(),
        derived.name()
    );
    Ok(derived)
}
