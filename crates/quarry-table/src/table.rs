use std::collections::HashMap;
use std::fmt::Display;

use comfy_table::{Cell, CellAlignment, ColumnConstraint, Width};
use indexmap::IndexMap;
use log::debug;
use quarry_common::spec::Literal;
use quarry_common::string::escape_meta_characters;
use uuid::Uuid;

use crate::column::{ColumnDefinition, InputColumn};
use crate::error::{TableError, TableResult};
use crate::filter::Filter;

fn truncate_string(s: &str, n: usize) -> String {
    if n == 0 || s.chars().count() <= n {
        s.to_string()
    } else if n < 4 {
        s.chars().take(n).collect::<String>()
    } else {
        format!("{}...", s.chars().take(n - 3).collect::<String>())
    }
}

/// An in-memory table stored as columns of literals.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    definitions: Vec<ColumnDefinition>,
    columns: Vec<Vec<Literal>>,
    attributes: IndexMap<String, String>,
}

/// Creates a table from input columns of equal length.
pub fn new_table(columns: impl IntoIterator<Item = InputColumn>) -> TableResult<Table> {
    let (definitions, columns): (Vec<_>, Vec<_>) =
        columns.into_iter().map(InputColumn::into_parts).unzip();
    Table::try_new(Uuid::new_v4().to_string(), definitions, columns)
}

impl Table {
    pub(crate) fn try_new(
        name: String,
        definitions: Vec<ColumnDefinition>,
        columns: Vec<Vec<Literal>>,
    ) -> TableResult<Self> {
        if definitions.len() != columns.len() {
            return Err(TableError::internal(format!(
                "table has {} column definitions but {} columns",
                definitions.len(),
                columns.len()
            )));
        }
        let mut names = HashMap::new();
        for (i, definition) in definitions.iter().enumerate() {
            if names.insert(definition.name(), i).is_some() {
                return Err(TableError::invalid(format!(
                    "duplicate column name: {}",
                    definition.name()
                )));
            }
        }
        if let Some(first) = columns.first() {
            if let Some((i, other)) = columns
                .iter()
                .enumerate()
                .find(|(_, c)| c.len() != first.len())
            {
                return Err(TableError::invalid(format!(
                    "column {} has {} rows but column {} has {} rows",
                    definitions[i].name(),
                    other.len(),
                    definitions[0].name(),
                    first.len()
                )));
            }
        }
        debug!(
            "created table {name} with {} columns and {} rows",
            definitions.len(),
            columns.first().map(Vec::len).unwrap_or(0)
        );
        Ok(Self {
            name,
            definitions,
            columns,
            attributes: IndexMap::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.attributes
    }

    pub fn with_attributes(
        mut self,
        attributes: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        self.attributes.extend(attributes);
        self
    }

    pub fn definitions(&self) -> &[ColumnDefinition] {
        &self.definitions
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.definitions.iter().map(|d| d.name()).collect()
    }

    pub fn num_columns(&self) -> usize {
        self.definitions.len()
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map(Vec::len).unwrap_or(0)
    }

    fn index_of(&self, name: &str) -> TableResult<usize> {
        self.definitions
            .iter()
            .position(|d| d.name() == name)
            .ok_or_else(|| TableError::invalid(format!("column not found: {name}")))
    }

    pub fn column(&self, name: &str) -> TableResult<&[Literal]> {
        Ok(&self.columns[self.index_of(name)?])
    }

    pub fn column_definition(&self, name: &str) -> TableResult<&ColumnDefinition> {
        Ok(&self.definitions[self.index_of(name)?])
    }

    /// Returns the cells of one row, or `None` if the row is out of bounds.
    pub fn row(&self, index: usize) -> Option<Vec<&Literal>> {
        self.columns.iter().map(|c| c.get(index)).collect()
    }

    /// Returns a table with the rows for which the filter holds.
    pub fn where_(&self, filter: &Filter) -> TableResult<Table> {
        let indices = filter
            .columns()
            .into_iter()
            .map(|name| Ok((name, self.index_of(name)?)))
            .collect::<TableResult<HashMap<_, _>>>()?;
        let keep = (0..self.num_rows())
            .filter(|&row| {
                filter.test(&|name: &str| {
                    indices
                        .get(name)
                        .and_then(|&column| self.columns[column].get(row))
                })
            })
            .collect::<Vec<_>>();
        debug!(
            "filter {filter} kept {} of {} rows of table {}",
            keep.len(),
            self.num_rows(),
            self.name
        );
        let columns = self
            .columns
            .iter()
            .map(|c| keep.iter().map(|&i| c[i].clone()).collect())
            .collect();
        Ok(self.derive(columns))
    }

    /// Returns a table with the first `n` rows.
    pub fn head(&self, n: usize) -> Table {
        let columns = self
            .columns
            .iter()
            .map(|c| c.iter().take(n).cloned().collect())
            .collect();
        self.derive(columns)
    }

    fn derive(&self, columns: Vec<Vec<Literal>>) -> Table {
        Table {
            name: self.name.clone(),
            definitions: self.definitions.clone(),
            columns,
            attributes: self.attributes.clone(),
        }
    }

    /// Formats at most `num_rows` rows as a text table,
    /// truncating cell values longer than `truncate` characters unless `truncate` is zero.
    pub fn show(&self, num_rows: usize, truncate: usize) -> String {
        const MIN_COLUMN_WIDTH: u16 = 3;
        const PADDING: u16 = 0;

        let mut table = comfy_table::Table::new();
        table.load_preset("||--+-++|    ++++++");
        let header = self
            .definitions
            .iter()
            .map(|d| Cell::new(escape_meta_characters(d.name())))
            .collect::<Vec<_>>();
        table.set_header(header);

        let alignment = match truncate {
            0 => CellAlignment::Left,
            _ => CellAlignment::Right,
        };
        table.column_iter_mut().for_each(|c| {
            c.set_padding((PADDING, PADDING))
                .set_constraint(ColumnConstraint::LowerBoundary(Width::Fixed(
                    MIN_COLUMN_WIDTH,
                )))
                .set_cell_alignment(alignment);
        });

        let shown = self.num_rows().min(num_rows);
        for row in 0..shown {
            let row = self
                .columns
                .iter()
                .map(|c| match &c[row] {
                    Literal::Null => "NULL".to_string(),
                    value => {
                        truncate_string(&escape_meta_characters(&value.to_string()), truncate)
                    }
                })
                .collect::<Vec<_>>();
            table.add_row(row);
        }
        let footer = match (shown < self.num_rows(), shown) {
            (true, 1) => "only showing top 1 row\n".to_string(),
            (true, n) => format!("only showing top {n} rows\n"),
            _ => "".to_string(),
        };
        format!("{table}\n{footer}")
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.show(self.num_rows(), 0))
    }
}
