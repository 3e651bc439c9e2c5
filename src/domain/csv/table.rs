// ============================================================
// TABLE
// ============================================================
// In-memory representation of CSV data as named columns of equal length

use serde::{Deserialize, Serialize};

use super::{ColumnStats, SelectionStats};
use crate::domain::error::{AppError, Result};

/// A single cell. `None` marks a missing value.
pub type Cell = Option<String>;

/// A named column of cells
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            cells,
        }
    }

    /// Number of non-missing cells
    pub fn non_missing(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

/// Ordered columns sharing one row count
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    /// Build a table from a header and row-major cells.
    /// Rows shorter than the header are padded with missing cells.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self> {
        let width = headers.len();
        let row_count = rows.len();
        let mut columns: Vec<Column> = headers
            .into_iter()
            .map(|name| Column::new(name, Vec::with_capacity(row_count)))
            .collect();

        for (line, mut row) in rows.into_iter().enumerate() {
            if row.len() > width {
                return Err(AppError::ParseError(format!(
                    "Expected {} fields in row {}, saw {}",
                    width,
                    line + 1,
                    row.len()
                )));
            }
            row.resize(width, None);
            for (column, cell) in columns.iter_mut().zip(row) {
                column.cells.push(cell);
            }
        }

        Ok(Self { columns, row_count })
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn cell_count(&self) -> usize {
        self.row_count * self.columns.len()
    }

    /// Iterate the table row by row
    pub fn rows(&self) -> impl Iterator<Item = Vec<Option<&str>>> + '_ {
        (0..self.row_count).map(move |i| {
            self.columns
                .iter()
                .map(|c| c.cells[i].as_deref())
                .collect()
        })
    }

    /// Names from `requested` that the table does not have, in request order
    pub fn missing_columns<'a, I>(&self, requested: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        requested
            .into_iter()
            .filter(|name| !self.has_column(name))
            .cloned()
            .collect()
    }

    /// Project onto `names`, keeping their order. Repeated names yield repeated columns.
    pub fn select(&self, names: &[String]) -> Result<Table> {
        let missing = self.missing_columns(names);
        if !missing.is_empty() {
            return Err(AppError::Internal(format!(
                "Columns {:?} not found in the table",
                missing
            )));
        }

        let columns = names
            .iter()
            .filter_map(|name| self.column(name).cloned())
            .collect();
        Ok(Table {
            columns,
            row_count: self.row_count,
        })
    }

    /// Stack tables row-wise. Columns are aligned on the union of names in
    /// first-seen order; a table lacking a column contributes missing cells.
    pub fn concat(tables: &[Table]) -> Table {
        let mut names: Vec<String> = Vec::new();
        for table in tables {
            for column in &table.columns {
                if !names.contains(&column.name) {
                    names.push(column.name.clone());
                }
            }
        }

        let row_count = tables.iter().map(|t| t.row_count).sum();
        let columns = names
            .into_iter()
            .map(|name| {
                let mut cells = Vec::with_capacity(row_count);
                for table in tables {
                    match table.column(&name) {
                        Some(column) => cells.extend(column.cells.iter().cloned()),
                        None => cells.extend(std::iter::repeat(None).take(table.row_count)),
                    }
                }
                Column::new(name, cells)
            })
            .collect();

        Table { columns, row_count }
    }

    /// Completeness stats for every column, in column order
    pub fn column_stats(&self) -> Vec<(String, ColumnStats)> {
        self.columns
            .iter()
            .map(|c| (c.name.clone(), ColumnStats::new(c.non_missing(), self.row_count)))
            .collect()
    }

    pub fn selection_stats(&self) -> SelectionStats {
        SelectionStats::of(self)
    }
}
