use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::csv::Table;
use crate::domain::error::{AppError, Result};

/// One entry of a preset: a column name, or a zero-based position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnSelector {
    Index(i64),
    Name(String),
}

impl fmt::Display for ColumnSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnSelector::Index(i) => write!(f, "{}", i),
            ColumnSelector::Name(name) => f.write_str(name),
        }
    }
}

/// A saved, named column selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub columns: Vec<ColumnSelector>,
    pub use_index: bool,
}

impl Preset {
    /// Build a preset from raw request data. Null entries are dropped before
    /// the emptiness check.
    pub fn new(
        name: impl Into<String>,
        columns: Vec<Option<ColumnSelector>>,
        use_index: bool,
    ) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;

        let columns: Vec<ColumnSelector> = columns.into_iter().flatten().collect();
        if columns.is_empty() {
            return Err(AppError::ValidationError(
                "At least one column must be selected".to_string(),
            ));
        }

        Ok(Self {
            name,
            columns,
            use_index,
        })
    }

    /// Resolve this preset against a table's current columns into column names.
    pub fn resolve(&self, table: &Table) -> Result<Vec<String>> {
        if self.use_index {
            self.resolve_indices(table)
        } else {
            self.resolve_names(table)
        }
    }

    fn resolve_indices(&self, table: &Table) -> Result<Vec<String>> {
        let names = table.column_names();
        self.columns
            .iter()
            .map(|selector| match selector {
                ColumnSelector::Index(i) if *i >= 0 && (*i as usize) < names.len() => {
                    Ok(names[*i as usize].clone())
                }
                _ => Err(AppError::ValidationError(
                    "Invalid column indices for the current file".to_string(),
                )),
            })
            .collect()
    }

    /// Only name entries can match; an index entry is reported as missing.
    fn resolve_names(&self, table: &Table) -> Result<Vec<String>> {
        let mut requested = Vec::with_capacity(self.columns.len());
        let mut missing = Vec::new();
        for selector in &self.columns {
            match selector {
                ColumnSelector::Name(name) if table.has_column(name) => {
                    requested.push(name.clone())
                }
                other => missing.push(other.to_string()),
            }
        }
        if !missing.is_empty() {
            return Err(AppError::MissingColumns {
                message: "Some preset columns do not exist in the current file".to_string(),
                columns: missing,
            });
        }
        Ok(requested)
    }
}

/// Preset names double as storage keys, so they must be plain file stems.
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::ValidationError(
            "Preset name and columns are required".to_string(),
        ));
    }
    if name.contains(['/', '\\', '\0']) || name.contains("..") {
        return Err(AppError::ValidationError(format!(
            "Invalid preset name: {}",
            name
        )));
    }
    Ok(())
}
