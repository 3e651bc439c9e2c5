// ============================================================
// COLUMN STATISTICS
// ============================================================
// Completeness figures reported after upload, selection and merge

use serde::{Deserialize, Serialize, Serializer};

use super::Table;

/// How populated a single column is
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    /// Number of non-missing cells
    pub total: usize,

    /// `total / row_count * 100`, rounded to two decimals (0 for an empty table)
    pub percentage: f64,
}

impl ColumnStats {
    pub fn new(total: usize, row_count: usize) -> Self {
        let percentage = if row_count == 0 {
            0.0
        } else {
            round2(total as f64 / row_count as f64 * 100.0)
        };
        Self { total, percentage }
    }
}

/// Shape of a table after a selection or merge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionStats {
    pub num_columns: usize,
    pub num_rows: usize,
    pub total_cells: usize,
    pub columns: Vec<String>,
}

impl SelectionStats {
    pub fn of(table: &Table) -> Self {
        Self {
            num_columns: table.column_count(),
            num_rows: table.row_count(),
            total_cells: table.cell_count(),
            columns: table.column_names(),
        }
    }
}

/// Per-column stats serialized as a JSON object in column order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnStatsMap(pub Vec<(String, ColumnStats)>);

impl ColumnStatsMap {
    pub fn of(table: &Table) -> Self {
        Self(table.column_stats())
    }

    pub fn get(&self, column: &str) -> Option<&ColumnStats> {
        self.0.iter().find(|(name, _)| name == column).map(|(_, s)| s)
    }
}

impl Serialize for ColumnStatsMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(name, stats)| (name, stats)))
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
