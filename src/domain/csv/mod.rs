// ============================================================
// CSV DOMAIN LAYER
// ============================================================
// Core table types and completeness statistics
// No I/O, no async

mod column_stats;
mod table;

pub use column_stats::{ColumnStats, ColumnStatsMap, SelectionStats};
pub use table::{Cell, Column, Table};
