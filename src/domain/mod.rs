pub mod error;
pub mod preset;
pub mod session;
pub mod upload;

// Tabular data and completeness stats
pub mod csv;
