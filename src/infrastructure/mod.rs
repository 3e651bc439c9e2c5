pub mod bootstrap;
pub mod config;
pub mod csv;
pub mod preset_store;
pub mod session_store;
pub mod storage;
