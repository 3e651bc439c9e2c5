pub mod merge_service;
pub mod preset_service;
pub mod table_service;
