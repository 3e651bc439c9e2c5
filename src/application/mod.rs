pub mod use_cases;

pub use use_cases::merge_service::MergeService;
pub use use_cases::preset_service::PresetService;
pub use use_cases::table_service::TableService;
