pub mod catalogs;
pub mod difficulty_cache;
pub mod progress;
