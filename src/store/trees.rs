pub const CATALOGS: &str = "catalogs";
pub const DIFFICULTY_CACHE: &str = "difficulty_cache";
pub const PROGRESS: &str = "progress";
pub const CONFIG_VERSIONS: &str = "config_versions";
