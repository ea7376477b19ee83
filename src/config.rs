use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use crate::constants::{DEFAULT_LOOKUP_PACING_MS, DEFAULT_LOOKUP_TIMEOUT_SECS, DEFAULT_USER_ID};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub sled_path: String,
    pub cors_origin: String,
    pub default_user_id: String,
    pub lookup: LookupConfig,
}

#[derive(Debug, Clone)]
pub struct LookupConfig {
    pub enabled: bool,
    pub api_url: String,
    pub timeout_secs: u64,
    pub pacing_ms: u64,
    pub user_agent: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_url: "https://leetcode.com/graphql".to_string(),
            timeout_secs: DEFAULT_LOOKUP_TIMEOUT_SECS,
            pacing_ms: DEFAULT_LOOKUP_PACING_MS,
            user_agent: "Mozilla/5.0".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = LookupConfig::default();
        Self {
            host: env_or_parse("HOST", IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))),
            port: env_or_parse("PORT", 3000_u16),
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            sled_path: env_or("SLED_PATH", "./data/problem-tracker.sled"),
            cors_origin: env_or("CORS_ORIGIN", "http://localhost:5173"),
            default_user_id: env_or("DEFAULT_USER_ID", DEFAULT_USER_ID),
            lookup: LookupConfig {
                enabled: env_or_bool("LOOKUP_ENABLED", defaults.enabled),
                api_url: env_or("LOOKUP_API_URL", &defaults.api_url),
                timeout_secs: env_or_parse("LOOKUP_TIMEOUT_SECS", defaults.timeout_secs),
                // 外部服务非正式限流，间隔不得为 0
                pacing_ms: env_or_parse("LOOKUP_PACING_MS", defaults.pacing_ms).max(1),
                user_agent: env_or("LOOKUP_USER_AGENT", &defaults.user_agent),
            },
        }
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    key,
                    value = %raw,
                    "Failed to parse env var, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}
