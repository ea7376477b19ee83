use std::sync::Arc;

use axum::Router;
use tempfile::TempDir;

use problem_tracker::config::{Config, LookupConfig};
use problem_tracker::routes::build_router;
use problem_tracker::state::AppState;
use problem_tracker::store::Store;

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub config: Config,
    _temp_dir: TempDir,
}

pub async fn spawn_test_app() -> TestApp {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let sled_path = temp_dir.path().join("tracker-test.sled");

    // 直接构造 Config，避免 set_var 在并行测试中互相干扰；外部查询关闭
    let config = Config {
        host: std::net::IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
        port: 3000,
        log_level: "info".to_string(),
        enable_file_logs: false,
        log_dir: "./logs".to_string(),
        sled_path: sled_path.to_string_lossy().to_string(),
        cors_origin: "http://localhost:5173".to_string(),
        default_user_id: "local".to_string(),
        lookup: LookupConfig {
            enabled: false,
            pacing_ms: 1,
            ..LookupConfig::default()
        },
    };

    let store = Arc::new(Store::open(&config.sled_path).expect("open store"));
    store.run_migrations().expect("run migrations");

    let state = AppState::new(store, &config);
    let app = build_router(state.clone());

    TestApp {
        app,
        state,
        config,
        _temp_dir: temp_dir,
    }
}
