use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};

use crate::config::Config;
use crate::constants::USER_LOCK_PRUNE_THRESHOLD;
use crate::services::difficulty_lookup::GraphqlLookup;
use crate::store::Store;
use crate::tracker::types::DifficultyMap;

#[derive(Clone)]
pub struct AppState {
    store: Arc<Store>,
    lookup: Arc<GraphqlLookup>,
    config: Arc<Config>,
    difficulty_maps: Arc<RwLock<HashMap<String, Arc<DifficultyMap>>>>,
    user_locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
    started_at: Instant,
}

impl AppState {
    pub fn new(store: Arc<Store>, config: &Config) -> Self {
        let lookup = Arc::new(GraphqlLookup::new(&config.lookup));
        if !lookup.is_enabled() {
            tracing::warn!("Difficulty lookup disabled, uncached problems will be treated as medium");
        }

        Self {
            store,
            lookup,
            config: Arc::new(config.clone()),
            difficulty_maps: Arc::new(RwLock::new(HashMap::new())),
            user_locks: Arc::new(Mutex::new(HashMap::new())),
            started_at: Instant::now(),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn store_handle(&self) -> Arc<Store> {
        self.store.clone()
    }

    pub fn lookup(&self) -> &GraphqlLookup {
        &self.lookup
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn lookup_pacing(&self) -> Duration {
        Duration::from_millis(self.config.lookup.pacing_ms.max(1))
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// 同一用户的所有操作共用一把锁，不同用户互不阻塞。
    ///
    /// 锁表超过 `USER_LOCK_PRUNE_THRESHOLD` 时移除无人持有的锁
    /// （只剩表内一个引用），表大小因此受并发用户数约束。
    pub async fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.user_locks.lock().await;
        if locks.len() >= USER_LOCK_PRUNE_THRESHOLD {
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        }
        locks.entry(user_id.to_string()).or_default().clone()
    }

    pub async fn user_lock_count(&self) -> usize {
        self.user_locks.lock().await.len()
    }

    /// 每个加载过题单的用户一份难度表，随用户数增长；
    /// 丢失后可由题单快照重建，个人规模下不做淘汰。
    pub async fn difficulty_map(&self, user_id: &str) -> Option<Arc<DifficultyMap>> {
        self.difficulty_maps.read().await.get(user_id).cloned()
    }

    pub async fn set_difficulty_map(&self, user_id: &str, map: Arc<DifficultyMap>) {
        self.difficulty_maps
            .write()
            .await
            .insert(user_id.to_string(), map);
    }
}
