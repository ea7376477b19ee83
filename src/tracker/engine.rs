//! 单个用户的请求上下文：持有该用户的串行锁，读-改-写整份进度记录

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::OwnedMutexGuard;

use crate::state::AppState;
use crate::store::StoreError;
use crate::tracker::classifier::{classify, ClassifyReport};
use crate::tracker::progress::{
    self, CompletedScope, DifficultyFilter, ImportError, ListKind, ProblemEntry, ProgressView,
    SkipOutcome,
};
use crate::tracker::selector::generate_session;
use crate::tracker::types::{Catalog, CatalogError, Difficulty, DifficultyMap, ProgressRecord};

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("no problem catalog has been loaded")]
    CatalogNotLoaded,
    #[error(transparent)]
    InvalidCatalog(#[from] CatalogError),
    #[error(transparent)]
    InvalidImport(#[from] ImportError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSummary {
    pub categories: usize,
    pub problems: usize,
    pub easy: usize,
    pub medium: usize,
    pub hard: usize,
    pub cache_hits: usize,
    pub lookups: usize,
    pub lookup_failures: usize,
}

impl CatalogSummary {
    fn new(catalog: &Catalog, map: &DifficultyMap, report: &ClassifyReport) -> Self {
        Self {
            categories: catalog.categories.len(),
            problems: map.len(),
            easy: map.bucket(Difficulty::Easy).len(),
            medium: map.bucket(Difficulty::Medium).len(),
            hard: map.bucket(Difficulty::Hard).len(),
            cache_hits: report.cache_hits,
            lookups: report.lookups,
            lookup_failures: report.lookup_failures,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStatus {
    pub loaded: bool,
    pub has_session: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEntry {
    pub url: String,
    pub difficulty: Difficulty,
    pub is_revisit: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub problems: Vec<SessionEntry>,
    pub existing_session: bool,
    pub generated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipResponse {
    pub replacement: Option<SessionEntry>,
    pub progress: ProgressView,
}

pub struct UserTracker {
    state: AppState,
    user_id: String,
    _guard: OwnedMutexGuard<()>,
}

impl UserTracker {
    /// 等待该用户之前的操作结束后返回；锁随 tracker 一起释放
    pub async fn acquire(state: &AppState, user_id: &str) -> Self {
        let lock = state.user_lock(user_id).await;
        let guard = lock.lock_owned().await;
        Self {
            state: state.clone(),
            user_id: user_id.to_string(),
            _guard: guard,
        }
    }

    fn load_progress(&self) -> Result<ProgressRecord, TrackerError> {
        Ok(self.state.store().get_progress_record(&self.user_id)?)
    }

    fn save_progress(&self, record: &ProgressRecord) -> Result<(), TrackerError> {
        self.state
            .store()
            .set_progress_record(&self.user_id, record)?;
        Ok(())
    }

    async fn build_map(&self, catalog: &Catalog) -> Result<(DifficultyMap, ClassifyReport), TrackerError> {
        let built = classify(
            catalog,
            self.state.store(),
            self.state.lookup(),
            self.state.lookup_pacing(),
        )
        .await?;
        Ok(built)
    }

    /// 内存中的难度分桶；进程重启后首次访问时由持久化的题单快照重建
    async fn difficulty_map(&self) -> Result<Arc<DifficultyMap>, TrackerError> {
        if let Some(map) = self.state.difficulty_map(&self.user_id).await {
            return Ok(map);
        }

        let snapshot = self
            .state
            .store()
            .get_catalog_snapshot(&self.user_id)?
            .ok_or(TrackerError::CatalogNotLoaded)?;
        let catalog = Catalog::from_snapshot(&snapshot)?;
        tracing::info!(user_id = %self.user_id, "Rebuilding difficulty map from stored catalog");

        let (map, _) = self.build_map(&catalog).await?;
        let map = Arc::new(map);
        self.state
            .set_difficulty_map(&self.user_id, map.clone())
            .await;
        Ok(map)
    }

    /// 解析并分类整份题单，成功后替换该用户的难度分桶并保存快照。
    /// 解析失败时不改动任何已有状态。
    pub async fn load_catalog(&self, document: Value) -> Result<CatalogSummary, TrackerError> {
        let (catalog, snapshot) = Catalog::from_value(document)?;
        let (map, report) = self.build_map(&catalog).await?;
        let summary = CatalogSummary::new(&catalog, &map, &report);

        self.state
            .store()
            .save_catalog_snapshot(&self.user_id, &snapshot)?;
        self.state
            .set_difficulty_map(&self.user_id, Arc::new(map))
            .await;

        tracing::info!(
            user_id = %self.user_id,
            categories = summary.categories,
            problems = summary.problems,
            "Catalog loaded"
        );
        Ok(summary)
    }

    pub async fn status(&self) -> Result<CatalogStatus, TrackerError> {
        let loaded = self.state.difficulty_map(&self.user_id).await.is_some()
            || self.state.store().has_catalog(&self.user_id)?;
        let record = self.load_progress()?;
        Ok(CatalogStatus {
            loaded,
            has_session: !record.current_session.problems.is_empty(),
        })
    }

    /// `force_new = false` 且已有未清空的会话时原样返回，否则重新抽题
    pub async fn session(&self, force_new: bool) -> Result<SessionResponse, TrackerError> {
        let map = self.difficulty_map().await?;
        let mut record = self.load_progress()?;

        if !force_new && !record.current_session.problems.is_empty() {
            let problems = record
                .current_session
                .problems
                .iter()
                .filter_map(|url| {
                    map.difficulty_of(url).map(|difficulty| SessionEntry {
                        url: url.clone(),
                        difficulty,
                        is_revisit: record.is_revisit(url),
                    })
                })
                .collect();
            return Ok(SessionResponse {
                problems,
                existing_session: true,
                generated_at: record.current_session.generated_at,
            });
        }

        let selected = generate_session(&map, &mut record, &mut rand::thread_rng());
        self.save_progress(&record)?;

        tracing::info!(
            user_id = %self.user_id,
            problems = selected.len(),
            "Generated new session"
        );

        let problems = selected
            .into_iter()
            .map(|p| SessionEntry {
                is_revisit: record.is_revisit(&p.url),
                url: p.url,
                difficulty: p.difficulty,
            })
            .collect();
        Ok(SessionResponse {
            problems,
            existing_session: false,
            generated_at: record.current_session.generated_at,
        })
    }

    /// 返回 `None` 表示题目已完成或不在题单中
    pub async fn mark_complete(&self, url: &str) -> Result<Option<ProgressView>, TrackerError> {
        let map = self.difficulty_map().await?;
        let mut record = self.load_progress()?;
        if !progress::mark_complete(&mut record, &map, url) {
            return Ok(None);
        }
        self.save_progress(&record)?;
        Ok(Some(progress::progress_view(&record)))
    }

    /// 返回 `None` 表示题目已跳过或已完成
    pub async fn mark_skip(&self, url: &str) -> Result<Option<SkipResponse>, TrackerError> {
        let map = self.difficulty_map().await?;
        let mut record = self.load_progress()?;

        let outcome = progress::mark_skip(&mut record, &map, url, &mut rand::thread_rng());
        let replacement = match outcome {
            SkipOutcome::Rejected => return Ok(None),
            SkipOutcome::Skipped { replacement } => replacement,
        };
        self.save_progress(&record)?;

        Ok(Some(SkipResponse {
            replacement: replacement.map(|p| SessionEntry {
                is_revisit: record.is_revisit(&p.url),
                url: p.url,
                difficulty: p.difficulty,
            }),
            progress: progress::progress_view(&record),
        }))
    }

    /// 返回 `None` 表示已在复习列表中
    pub async fn mark_revisit(&self, url: &str) -> Result<Option<ProgressView>, TrackerError> {
        let mut record = self.load_progress()?;
        if !progress::mark_revisit(&mut record, url) {
            return Ok(None);
        }
        self.save_progress(&record)?;
        Ok(Some(progress::progress_view(&record)))
    }

    pub async fn progress(&self) -> Result<ProgressView, TrackerError> {
        Ok(progress::progress_view(&self.load_progress()?))
    }

    pub async fn list(&self, kind: ListKind) -> Result<Vec<ProblemEntry>, TrackerError> {
        Ok(progress::list(&self.load_progress()?, kind))
    }

    pub async fn completed(
        &self,
        scope: CompletedScope,
        filter: DifficultyFilter,
    ) -> Result<Vec<ProblemEntry>, TrackerError> {
        let record = self.load_progress()?;
        let map = match filter {
            DifficultyFilter::All => None,
            DifficultyFilter::Only(_) => Some(self.difficulty_map().await?),
        };
        let empty = DifficultyMap::new();
        let map = map.as_deref().unwrap_or(&empty);
        Ok(progress::completed(&record, map, scope, filter))
    }

    /// 清空进度，题单保持不变
    pub async fn reset(&self) -> Result<ProgressView, TrackerError> {
        let record = self.state.store().reset_progress_record(&self.user_id)?;
        tracing::info!(user_id = %self.user_id, "Progress reset");
        Ok(progress::progress_view(&record))
    }

    pub async fn export(&self) -> Result<Value, TrackerError> {
        let record = self.load_progress()?;
        progress::export(&record).map_err(|e| TrackerError::Store(StoreError::from(e)))
    }

    /// 整体替换进度记录；校验失败时原记录不变
    pub async fn import(&self, document: Value) -> Result<ProgressView, TrackerError> {
        let record = progress::parse_import(document)?;
        self.save_progress(&record)?;
        tracing::info!(
            user_id = %self.user_id,
            completed = record.completed.len(),
            "Progress imported"
        );
        Ok(progress::progress_view(&record))
    }
}
