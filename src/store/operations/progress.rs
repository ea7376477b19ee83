use serde::Deserialize;
use serde_json::Value;

use crate::store::keys;
use crate::store::{Store, StoreError};
use crate::tracker::types::{CurrentSession, GlobalStats, ProgressRecord};

/// 落盘的进度文档：当前结构，或缺少 global_stats 的旧结构
#[derive(Debug)]
pub enum ProgressDocument {
    Current(ProgressRecord),
    Legacy(LegacyProgress),
}

#[derive(Debug, Default, Deserialize)]
pub struct LegacyProgress {
    #[serde(default)]
    pub completed: Vec<String>,
    #[serde(default)]
    pub skipped: Vec<String>,
    #[serde(default)]
    pub revisit: Vec<String>,
    #[serde(default)]
    pub easy_completed: u32,
    #[serde(default)]
    pub medium_completed: u32,
    #[serde(default)]
    pub hard_completed: u32,
}

impl LegacyProgress {
    /// 扁平计数汇总进 global_stats，会话置空
    pub fn upgrade(self) -> ProgressRecord {
        ProgressRecord {
            completed: self.completed,
            skipped: self.skipped,
            revisit: self.revisit,
            global_stats: GlobalStats {
                easy_completed: self.easy_completed,
                medium_completed: self.medium_completed,
                hard_completed: self.hard_completed,
                total_completed: self.easy_completed
                    + self.medium_completed
                    + self.hard_completed,
            },
            current_session: CurrentSession::default(),
        }
    }
}

/// 只有不含 global_stats 的对象才算旧结构
fn is_legacy(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|obj| !obj.contains_key("global_stats"))
}

impl ProgressDocument {
    /// 旧结构宽松解析；其余一律按当前结构严格解析，失败即报错
    pub fn decode(bytes: &[u8]) -> Result<Self, StoreError> {
        let value: Value = Store::deserialize(bytes)?;
        if is_legacy(&value) {
            Ok(ProgressDocument::Legacy(serde_json::from_value(value)?))
        } else {
            Ok(ProgressDocument::Current(serde_json::from_value(value)?))
        }
    }

    pub fn into_record(self) -> (ProgressRecord, bool) {
        match self {
            ProgressDocument::Current(record) => (record, false),
            ProgressDocument::Legacy(legacy) => (legacy.upgrade(), true),
        }
    }
}

impl Store {
    /// 读取用户进度；不存在时返回空记录。旧结构会被升级并写回。
    pub fn get_progress_record(&self, user_id: &str) -> Result<ProgressRecord, StoreError> {
        let key = keys::progress_key(user_id)?;
        let Some(raw) = self.progress.get(key.as_bytes())? else {
            return Ok(ProgressRecord::default());
        };

        let (record, migrated) = ProgressDocument::decode(&raw)?.into_record();
        if migrated {
            tracing::info!(user_id, "Migrating legacy progress record");
            self.set_progress_record(user_id, &record)?;
        }
        Ok(record)
    }

    pub fn set_progress_record(
        &self,
        user_id: &str,
        record: &ProgressRecord,
    ) -> Result<(), StoreError> {
        let key = keys::progress_key(user_id)?;
        self.progress.insert(key.as_bytes(), Self::serialize(record)?)?;
        self.progress.flush()?;
        Ok(())
    }

    pub fn reset_progress_record(&self, user_id: &str) -> Result<ProgressRecord, StoreError> {
        let record = ProgressRecord::default();
        self.set_progress_record(user_id, &record)?;
        Ok(record)
    }

    /// 将所有旧结构的进度记录升级为当前结构，返回升级数量
    pub fn migrate_legacy_progress_records(&self) -> Result<u32, StoreError> {
        let mut migrated = 0u32;
        for item in self.progress.iter() {
            let (key, value) = item?;
            let document: Value = Self::deserialize(&value)?;
            // 当前结构的记录原样保留，读取时再严格校验
            if !is_legacy(&document) {
                continue;
            }
            let legacy: LegacyProgress = serde_json::from_value(document)?;
            self.progress.insert(key, Self::serialize(&legacy.upgrade())?)?;
            migrated += 1;
        }
        if migrated > 0 {
            self.progress.flush()?;
        }
        Ok(migrated)
    }
}
