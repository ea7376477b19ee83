use std::collections::HashMap;

use crate::store::keys;
use crate::store::{Store, StoreError};
use crate::tracker::types::Difficulty;

impl Store {
    pub fn get_cached_difficulty(&self, slug: &str) -> Result<Option<Difficulty>, StoreError> {
        let key = keys::difficulty_key(slug);
        match self.difficulty_cache.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// 仅在键不存在时写入，并同步刷盘。
    /// 返回 false 表示已有缓存，原值保持不变。
    pub fn put_cached_difficulty(
        &self,
        slug: &str,
        difficulty: Difficulty,
    ) -> Result<bool, StoreError> {
        let key = keys::difficulty_key(slug);
        let value = Self::serialize(&difficulty)?;

        let cas_result = self.difficulty_cache.compare_and_swap(
            key.as_bytes(),
            None::<&[u8]>,
            Some(value),
        )?;

        if let Err(existing) = cas_result {
            if let Some(current) = existing.current {
                let current: Difficulty = Self::deserialize(&current)?;
                if current != difficulty {
                    tracing::warn!(
                        slug,
                        cached = %current,
                        rejected = %difficulty,
                        "Difficulty cache entry already exists, keeping cached value"
                    );
                }
            }
            return Ok(false);
        }

        self.difficulty_cache.flush()?;
        Ok(true)
    }

    pub fn load_difficulty_cache(&self) -> Result<HashMap<String, Difficulty>, StoreError> {
        let mut out = HashMap::new();
        for item in self.difficulty_cache.iter() {
            let (k, v) = item?;
            let slug = String::from_utf8(k.to_vec())
                .map_err(|e| StoreError::Validation(format!("invalid cache key: {e}")))?;
            out.insert(slug, Self::deserialize(&v)?);
        }
        Ok(out)
    }
}
