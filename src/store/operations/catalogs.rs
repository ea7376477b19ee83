use serde_json::Value;

use crate::store::keys;
use crate::store::{Store, StoreError};

impl Store {
    /// 保存解包后的原始题单，进程重启后据此重建难度分桶
    pub fn save_catalog_snapshot(&self, user_id: &str, snapshot: &Value) -> Result<(), StoreError> {
        let key = keys::catalog_key(user_id)?;
        self.catalogs.insert(key.as_bytes(), Self::serialize(snapshot)?)?;
        self.catalogs.flush()?;
        Ok(())
    }

    pub fn get_catalog_snapshot(&self, user_id: &str) -> Result<Option<Value>, StoreError> {
        let key = keys::catalog_key(user_id)?;
        match self.catalogs.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn has_catalog(&self, user_id: &str) -> Result<bool, StoreError> {
        let key = keys::catalog_key(user_id)?;
        Ok(self.catalogs.contains_key(key.as_bytes())?)
    }
}
