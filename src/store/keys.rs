use crate::constants::MAX_USER_ID_LEN;
use crate::store::StoreError;

fn validate_user_id(user_id: &str) -> Result<(), StoreError> {
    if user_id.is_empty() || user_id.len() > MAX_USER_ID_LEN {
        return Err(StoreError::Validation(format!(
            "user id must be 1..={MAX_USER_ID_LEN} bytes"
        )));
    }
    Ok(())
}

pub fn catalog_key(user_id: &str) -> Result<String, StoreError> {
    validate_user_id(user_id)?;
    Ok(user_id.to_string())
}

pub fn progress_key(user_id: &str) -> Result<String, StoreError> {
    validate_user_id(user_id)?;
    Ok(user_id.to_string())
}

pub fn difficulty_key(slug: &str) -> String {
    slug.to_string()
}
