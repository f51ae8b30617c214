use crate::error::{Result, StoreError};
use crate::models::NewSession;

pub(crate) fn validate_new_session(session: &NewSession) -> Result<()> {
    if session.user_id.trim().is_empty() {
        return Err(StoreError::validation("userId is required"));
    }

    if session.messages.is_empty() {
        return Err(StoreError::validation("At least one message is required"));
    }

    if !session.messages.iter().all(|m| m.has_payload()) {
        return Err(StoreError::validation(
            "Each message must have either image or prompt and a role",
        ));
    }

    Ok(())
}

pub(crate) fn validate_page(page: u32, page_size: u32) -> Result<()> {
    if page < 1 || page_size < 1 {
        return Err(StoreError::validation("page and pageSize must be at least 1"));
    }
    Ok(())
}
