//! HTTP handlers grouped by resource.

pub mod foods;
pub mod health;
pub mod inventory;
pub mod metrics;
pub mod orders;

use uuid::Uuid;

use crate::error::ApiError;

fn parse_id<T: From<Uuid>>(raw: &str) -> Result<T, ApiError> {
    let uuid =
        Uuid::parse_str(raw).map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))?;
    Ok(T::from(uuid))
}
