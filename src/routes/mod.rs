use serde_json::Value;

use crate::error::{ApiError, StoreError};

pub mod admin_api;
pub mod api;
pub mod auth;

/// Single schema-validation step for JSON bodies. Unknown or malformed
/// fields come back as a 400, not a generic parse failure.
pub(crate) fn parse_body<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value)
        .map_err(|e| ApiError(StoreError::Validation(format!("invalid request body: {}", e))))
}
