//! Common Result Type

use super::error::ApiError;

/// Result of any governed or remote operation
pub type ApiResult<T> = Result<T, ApiError>;
