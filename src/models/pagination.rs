use crate::error::app_error::AppError;
use rocket::serde::{Deserialize, Serialize};

/// Offset pagination for list queries.
/// A missing (or zero) limit returns every remaining row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct PaginationParams {
    /// Rows to skip before the first returned one.
    pub skip: Option<i64>,
    /// Maximum number of rows to return.
    pub limit: Option<i64>,
}

impl PaginationParams {
    pub fn new(skip: Option<i64>, limit: Option<i64>) -> Result<Self, AppError> {
        if skip.is_some_and(|skip| skip < 0) {
            return Err(AppError::BadRequest("skip must not be negative".to_string()));
        }
        if limit.is_some_and(|limit| limit < 0) {
            return Err(AppError::BadRequest("limit must not be negative".to_string()));
        }
        Ok(Self { skip, limit })
    }

    pub fn offset(&self) -> i64 {
        self.skip.unwrap_or(0).max(0)
    }

    /// The requested limit, or `None` for unbounded.
    pub fn effective_limit(&self) -> Option<i64> {
        self.limit.filter(|limit| *limit > 0)
    }
}
