use rocket::http::{ContentType, Status};
use rocket::response::Responder;
use rocket::{Request, Response};
use rocket_okapi::OpenApiError;
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::Responses;
use rocket_okapi::response::OpenApiResponderInner;
use std::io::Cursor;
use thiserror::Error;
use tracing::{error, warn};
use validator::ValidationErrors;

/// Postgres constraint guarding one tracker per owner and date.
pub(crate) const TRACKER_OWNER_DATE_CONSTRAINT: &str = "trackers_owner_date_key";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error")]
    Db {
        message: String,
        #[source]
        source: sqlx::error::Error,
    },
    #[error("User not found")]
    UserNotFound,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("No valid fields to update")]
    NoFieldsToUpdate,
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("{message}")]
    UuidError {
        message: String,
        #[source]
        source: uuid::Error,
    },
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),
    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationErrors),
}

impl AppError {
    pub fn db(message: impl Into<String>, source: sqlx::error::Error) -> Self {
        Self::Db {
            message: message.into(),
            source,
        }
    }

    pub fn uuid(message: impl Into<String>, source: uuid::Error) -> Self {
        Self::UuidError {
            message: message.into(),
            source,
        }
    }

    fn is_server_error(&self) -> bool {
        Status::from(self).class().is_server_error()
    }
}

impl From<&AppError> for Status {
    fn from(e: &AppError) -> Self {
        match e {
            AppError::Db { .. } => Status::InternalServerError,
            AppError::UserNotFound => Status::NotFound,
            AppError::NotFound(_) => Status::NotFound,
            AppError::Conflict(_) => Status::Conflict,
            AppError::BadRequest(_) => Status::BadRequest,
            AppError::InvalidInput(_) => Status::BadRequest,
            AppError::NoFieldsToUpdate => Status::BadRequest,
            AppError::InvalidDate(_) => Status::UnprocessableEntity,
            AppError::UuidError { .. } => Status::BadRequest,
            AppError::InvalidQuantity(_) => Status::UnprocessableEntity,
            AppError::ValidationError(_) => Status::BadRequest,
        }
    }
}

impl<'r> Responder<'r, 'static> for AppError {
    fn respond_to(self, req: &Request<'_>) -> rocket::response::Result<'static> {
        let method = req.method();
        let uri = req.uri();

        let request_id = req
            .local_cache(|| None::<crate::middleware::RequestId>)
            .as_ref()
            .map(|r| r.0.as_str())
            .unwrap_or("unknown");

        if self.is_server_error() {
            error!(
                error = ?self,
                request_id = %request_id,
                method = %method,
                uri = %uri,
                "request failed"
            );
        } else {
            warn!(
                error = %self,
                request_id = %request_id,
                method = %method,
                uri = %uri,
                "request rejected"
            );
        }

        let status = Status::from(&self);
        let body = serde_json::json!({ "message": self.to_string() }).to_string();

        Response::build()
            .status(status)
            .header(ContentType::JSON)
            .sized_body(body.len(), Cursor::new(body))
            .ok()
    }
}

impl OpenApiResponderInner for AppError {
    fn responses(_gen: &mut OpenApiGenerator) -> Result<Responses, OpenApiError> {
        use rocket_okapi::okapi::openapi3::{RefOr, Response as OpenApiResponse};
        let mut responses = Responses::default();
        for (code, description) in [
            ("400", "Bad Request"),
            ("404", "Not Found"),
            ("409", "Conflict"),
            ("422", "Unprocessable Entity"),
            ("500", "Internal Server Error"),
        ] {
            responses.responses.insert(
                code.to_string(),
                RefOr::Object(OpenApiResponse {
                    description: description.to_string(),
                    ..Default::default()
                }),
            );
        }
        Ok(responses)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AppError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(ref db_error) if db_error.constraint() == Some(TRACKER_OWNER_DATE_CONSTRAINT) => {
                AppError::Conflict("Tracker already exists".to_string())
            }
            _ => AppError::db("Database error", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(Status::from(&AppError::UserNotFound), Status::NotFound);
        assert_eq!(Status::from(&AppError::Conflict("dup".to_string())), Status::Conflict);
        assert_eq!(Status::from(&AppError::InvalidInput("neg".to_string())), Status::BadRequest);
        assert_eq!(Status::from(&AppError::NoFieldsToUpdate), Status::BadRequest);
        assert_eq!(Status::from(&AppError::InvalidDate("x".to_string())), Status::UnprocessableEntity);
        assert_eq!(Status::from(&AppError::InvalidQuantity("-5".to_string())), Status::UnprocessableEntity);
        assert_eq!(Status::from(&AppError::db("boom", sqlx::Error::PoolTimedOut)), Status::InternalServerError);
    }

    #[test]
    fn internal_errors_do_not_leak_details() {
        let err = AppError::db("insert into users failed", sqlx::Error::PoolTimedOut);
        assert_eq!(err.to_string(), "Internal server error");
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        assert!(matches!(AppError::from(sqlx::Error::RowNotFound), AppError::NotFound(_)));
    }

    #[test]
    fn malformed_uuid_is_bad_request() {
        let err = AppError::uuid("Invalid user ID format", uuid::Uuid::parse_str("not-a-uuid").unwrap_err());
        assert_eq!(Status::from(&err), Status::BadRequest);
        assert_eq!(err.to_string(), "Invalid user ID format");
    }
}
