use rocket::http::Status;
use rocket::request::Request;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rusqlite::ffi;
use serde_json::{json, Value};
use thiserror::Error;

/// Errors produced by the store, association, and validation layers.
/// Constraint violations from SQLite are translated here so callers can
/// distinguish a duplicate name from a generic bad request.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Validation(String),

    #[error("duplicate value for {0}")]
    Duplicate(String),

    #[error("not found")]
    NotFound,

    #[error("referenced record does not exist")]
    ForeignKey,

    #[error("{0}")]
    UploadRejected(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("database error: {0}")]
    Database(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        StoreError::Validation(msg.into())
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        StoreError::UploadRejected(msg.into())
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(code, ref msg) = e {
            match code.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    // Message looks like "UNIQUE constraint failed: categories.name"
                    let field = msg
                        .as_deref()
                        .and_then(|m| m.rsplit(": ").next())
                        .unwrap_or("value")
                        .to_string();
                    return StoreError::Duplicate(field);
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => return StoreError::ForeignKey,
                _ => {}
            }
        }
        StoreError::Database(e.to_string())
    }
}

impl From<r2d2::Error> for StoreError {
    fn from(e: r2d2::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

/// JSON error responder for API routes. Maps the store taxonomy onto HTTP
/// statuses and a uniform `{"success": false, "message": ...}` body.
#[derive(Debug)]
pub struct ApiError(pub StoreError);

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError(e)
    }
}

impl ApiError {
    pub fn not_found() -> Self {
        ApiError(StoreError::NotFound)
    }

    fn status(&self) -> Status {
        match self.0 {
            StoreError::Validation(_) | StoreError::UploadRejected(_) => Status::BadRequest,
            StoreError::Duplicate(_) => Status::Conflict,
            StoreError::NotFound | StoreError::ForeignKey => Status::NotFound,
            StoreError::Unauthorized(_) => Status::Unauthorized,
            StoreError::Database(_) => Status::InternalServerError,
        }
    }

    fn body(&self) -> Value {
        let message = match &self.0 {
            // Internals stay in the log, not the response
            StoreError::Database(detail) => {
                log::error!("unexpected database error: {}", detail);
                "internal error".to_string()
            }
            other => other.to_string(),
        };
        json!({ "success": false, "message": message })
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        let mut res = Json(self.body()).respond_to(req)?;
        res.set_status(status);
        Ok(res)
    }
}
