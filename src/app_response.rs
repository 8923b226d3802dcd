use std::fmt::{Display, Formatter};

use lmdb::Error as LmdbError;
use serde::{Deserialize, Serialize};
use serde_json::Error as SerdeError;

/// Outcome of every store operation, also the JSON envelope handed across FFI.
///
/// Malformed stored payloads never show up here: they are recovered inside
/// the record store and only logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppResponse {
    StorageFailure(String),
    SerializationError(String),
    InvalidInput(String),
    NotFound(String),
    PermissionDenied(String),
    BadRequest(String),
    Ok(String),
}

impl Display for AppResponse {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AppResponse::StorageFailure(msg) => write!(f, "Storage failure: {}", msg),
            AppResponse::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            AppResponse::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AppResponse::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppResponse::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            AppResponse::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppResponse::Ok(msg) => write!(f, "Ok: {}", msg),
        }
    }
}

impl std::error::Error for AppResponse {}

impl From<LmdbError> for AppResponse {
    fn from(err: LmdbError) -> Self {
        match err {
            LmdbError::MapFull => {
                AppResponse::StorageFailure("storage capacity exceeded".to_string())
            }
            LmdbError::NotFound => AppResponse::NotFound("key not found".to_string()),
            LmdbError::Corrupted | LmdbError::Panic => {
                AppResponse::StorageFailure(format!("Storage is corrupted: {}", err))
            }
            _ => AppResponse::StorageFailure(format!("LMDB error: {}", err)),
        }
    }
}

impl From<SerdeError> for AppResponse {
    fn from(err: SerdeError) -> Self {
        AppResponse::SerializationError(format!("JSON serialization error: {}", err))
    }
}

impl AppResponse {
    pub fn success(msg: impl Into<String>) -> Self {
        AppResponse::Ok(msg.into())
    }

    /// True for the failure classes a caller should show as a validation
    /// or authorization message rather than a storage problem.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            AppResponse::InvalidInput(_)
                | AppResponse::NotFound(_)
                | AppResponse::PermissionDenied(_)
                | AppResponse::BadRequest(_)
        )
    }
}
