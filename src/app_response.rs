use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Error as SerdeError;

/// Outcome envelope shared by the Rust API and the C ABI.
///
/// Every error variant keeps the underlying cause as text so it can be shown
/// to the user unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AppResponse {
    DatabaseError(String),
    SerializationError(String),
    NotFound(String),
    ValidationError(String),
    BadRequest(String),
    Ok(String),
}

impl Display for AppResponse {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AppResponse::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppResponse::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            AppResponse::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppResponse::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppResponse::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppResponse::Ok(msg) => write!(f, "Ok: {}", msg),
        }
    }
}

impl std::error::Error for AppResponse {}

impl From<lmdb::Error> for AppResponse {
    fn from(err: lmdb::Error) -> Self {
        match err {
            lmdb::Error::NotFound => AppResponse::NotFound("Key not found".to_string()),
            lmdb::Error::Corrupted => {
                AppResponse::DatabaseError(format!("Database is corrupted: {}", err))
            }
            lmdb::Error::MapFull => AppResponse::DatabaseError(format!(
                "Database map is full, raise map_size: {}",
                err
            )),
            _ => AppResponse::DatabaseError(format!("LMDB error: {}", err)),
        }
    }
}

impl From<SerdeError> for AppResponse {
    fn from(err: SerdeError) -> Self {
        AppResponse::SerializationError(format!("JSON serialization error: {}", err))
    }
}

impl From<std::io::Error> for AppResponse {
    fn from(err: std::io::Error) -> Self {
        AppResponse::DatabaseError(format!("IO error: {}", err))
    }
}

impl AppResponse {
    pub fn success(msg: impl Into<String>) -> Self {
        AppResponse::Ok(msg.into())
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, AppResponse::Ok(_))
    }

    /// Short text suitable for a toast or snackbar in the host UI.
    pub fn user_message(&self, action: &str) -> String {
        match self {
            AppResponse::Ok(_) => format!("{action} succeeded"),
            other => format!("{action} failed: {other}"),
        }
    }
}
