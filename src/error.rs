//! Error types for the imoveis API.
//!
//! Errors are defined with `thiserror` and converted into JSON responses
//! carrying an `erro` message. Driver details are logged, never returned.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error, warn};

pub const CONNECTION_FAILED_MESSAGE: &str = "Erro ao conectar ao banco de dados";
pub const NOT_FOUND_MESSAGE: &str = "Nenhum imóvel encontrado";
pub const QUERY_FAILED_MESSAGE: &str = "Erro ao executar operação no banco de dados";
pub const INTERNAL_MESSAGE: &str = "Erro interno do servidor";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Connection failed: {message}")]
    Connection { message: String },

    #[error("Database error: {message}")]
    Database {
        message: String,
        /// e.g., "42S02" for unknown table
        sql_state: Option<String>,
    },

    #[error("No property found")]
    NotFound,

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ApiError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>, sql_state: Option<String>) -> Self {
        Self::Database {
            message: message.into(),
            sql_state,
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// HTTP status this error is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            Self::Connection { .. } | Self::Database { .. } | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message exposed to the caller.
    pub fn public_message(&self) -> String {
        match self {
            Self::Connection { .. } => CONNECTION_FAILED_MESSAGE.to_string(),
            Self::Database { .. } => QUERY_FAILED_MESSAGE.to_string(),
            Self::NotFound => NOT_FOUND_MESSAGE.to_string(),
            Self::InvalidInput { message } => message.clone(),
            Self::Internal { .. } => INTERNAL_MESSAGE.to_string(),
        }
    }
}

/// Convert sqlx errors to ApiError.
///
/// Anything raised while talking to the server after the connection is up
/// is a query failure, except transport-level problems.
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => ApiError::connection(msg.to_string()),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                ApiError::database(db_err.message(), code)
            }
            sqlx::Error::Io(io_err) => ApiError::connection(format!("I/O error: {}", io_err)),
            sqlx::Error::Tls(tls_err) => ApiError::connection(format!("TLS error: {}", tls_err)),
            sqlx::Error::Protocol(msg) => ApiError::connection(format!("Protocol error: {}", msg)),
            sqlx::Error::RowNotFound => ApiError::NotFound,
            sqlx::Error::ColumnNotFound(col) => {
                ApiError::database(format!("Column not found: {}", col), None)
            }
            sqlx::Error::ColumnDecode { index, source } => ApiError::database(
                format!("Failed to decode column {}: {}", index, source),
                None,
            ),
            sqlx::Error::Decode(source) => {
                ApiError::database(format!("Decode error: {}", source), None)
            }
            sqlx::Error::WorkerCrashed => ApiError::internal("Database worker crashed"),
            _ => ApiError::internal(format!("Unknown database error: {}", err)),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::NotFound => debug!("No property matched the request"),
            Self::InvalidInput { message } => warn!(%message, "Rejected invalid input"),
            Self::Database { message, sql_state } => {
                error!(%message, sql_state = ?sql_state, "Database operation failed")
            }
            Self::Connection { message } => error!(%message, "Database connection failed"),
            Self::Internal { message } => error!(%message, "Internal error"),
        }

        let body = json!({ "erro": self.public_message() });
        (self.status_code(), Json(body)).into_response()
    }
}
