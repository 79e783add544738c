use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::error::Error;

pub const REALM: &str = "Basic realm=\"icgeo\"";

pub const INSUFFICIENT_PRIVILEGE: &str =
    "Insufficient privileges for this operation.";
pub const UNIQUE_VIOLATION: &str =
    "Unique Violation. This user already exists.";

/// Every failure a handler can report, each with a fixed status code.
#[derive(Debug)]
pub enum ApiError {
    /// Required JSON keys or credentials are absent.
    MissingParameters(&'static str),
    /// No credentials, or credentials that do not match `api_users`.
    Unauthorized,
    /// SQLSTATE 42501.
    InsufficientPrivilege,
    /// SQLSTATE 23505.
    Conflict,
    BadRequest(String),
    NotFound(String),
    /// The database could not be reached or refused the login.
    Connection(String),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingParameters(_) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthorized | Self::InsufficientPrivilege => {
                StatusCode::UNAUTHORIZED
            }
            Self::Conflict => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Connection(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::MissingParameters(required) => {
                format!("Required parameters:\n{required}")
            }
            Self::Unauthorized => "Unauthorized Access".to_string(),
            Self::InsufficientPrivilege => INSUFFICIENT_PRIVILEGE.to_string(),
            Self::Conflict => UNIQUE_VIOLATION.to_string(),
            Self::BadRequest(msg) | Self::NotFound(msg) => msg.clone(),
            Self::Connection(detail) => {
                format!("Unable to connect to database. {detail}")
            }
            Self::Internal(msg) => msg.clone(),
        }
    }
}

/// Classify a PostgreSQL error by its SQLSTATE code.
///
/// Class 08 (connection exception) and class 28 (invalid authorization,
/// e.g. a wrong role password) both mean the login itself failed.
fn from_sqlstate(code: &str, message: String) -> ApiError {
    match code {
        "42501" => ApiError::InsufficientPrivilege,
        "23505" => ApiError::Conflict,
        c if c.starts_with("08") || c.starts_with("28") => {
            ApiError::Connection(message)
        }
        _ => ApiError::Internal(message),
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) => match db.code() {
                Some(code) => from_sqlstate(&code, db.message().to_string()),
                None => Self::Internal(db.message().to_string()),
            },
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed => Self::Connection(err.to_string()),
            _ => Self::Internal(err.to_string()),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Database(e) => e.into(),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        if status.is_server_error() {
            tracing::error!(%status, %message, "request failed");
        } else {
            tracing::debug!(%status, %message, "request rejected");
        }

        let body = Json(serde_json::json!({ "message": message }));
        let mut response = (status, body).into_response();
        if matches!(self, Self::Unauthorized) {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(REALM),
            );
        }
        response
    }
}
