//! HTTP Basic authentication against the `api_users` table.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use base64::{Engine, engine::general_purpose::STANDARD};

use super::{AppState, error::ApiError};
use crate::{db, password};

/// Username and password from an `Authorization: Basic …` header.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl BasicCredentials {
    /// Decode `Basic <base64(user:pass)>`. The password may contain `:`.
    pub fn parse(value: &str) -> Option<Self> {
        let (scheme, encoded) = value.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return None;
        }
        let decoded = STANDARD.decode(encoded.trim()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (username, password) = decoded.split_once(':')?;
        Some(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
        Self::parse(value)
    }
}

/// A caller whose Basic credentials verified against `api_users`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(creds) = BasicCredentials::from_headers(&parts.headers) else {
            tracing::debug!("missing or malformed authorization header");
            return Err(ApiError::Unauthorized);
        };

        let stored = db::find_user_hash(&state.pool, &creds.username).await?;
        tokio::task::spawn_blocking(move || check(creds, stored))
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?
    }
}

/// Decide whether `creds` match the hash stored for that username.
///
/// An unknown user, a wrong password and an unusable stored hash are all
/// rejected the same way.
pub fn check(
    creds: BasicCredentials,
    stored: Option<String>,
) -> Result<AuthUser, ApiError> {
    let Some(stored) = stored else {
        tracing::debug!(username = %creds.username, "unknown api user");
        return Err(ApiError::Unauthorized);
    };

    match password::verify(&creds.password, &stored) {
        Ok(true) => Ok(AuthUser {
            username: creds.username,
        }),
        Ok(false) => {
            tracing::debug!(username = %creds.username, "password mismatch");
            Err(ApiError::Unauthorized)
        }
        Err(e) => {
            tracing::warn!(
                username = %creds.username,
                error = %e,
                "unusable stored hash"
            );
            Err(ApiError::Unauthorized)
        }
    }
}
