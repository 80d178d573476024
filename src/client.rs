//! HTTP client for the obligations API.
//!
//! Every call carries the current session's bearer token. Without an active
//! session a call fails with [`ApiError::Unauthenticated`] before anything is
//! sent. Failures are never retried here; that is the caller's decision.

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::watch;

use crate::config::{Config, ConfigError};
use crate::models::*;
use crate::session::{SessionProvider, SessionState};

/// Message shown when the server gives no usable `detail`.
const GENERIC_FAILURE: &str = "The API request failed.";

/// API client errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("Not signed in or the session has expired")]
    Unauthenticated,

    #[error("{detail}")]
    RequestFailed { status: u16, detail: String },

    #[error("API unreachable: {0}")]
    NetworkUnavailable(String),

    #[error("Unexpected API response: {0}")]
    Unexpected(String),

    #[error("{0}")]
    Invalid(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Invalid(e.to_string())
    }
}

/// HTTP client for the obligations API.
#[derive(Debug, Clone)]
pub struct ResourceClient {
    base_url: String,
    http: reqwest::Client,
    session: watch::Receiver<SessionState>,
}

impl ResourceClient {
    pub fn new(base_url: impl Into<String>, http: reqwest::Client, session: &SessionProvider) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
            session: session.subscribe(),
        }
    }

    pub fn from_config(config: &Config, session: &SessionProvider) -> Result<Self, ConfigError> {
        Ok(Self::new(config.api_url.clone(), config.http_client()?, session))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Epoch of the session requests are currently issued under.
    pub fn session_epoch(&self) -> u64 {
        self.session.borrow().epoch
    }

    fn bearer(&self) -> Result<String, ApiError> {
        self.session
            .borrow()
            .active()
            .map(|s| s.access_token.clone())
            .ok_or(ApiError::Unauthenticated)
    }

    /// Issue one authenticated request and return the decoded JSON body.
    /// An empty success body decodes to `Value::Null`.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let token = match self.bearer() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!("Refusing {} {} without an active session", method, path);
                return Err(e);
            }
        };

        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("{} {}", method, url);

        let mut req = self.http.request(method, &url).bearer_auth(token);
        if let Some(body) = body {
            req = req.json(body);
        }
        let response = req
            .send()
            .await
            .map_err(|e| ApiError::NetworkUnavailable(e.to_string()))?;
        self.handle_response(response).await
    }

    /// Handle response, converting HTTP errors to ApiError.
    async fn handle_response(&self, response: reqwest::Response) -> Result<Value, ApiError> {
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::NetworkUnavailable(e.to_string()))?;

        if status.is_success() {
            if bytes.iter().all(u8::is_ascii_whitespace) {
                return Ok(Value::Null);
            }
            serde_json::from_slice(&bytes).map_err(|e| ApiError::Unexpected(e.to_string()))
        } else {
            let detail = detail_message(&bytes).unwrap_or_else(|| GENERIC_FAILURE.to_string());
            tracing::warn!("API returned {}: {}", status, detail);
            Err(ApiError::RequestFailed {
                status: status.as_u16(),
                detail,
            })
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T, ApiError> {
        let value = self.request(method, path, body).await?;
        decode(value)
    }

    // ============================================================
    // Company Operations
    // ============================================================

    pub async fn list_companies(&self) -> Result<Vec<Company>, ApiError> {
        self.send(Method::GET, "/empresas/", None).await
    }

    // ============================================================
    // Obligation Operations
    // ============================================================

    pub async fn list_obligations(&self, company_id: CompanyId) -> Result<Vec<Obligation>, ApiError> {
        self.send(
            Method::GET,
            &format!("/empresas/{}/obligaciones/", company_id),
            None,
        )
        .await
    }

    // ============================================================
    // Dashboard
    // ============================================================

    pub async fn dashboard_summary(&self) -> Result<DashboardSummary, ApiError> {
        self.send(Method::GET, "/dashboard/summary", None).await
    }
}

pub(crate) fn encode<T: Serialize>(input: &T) -> Result<Value, ApiError> {
    serde_json::to_value(input).map_err(|e| ApiError::Unexpected(e.to_string()))
}

pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::Unexpected(e.to_string()))
}

/// The API reports failures as `{"detail": "..."}`. Validation failures use a
/// list under the same key; those fall back to the generic message.
fn detail_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    value
        .get("detail")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_detail_string() {
        assert_eq!(
            detail_message(br#"{"detail":"Empresa no encontrada o no pertenece al usuario."}"#)
                .as_deref(),
            Some("Empresa no encontrada o no pertenece al usuario.")
        );
    }

    #[test]
    fn ignores_non_string_detail() {
        assert_eq!(detail_message(br#"{"detail":[{"loc":["body"],"msg":"x"}]}"#), None);
        assert_eq!(detail_message(b"Internal Server Error"), None);
        assert_eq!(detail_message(br#"{"detail":""}"#), None);
    }

    #[test]
    fn validation_errors_become_invalid() {
        let err: ApiError = ValidationError::NegativeAmount.into();
        assert_eq!(err, ApiError::Invalid("estimated amount cannot be negative".into()));
    }
}
