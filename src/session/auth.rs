//! Client for a GoTrue-compatible identity service.

use chrono::{DateTime, Duration, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::models::{Session, SessionUser};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Identity provider is not configured")]
    NotConfigured,

    #[error("No refresh token available")]
    NoRefreshToken,

    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Identity provider unreachable: {0}")]
    Network(String),

    #[error("Unexpected identity provider response: {0}")]
    Unexpected(String),
}

/// Result of a sign-up. Providers that require email confirmation do not
/// issue a session until the address is confirmed.
#[derive(Debug, Clone, PartialEq)]
pub enum SignUpOutcome {
    PendingConfirmation { email: String },
    SignedIn(Session),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: SessionUser,
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or_else(|| now + Duration::seconds(self.expires_in.unwrap_or(3600)));
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            user: self.user,
            expires_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl AuthClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            http,
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let body = serde_json::json!({ "email": email, "password": password });
        let value = self.post("/auth/v1/token?grant_type=password", &body, None).await?;
        parse_token(value)
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<Session, AuthError> {
        let body = serde_json::json!({ "refresh_token": refresh_token });
        let value = self
            .post("/auth/v1/token?grant_type=refresh_token", &body, None)
            .await?;
        parse_token(value)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AuthError> {
        let body = serde_json::json!({ "email": email, "password": password });
        let value = self.post("/auth/v1/signup", &body, None).await?;
        if value.get("access_token").is_some() {
            return parse_token(value).map(SignUpOutcome::SignedIn);
        }
        let email = value
            .get("email")
            .and_then(Value::as_str)
            .unwrap_or(email)
            .to_string();
        Ok(SignUpOutcome::PendingConfirmation { email })
    }

    pub async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        self.post("/auth/v1/logout", &Value::Null, Some(access_token))
            .await
            .map(|_| ())
    }

    async fn post(&self, path: &str, body: &Value, bearer: Option<&str>) -> Result<Value, AuthError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("POST {}", url);
        let mut req = self.http.post(&url).header("apikey", &self.api_key);
        if let Some(token) = bearer {
            req = req.bearer_auth(token);
        }
        if !body.is_null() {
            req = req.json(body);
        }
        let response = req
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        if status.is_success() {
            if bytes.is_empty() || status == StatusCode::NO_CONTENT {
                return Ok(Value::Null);
            }
            serde_json::from_slice(&bytes).map_err(|e| AuthError::Unexpected(e.to_string()))
        } else {
            Err(AuthError::Rejected {
                status: status.as_u16(),
                message: error_message(&bytes)
                    .unwrap_or_else(|| format!("Authentication failed ({})", status)),
            })
        }
    }
}

fn parse_token(value: Value) -> Result<Session, AuthError> {
    let token: TokenResponse =
        serde_json::from_value(value).map_err(|e| AuthError::Unexpected(e.to_string()))?;
    Ok(token.into_session(Utc::now()))
}

/// GoTrue reports errors under different keys depending on the endpoint.
fn error_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}
