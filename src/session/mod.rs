//! Session provider: owns the current [`Session`] and announces every change.
//!
//! The provider is the only writer of the session. Everything else holds a
//! [`watch::Receiver`] from [`SessionProvider::subscribe`] and reads the
//! current value when it needs the token. Each replacement bumps
//! [`SessionState::epoch`], which the collection stores use to drop responses
//! to requests issued under an older session.

mod auth;
mod file;

pub use auth::{AuthClient, AuthError, SignUpOutcome};
pub use file::SessionFile;

use std::sync::Arc;

use tokio::sync::watch;

use crate::config::Config;
use crate::models::Session;

/// Snapshot published to subscribers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    /// Incremented on every replacement, sign-out included.
    pub epoch: u64,
    pub session: Option<Session>,
}

impl SessionState {
    /// The session, unless it is missing or expired.
    pub fn active(&self) -> Option<&Session> {
        self.session.as_ref().filter(|s| !s.is_expired())
    }
}

#[derive(Clone)]
pub struct SessionProvider {
    state: Arc<watch::Sender<SessionState>>,
    auth: Option<AuthClient>,
    file: Option<SessionFile>,
}

impl SessionProvider {
    /// Provider with no identity backend and no persistence, starting signed out.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionState::default());
        Self {
            state: Arc::new(tx),
            auth: None,
            file: None,
        }
    }

    /// Provider starting from an already issued session.
    pub fn with_session(session: Session) -> Self {
        let provider = Self::new();
        provider.state.send_modify(|state| state.session = Some(session));
        provider
    }

    /// Provider wired to the configured identity backend.
    pub fn from_config(config: &Config, http: reqwest::Client) -> Self {
        let mut provider = Self::new();
        if let (Some(url), Some(key)) = (&config.auth_url, &config.auth_key) {
            provider.auth = Some(AuthClient::new(url.clone(), key.clone(), http));
        }
        provider
    }

    pub fn with_auth(mut self, auth: AuthClient) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Persist the session to `file` and restore whatever it already holds.
    pub fn with_file(mut self, file: SessionFile) -> Self {
        if let Some(session) = file.load() {
            self.state.send_modify(|state| state.session = Some(session));
        }
        self.file = Some(file);
        self
    }

    /// The stored session, expired or not.
    pub fn current(&self) -> Option<Session> {
        self.state.borrow().session.clone()
    }

    pub fn epoch(&self) -> u64 {
        self.state.borrow().epoch
    }

    /// Subscribe to session changes. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// The active session, refreshing it first when it has expired and a
    /// refresh token is available. Returns `None` when signed out.
    pub async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        match self.current() {
            Some(session) if session.is_expired() => {
                if session.refresh_token.is_some() && self.auth.is_some() {
                    self.refresh().await.map(Some)
                } else {
                    tracing::info!("Stored session expired, signing out");
                    self.replace(None);
                    Ok(None)
                }
            }
            other => Ok(other),
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let auth = self.auth()?;
        let session = auth.sign_in(email, password).await?;
        tracing::info!("Signed in as {}", session.user_label());
        self.replace(Some(session.clone()));
        Ok(session)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AuthError> {
        let auth = self.auth()?;
        let outcome = auth.sign_up(email, password).await?;
        match &outcome {
            SignUpOutcome::SignedIn(session) => {
                tracing::info!("Signed up and signed in as {}", session.user_label());
                self.replace(Some(session.clone()));
            }
            SignUpOutcome::PendingConfirmation { email } => {
                tracing::info!("Sign-up for {} awaiting email confirmation", email);
            }
        }
        Ok(outcome)
    }

    /// Exchange the refresh token for a new session, replacing the old one.
    pub async fn refresh(&self) -> Result<Session, AuthError> {
        let auth = self.auth()?;
        let refresh_token = self
            .current()
            .and_then(|s| s.refresh_token)
            .ok_or(AuthError::NoRefreshToken)?;
        match auth.refresh(&refresh_token).await {
            Ok(session) => {
                tracing::info!("Session refreshed for {}", session.user_label());
                self.replace(Some(session.clone()));
                Ok(session)
            }
            Err(e) => {
                tracing::warn!("Session refresh failed: {}", e);
                self.replace(None);
                Err(e)
            }
        }
    }

    /// Sign out locally, telling the identity backend when one is configured.
    /// The local session is dropped even if the backend call fails.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let revoke = match (&self.auth, self.current()) {
            (Some(auth), Some(session)) => auth.sign_out(&session.access_token).await,
            _ => Ok(()),
        };
        self.replace(None);
        tracing::info!("Signed out");
        revoke
    }

    /// Replace the session wholesale and notify subscribers.
    pub fn replace(&self, session: Option<Session>) {
        if let Some(file) = &self.file {
            let persisted = match &session {
                Some(session) => file.save(session),
                None => file.clear(),
            };
            if let Err(e) = persisted {
                tracing::warn!("Failed to persist session: {}", e);
            }
        }
        self.state.send_modify(|state| {
            state.epoch += 1;
            state.session = session;
        });
    }

    fn auth(&self) -> Result<&AuthClient, AuthError> {
        self.auth.as_ref().ok_or(AuthError::NotConfigured)
    }
}

impl Default for SessionProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionUser;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn session(valid_for: Duration) -> Session {
        Session {
            access_token: "token".into(),
            refresh_token: None,
            user: SessionUser {
                id: Uuid::new_v4(),
                email: Some("ana@example.com".into()),
            },
            expires_at: Utc::now() + valid_for,
        }
    }

    #[test]
    fn replace_bumps_epoch_and_notifies() {
        let provider = SessionProvider::with_session(session(Duration::hours(1)));
        let mut rx = provider.subscribe();
        assert_eq!(provider.epoch(), 0);

        provider.replace(None);

        assert_eq!(provider.epoch(), 1);
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().session.is_none());
    }

    #[test]
    fn expired_session_is_not_active() {
        let provider = SessionProvider::with_session(session(Duration::seconds(-5)));
        assert!(provider.current().is_some());
        assert!(provider.subscribe().borrow().active().is_none());
    }

    #[tokio::test]
    async fn get_session_drops_expired_session_without_refresh_token() {
        let provider = SessionProvider::with_session(session(Duration::seconds(-5)));
        let current = provider.get_session().await.unwrap();
        assert!(current.is_none());
        assert!(provider.current().is_none());
    }

    #[tokio::test]
    async fn sign_in_without_backend_is_not_configured() {
        let provider = SessionProvider::new();
        let result = provider.sign_in("ana@example.com", "secret").await;
        assert!(matches!(result, Err(AuthError::NotConfigured)));
    }
}
