//! Authenticated session state.
//!
//! `AuthSession` tracks who is signed in and reacts to the client's
//! unauthorized signal. Each operation comes in two halves: an async method
//! that performs the request, and a synchronous `finish_*` that applies its
//! result. The dashboard runs the request on a background task and applies
//! the result on its own loop; everything else just awaits the async method.

use thiserror::Error;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, info, warn};

use crate::api::{ApiError, SessionEvent};
use crate::models::{LoginResponse, User, UserProfile};
use crate::services::AuthService;

/// Shown when the backend gives no usable reason.
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed";

#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    /// Startup check of a stored token is in flight.
    Checking,
    Authenticated(User),
    Unauthenticated,
}

/// Login failure carrying a message fit for the login form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct LoginError {
    pub message: String,
}

impl LoginError {
    pub fn from_api(error: &ApiError) -> Self {
        let message = match error {
            ApiError::Status { message, .. } if !message.trim().is_empty() => message.clone(),
            ApiError::Status { .. } => LOGIN_FAILED_MESSAGE.to_string(),
            other => other.message(),
        };
        Self { message }
    }
}

pub struct AuthSession {
    service: AuthService,
    state: AuthState,
    events: broadcast::Receiver<SessionEvent>,
}

impl AuthSession {
    pub fn new(service: AuthService) -> Self {
        let events = service.client().subscribe();
        Self {
            service,
            state: AuthState::Checking,
            events,
        }
    }

    pub fn service(&self) -> &AuthService {
        &self.service
    }

    // ===== Accessors =====

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn user(&self) -> Option<&User> {
        match &self.state {
            AuthState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, AuthState::Authenticated(_))
    }

    pub fn is_loading(&self) -> bool {
        self.state == AuthState::Checking
    }

    // ===== Startup =====

    /// Validate a stored token against `/auth/me`.
    pub async fn initialize(&mut self) -> &AuthState {
        if !self.begin_initialize() {
            return &self.state;
        }
        let result = self.service.current_user().await;
        self.finish_initialize(result);
        &self.state
    }

    /// Returns `false` (and settles as unauthenticated) when there is no token to check.
    pub fn begin_initialize(&mut self) -> bool {
        if self.service.has_token() {
            self.state = AuthState::Checking;
            true
        } else {
            self.state = AuthState::Unauthenticated;
            false
        }
    }

    pub fn finish_initialize(&mut self, result: Result<UserProfile, ApiError>) {
        match result {
            Ok(profile) => {
                self.drain_events();
                let user = User::from(profile);
                info!(email = %user.email, "Restored session");
                self.state = AuthState::Authenticated(user);
            }
            Err(e) if e.is_unauthorized() => {
                warn!(error = %e, "Stored session is no longer valid");
                self.service.client().remove_token();
                self.state = AuthState::Unauthenticated;
            }
            Err(e) => {
                // Outages keep the token for the next attempt
                warn!(error = %e, "Could not validate stored session");
                self.state = AuthState::Unauthenticated;
            }
        }
    }

    // ===== Login / logout =====

    pub async fn login(&mut self, email: &str, password: &str) -> Result<User, LoginError> {
        let result = self.service.login(email, password).await;
        self.finish_login(result)
    }

    pub fn finish_login(&mut self, result: Result<LoginResponse, ApiError>) -> Result<User, LoginError> {
        match result {
            Ok(response) => {
                // Anything queued so far belongs to the previous session
                self.drain_events();
                let user = User::from(response.user);
                self.state = AuthState::Authenticated(user.clone());
                Ok(user)
            }
            Err(e) => {
                self.state = AuthState::Unauthenticated;
                Err(LoginError::from_api(&e))
            }
        }
    }

    /// Best-effort server logout; the local session always ends.
    pub async fn logout(&mut self) {
        self.service.logout().await;
        self.finish_logout();
    }

    /// End the session locally. The token stays until `finish_logout` so the
    /// server logout request can still carry it.
    pub fn begin_logout(&mut self) {
        self.state = AuthState::Unauthenticated;
    }

    pub fn finish_logout(&mut self) {
        self.service.client().remove_token();
        self.state = AuthState::Unauthenticated;
    }

    // ===== Signal =====

    /// Apply pending unauthorized signals. Returns `true` if the session ended.
    pub fn poll_events(&mut self) -> bool {
        let mut signalled = false;
        loop {
            match self.events.try_recv() {
                Ok(SessionEvent::Unauthorized) | Err(TryRecvError::Lagged(_)) => signalled = true,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }

        if signalled {
            debug!("Unauthorized signal received");
            let was_authenticated = self.is_authenticated();
            self.state = AuthState::Unauthenticated;
            return was_authenticated;
        }
        false
    }

    fn drain_events(&mut self) {
        while let Ok(_) | Err(TryRecvError::Lagged(_)) = self.events.try_recv() {}
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use httpmock::prelude::*;
    use serde_json::{json, Value};

    use super::*;
    use crate::api::ApiClient;
    use crate::auth::{MemoryTokenStore, TokenStore};

    fn session_for(server: &MockServer, token: Option<&str>) -> (AuthSession, Arc<MemoryTokenStore>) {
        let store = Arc::new(match token {
            Some(t) => MemoryTokenStore::with_token(t),
            None => MemoryTokenStore::new(),
        });
        let client = ApiClient::new(server.base_url(), store.clone()).unwrap();
        (AuthSession::new(AuthService::new(client)), store)
    }

    fn profile() -> Value {
        json!({
            "id": "u-1",
            "fullName": "Minh Nguyen",
            "tenantId": "t-1",
            "email": "minh@orcaflow.test",
            "tenantPermissions": ["crm:read"],
            "role": "editor"
        })
    }

    #[tokio::test]
    async fn test_initial_state_is_checking() {
        let server = MockServer::start_async().await;
        let (session, _) = session_for(&server, None);
        assert!(session.is_loading());
        assert!(session.user().is_none());
    }

    #[tokio::test]
    async fn test_initialize_without_token() {
        let server = MockServer::start_async().await;
        let (mut session, _) = session_for(&server, None);
        assert_eq!(session.initialize().await, &AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_initialize_with_valid_token() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/auth/me").header("authorization", "Bearer good");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(profile());
            })
            .await;

        let (mut session, _) = session_for(&server, Some("good"));
        session.initialize().await;
        let user = session.user().unwrap();
        assert_eq!(user.name, "Minh Nguyen");
        assert!(user.has_permission("crm:read"));
    }

    #[tokio::test]
    async fn test_initialize_with_rejected_token_clears_it() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/auth/me");
                then.status(401).body("");
            })
            .await;

        let (mut session, store) = session_for(&server, Some("bad"));
        session.initialize().await;
        assert_eq!(session.state(), &AuthState::Unauthenticated);
        assert_eq!(store.get(), None);
    }

    #[tokio::test]
    async fn test_initialize_during_outage_keeps_token() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/auth/me");
                then.status(500).body("nope");
            })
            .await;

        let (mut session, store) = session_for(&server, Some("good"));
        session.initialize().await;
        assert_eq!(session.state(), &AuthState::Unauthenticated);
        assert_eq!(store.get().as_deref(), Some("good"));
    }

    #[tokio::test]
    async fn test_login_failure_message() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/login");
                then.status(400)
                    .header("content-type", "application/json")
                    .json_body(json!({"message": "Invalid credentials"}));
            })
            .await;

        let (mut session, _) = session_for(&server, None);
        let err = session.login("minh@orcaflow.test", "wrong").await.unwrap_err();
        assert_eq!(err.message, "Invalid credentials");
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_login_error_fallback() {
        let err = ApiError::Status {
            status: 400,
            message: String::new(),
            errors: None,
        };
        assert_eq!(LoginError::from_api(&err).message, LOGIN_FAILED_MESSAGE);
    }

    #[tokio::test]
    async fn test_login_with_unstorable_token_stays_signed_out() {
        let server = MockServer::start_async().await;
        let (mut session, _) = session_for(&server, None);

        let err = session
            .finish_login(Err(ApiError::TokenStorage("keychain is locked".to_string())))
            .unwrap_err();
        assert_eq!(err.message, "Failed to store session token: keychain is locked");
        assert_eq!(session.state(), &AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_unauthorized_signal_ends_session() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/login");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({"access_token": "jwt", "user": profile()}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/posts");
                then.status(401).body("");
            })
            .await;

        let (mut session, store) = session_for(&server, None);
        session.login("minh@orcaflow.test", "pw").await.unwrap();
        assert!(session.is_authenticated());
        assert!(!session.poll_events());

        // Any request anywhere coming back 401 logs the session out
        let client = session.service().client().clone();
        let _ = client.get::<Value>("/posts").await;

        assert!(session.poll_events());
        assert_eq!(session.state(), &AuthState::Unauthenticated);
        assert_eq!(store.get(), None);
    }

    #[tokio::test]
    async fn test_stale_signal_does_not_end_new_session() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/posts");
                then.status(401).body("");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/login");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({"access_token": "fresh", "user": profile()}));
            })
            .await;

        let (mut session, store) = session_for(&server, Some("old"));
        let client = session.service().client().clone();
        let _ = client.get::<Value>("/posts").await;

        session.login("minh@orcaflow.test", "pw").await.unwrap();
        assert!(!session.poll_events());
        assert!(session.is_authenticated());
        assert_eq!(store.get().as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn test_logout_clears_token_even_if_server_fails() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/logout");
                then.status(503).body("");
            })
            .await;

        let (mut session, store) = session_for(&server, Some("jwt"));
        session.finish_login(Ok(serde_json::from_value(json!({"access_token": "jwt", "user": profile()})).unwrap()))
            .unwrap();
        session.logout().await;

        assert_eq!(session.state(), &AuthState::Unauthenticated);
        assert_eq!(store.get(), None);
    }

    #[tokio::test]
    async fn test_logout_request_carries_token() {
        let server = MockServer::start_async().await;
        let logout = server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/logout").header("authorization", "Bearer jwt");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({}));
            })
            .await;

        let (mut session, store) = session_for(&server, Some("jwt"));
        session.begin_logout();
        assert!(!session.is_authenticated());
        assert_eq!(store.get().as_deref(), Some("jwt"));

        session.service().logout().await;
        session.finish_logout();

        logout.assert_async().await;
        assert_eq!(store.get(), None);
        assert!(!session.poll_events());
    }
}
