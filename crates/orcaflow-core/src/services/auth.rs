use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::{ApiClient, ApiError, Auth, Empty};
use crate::models::{LoginResponse, UserProfile};

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct RefreshResponse {
    #[serde(default)]
    token: String,
}

/// Login, logout and token housekeeping against `/auth/*`.
#[derive(Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Authenticate without a bearer token and store the issued one.
    ///
    /// A token that cannot be stored fails the login.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let body = LoginRequest { email, password };
        let response: LoginResponse = self
            .client
            .request(Method::POST, "/auth/login", Some(&body), Auth::Skip)
            .await?;

        if !response.access_token.is_empty() {
            self.client.set_token(&response.access_token).map_err(|e| {
                warn!(error = %e, "Failed to persist session token");
                ApiError::TokenStorage(e.to_string())
            })?;
        }

        info!(email, "Logged in");
        Ok(response)
    }

    /// Tell the server we are leaving, then forget the token no matter what it said.
    pub async fn logout(&self) {
        if let Err(e) = self.client.post_empty::<Empty>("/auth/logout").await {
            warn!(error = %e, "Logout request failed, clearing token anyway");
        }
        self.client.remove_token();
    }

    pub async fn current_user(&self) -> Result<UserProfile, ApiError> {
        self.client.get("/auth/me").await
    }

    /// Exchange the current token for a fresh one. Any failure drops the token.
    pub async fn refresh_token(&self) -> Result<String, ApiError> {
        match self.client.post_empty::<RefreshResponse>("/auth/refresh").await {
            Ok(response) => {
                if !response.token.is_empty() {
                    if let Err(e) = self.client.set_token(&response.token) {
                        warn!(error = %e, "Failed to persist refreshed token");
                    }
                }
                Ok(response.token)
            }
            Err(e) => {
                self.client.remove_token();
                Err(e)
            }
        }
    }

    pub async fn verify_token(&self) -> bool {
        self.client.get::<Empty>("/auth/verify").await.is_ok()
    }

    pub fn has_token(&self) -> bool {
        self.client.has_token()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::auth::{MemoryTokenStore, TokenStore};

    fn service_for(server: &MockServer, token: Option<&str>) -> (AuthService, Arc<MemoryTokenStore>) {
        let store = Arc::new(match token {
            Some(t) => MemoryTokenStore::with_token(t),
            None => MemoryTokenStore::new(),
        });
        let client = ApiClient::new(server.base_url(), store.clone()).unwrap();
        (AuthService::new(client), store)
    }

    fn login_body() -> serde_json::Value {
        json!({
            "access_token": "jwt-abc",
            "user": {
                "id": 12,
                "fullName": "Linh Tran",
                "tenantId": "t-1",
                "email": "linh@orcaflow.test",
                "tenantPermissions": ["planner:write"],
                "role": "admin"
            }
        })
    }

    #[tokio::test]
    async fn test_login_stores_token_and_later_requests_carry_it() {
        let server = MockServer::start_async().await;
        let login = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/auth/login")
                    .json_body(json!({"email": "linh@orcaflow.test", "password": "pw"}));
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(login_body());
            })
            .await;
        let me = server
            .mock_async(|when, then| {
                when.method(GET).path("/auth/me").header("authorization", "Bearer jwt-abc");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(login_body()["user"].clone());
            })
            .await;

        let (service, store) = service_for(&server, None);
        let response = service.login("linh@orcaflow.test", "pw").await.unwrap();
        assert_eq!(response.user.full_name, "Linh Tran");
        assert_eq!(store.get().as_deref(), Some("jwt-abc"));

        let profile = service.current_user().await.unwrap();
        assert_eq!(profile.email, "linh@orcaflow.test");

        login.assert_async().await;
        me.assert_async().await;
    }

    #[tokio::test]
    async fn test_login_with_empty_token_stores_nothing() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/login");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({"access_token": "", "user": {"id": 1}}));
            })
            .await;

        let (service, store) = service_for(&server, None);
        service.login("a@b.co", "pw").await.unwrap();
        assert_eq!(store.get(), None);
    }

    /// Store whose writes always fail, like a locked keychain.
    struct ReadOnlyStore;

    impl TokenStore for ReadOnlyStore {
        fn get(&self) -> Option<String> {
            None
        }
        fn set(&self, _token: &str) -> anyhow::Result<()> {
            anyhow::bail!("keychain is locked")
        }
        fn remove(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_login_fails_when_token_cannot_be_stored() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/login");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(login_body());
            })
            .await;

        let client = ApiClient::new(server.base_url(), Arc::new(ReadOnlyStore)).unwrap();
        let service = AuthService::new(client);
        let err = service.login("linh@orcaflow.test", "pw").await.unwrap_err();

        assert!(matches!(err, ApiError::TokenStorage(_)));
        assert!(err.message().contains("keychain is locked"));
        assert!(!service.has_token());
    }

    #[tokio::test]
    async fn test_logout_clears_token_even_if_server_fails() {
        let server = MockServer::start_async().await;
        let logout = server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/logout");
                then.status(500).body("boom");
            })
            .await;

        let (service, store) = service_for(&server, Some("jwt-abc"));
        service.logout().await;

        logout.assert_async().await;
        assert_eq!(store.get(), None);
        assert!(!service.has_token());
    }

    #[tokio::test]
    async fn test_refresh_token_replaces_token() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/refresh").header("authorization", "Bearer old");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({"token": "new"}));
            })
            .await;

        let (service, store) = service_for(&server, Some("old"));
        assert_eq!(service.refresh_token().await.unwrap(), "new");
        assert_eq!(store.get().as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_refresh_failure_removes_token() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/refresh");
                then.status(403)
                    .header("content-type", "application/json")
                    .json_body(json!({"message": "Refresh not allowed"}));
            })
            .await;

        let (service, store) = service_for(&server, Some("old"));
        let err = service.refresh_token().await.unwrap_err();
        assert_eq!(err.message(), "Refresh not allowed");
        assert_eq!(store.get(), None);
    }

    #[tokio::test]
    async fn test_verify_token() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/auth/verify").header("authorization", "Bearer good");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({"valid": true}));
            })
            .await;

        let (service, _) = service_for(&server, Some("good"));
        assert!(service.verify_token().await);

        let (service, _) = service_for(&server, Some("bad"));
        assert!(!service.verify_token().await);
    }
}
