//! API client for communicating with the OrcaFlow REST API.
//!
//! `ApiClient` builds every request (base URL + path, JSON content type,
//! bearer token), normalises failures into `ApiError` and reacts to session
//! expiry. Domain services in `crate::services` are thin wrappers over it.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::auth::TokenStore;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the session event channel.
/// Events carry no payload, so a lagging listener only needs to see one.
const EVENT_CHANNEL_CAPACITY: usize = 16;

const JSON_CONTENT_TYPE: &str = "application/json";

// ============================================================================
// Types
// ============================================================================

/// Process-wide session notifications broadcast by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A request came back 401; the stored token has already been removed.
    Unauthorized,
}

/// Whether a request carries the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Auth {
    #[default]
    Include,
    Skip,
}

/// Response type for endpoints whose body is irrelevant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Empty {}

/// API client for the OrcaFlow backend.
/// Clone is cheap - the connection pool, token store and event channel are shared.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
    events: broadcast::Sender<SessionEvent>,
}

impl ApiClient {
    /// Create a client without a request timeout (transport defaults apply).
    pub fn new(base_url: impl Into<String>, tokens: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, tokens, None)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        tokens: Arc<dyn TokenStore>,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!(%base_url, "API client configured");

        Ok(Self {
            client,
            base_url,
            tokens,
            events,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ===== Token access =====

    pub fn token(&self) -> Option<String> {
        self.tokens.get()
    }

    pub fn has_token(&self) -> bool {
        self.tokens.get().is_some()
    }

    pub fn set_token(&self, token: &str) -> anyhow::Result<()> {
        self.tokens.set(token)
    }

    /// Remove the stored token. Storage failures are logged, not returned:
    /// callers use this on paths that must always complete.
    pub fn remove_token(&self) {
        if let Err(e) = self.tokens.remove() {
            warn!(error = %e, "Failed to remove stored token");
        }
    }

    /// Listen for `SessionEvent`s from this client and all of its clones.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    // ===== Verbs =====

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let builder = self.builder(Method::GET, path, Auth::Include);
        self.dispatch(builder, path).await
    }

    /// GET with query parameters encoded from `query` (a struct or a list of pairs).
    pub async fn get_query<T, Q>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let builder = self.builder(Method::GET, path, Auth::Include).query(query);
        self.dispatch(builder, path).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, path, Some(body), Auth::Include).await
    }

    /// POST without a body.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let builder = self.builder(Method::POST, path, Auth::Include);
        self.dispatch(builder, path).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PUT, path, Some(body), Auth::Include).await
    }

    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PATCH, path, Some(body), Auth::Include).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let builder = self.builder(Method::DELETE, path, Auth::Include);
        self.dispatch(builder, path).await
    }

    /// Fully general request: any verb, optional JSON body, explicit auth.
    pub async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        auth: Auth,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mut builder = self.builder(method, path, auth);
        if let Some(body) = body {
            let json = serde_json::to_value(body)
                .map_err(|e| ApiError::InvalidRequest(format!("Failed to encode body for {}: {}", path, e)))?;
            builder = builder.json(&json);
        }
        self.dispatch(builder, path).await
    }

    // ===== Internals =====

    fn builder(&self, method: Method, path: &str, auth: Auth) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self
            .client
            .request(method.clone(), &url)
            .header(header::CONTENT_TYPE, JSON_CONTENT_TYPE);

        let mut authorized = false;
        if auth == Auth::Include {
            if let Some(token) = self.tokens.get() {
                builder = builder.bearer_auth(token);
                authorized = true;
            }
        }

        debug!(%method, path, authorized, "Sending API request");
        builder
    }

    async fn dispatch<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        path: &str,
    ) -> Result<T, ApiError> {
        let response = builder.send().await.map_err(|e| {
            warn!(path, error = %e, "API request failed to send");
            ApiError::Network(e)
        })?;

        self.handle_response(response, path).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: Response,
        path: &str,
    ) -> Result<T, ApiError> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = ApiError::from_status(status, &body);
            warn!(path, status = status.as_u16(), message = %error, "API returned an error");

            if status == StatusCode::UNAUTHORIZED {
                self.handle_unauthorized();
            }
            return Err(error);
        }

        let is_json = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains(JSON_CONTENT_TYPE))
            .unwrap_or(false);

        let text = response.text().await?;

        if is_json && !text.trim().is_empty() {
            serde_json::from_str(&text).map_err(|e| {
                ApiError::InvalidResponse(format!(
                    "Failed to parse response from {}: {} (body: {})",
                    path,
                    e,
                    ApiError::truncate_body(&text)
                ))
            })
        } else {
            // Empty or non-JSON success bodies read as an empty object
            serde_json::from_value(serde_json::Value::Object(Default::default())).map_err(|e| {
                ApiError::InvalidResponse(format!("Expected JSON body from {}: {}", path, e))
            })
        }
    }

    fn handle_unauthorized(&self) {
        warn!("Session rejected (401), clearing stored token");
        self.remove_token();
        if self.events.send(SessionEvent::Unauthorized).is_err() {
            debug!("No session listeners for unauthorized event");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokenStore;
    use httpmock::prelude::*;
    use serde_json::{json, Value};

    fn client_for(server: &MockServer, token: Option<&str>) -> (ApiClient, Arc<MemoryTokenStore>) {
        let store = Arc::new(MemoryTokenStore::new());
        if let Some(token) = token {
            store.set(token).expect("memory store never fails");
        }
        let client = ApiClient::new(server.base_url(), store.clone()).expect("client builds");
        (client, store)
    }

    #[tokio::test]
    async fn test_get_attaches_bearer_token() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/auth/me")
                    .header("authorization", "Bearer abc123")
                    .header("content-type", "application/json");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({"email": "a@b.co"}));
            })
            .await;

        let (client, _) = client_for(&server, Some("abc123"));
        let body: Value = client.get("/auth/me").await.expect("request succeeds");

        mock.assert_async().await;
        assert_eq!(body["email"], "a@b.co");
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/planner/posts")
                    .json_body(json!({"title": "Launch"}));
                then.status(201)
                    .header("content-type", "application/json")
                    .json_body(json!({"id": 7}));
            })
            .await;

        let (client, _) = client_for(&server, Some("t"));
        let body: Value = client
            .post("/planner/posts", &json!({"title": "Launch"}))
            .await
            .expect("request succeeds");

        mock.assert_async().await;
        assert_eq!(body["id"], 7);
    }

    #[tokio::test]
    async fn test_get_query_encodes_pairs() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/posts")
                    .query_param("startDate", "2024-01-01")
                    .query_param("endDate", "2024-01-31");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({"posts": []}));
            })
            .await;

        let (client, _) = client_for(&server, Some("t"));
        let query = [("startDate", "2024-01-01"), ("endDate", "2024-01-31")];
        let _: Value = client.get_query("/posts", &query).await.expect("request succeeds");

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unauthorized_clears_token_and_broadcasts() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/posts");
                then.status(401)
                    .header("content-type", "application/json")
                    .json_body(json!({"message": "Token expired"}));
            })
            .await;

        let (client, store) = client_for(&server, Some("stale-token"));
        let mut events = client.subscribe();

        let err = client.get::<Value>("/posts").await.expect_err("401 fails");

        assert!(err.is_unauthorized());
        assert_eq!(err.message(), "Token expired");
        assert_eq!(store.get(), None);
        assert_eq!(events.try_recv().expect("event sent"), SessionEvent::Unauthorized);
    }

    #[tokio::test]
    async fn test_unauthorized_without_token_still_signals() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/login");
                then.status(401).body("Unauthorized");
            })
            .await;

        let (client, store) = client_for(&server, None);
        let mut events = client.subscribe();

        let err = client
            .request::<Value, Value>(Method::POST, "/auth/login", Some(&json!({})), Auth::Skip)
            .await
            .expect_err("401 fails");

        assert_eq!(err.message(), "Unauthorized");
        assert_eq!(store.get(), None);
        assert!(events.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_error_message_from_json_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(PUT).path("/tenant/settings");
                then.status(422)
                    .header("content-type", "application/json")
                    .json_body(json!({
                        "message": "Validation failed",
                        "errors": {"currency": ["must be ISO 4217"]}
                    }));
            })
            .await;

        let (client, store) = client_for(&server, Some("t"));
        let err = client
            .put::<Value, _>("/tenant/settings", &json!({}))
            .await
            .expect_err("422 fails");

        assert_eq!(err.message(), "Validation failed");
        assert_eq!(err.status(), Some(422));
        assert_eq!(
            err.field_errors().expect("errors")["currency"],
            vec!["must be ISO 4217"]
        );
        // Only 401 touches the token
        assert_eq!(store.get().as_deref(), Some("t"));
    }

    #[tokio::test]
    async fn test_non_json_error_uses_status_text() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(DELETE).path("/planner/posts/3");
                then.status(503).body("<html>upstream down</html>");
            })
            .await;

        let (client, _) = client_for(&server, Some("t"));
        let err = client
            .delete::<Empty>("/planner/posts/3")
            .await
            .expect_err("503 fails");

        assert_eq!(err.message(), "Service Unavailable");
        assert_eq!(err.status(), Some(503));
    }

    #[tokio::test]
    async fn test_empty_success_body_is_empty_object() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(DELETE).path("/planner/posts/9");
                then.status(204);
            })
            .await;

        let (client, _) = client_for(&server, Some("t"));
        let body: Value = client.delete("/planner/posts/9").await.expect("204 succeeds");
        assert_eq!(body, json!({}));

        let empty: Empty = client.delete("/planner/posts/9").await.expect("204 succeeds");
        assert_eq!(empty, Empty {});
    }

    #[tokio::test]
    async fn test_non_json_success_body_is_empty_object() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/logout");
                then.status(200).header("content-type", "text/plain").body("OK");
            })
            .await;

        let (client, _) = client_for(&server, Some("t"));
        let body: Value = client.post_empty("/auth/logout").await.expect("200 succeeds");
        assert_eq!(body, json!({}));
    }

    #[tokio::test]
    async fn test_network_failure_is_network_error() {
        let store = Arc::new(MemoryTokenStore::new());
        let client = ApiClient::new("http://127.0.0.1:1", store).expect("client builds");

        let err = client.get::<Value>("/auth/me").await.expect_err("nothing listens");
        assert!(matches!(err, ApiError::Network(_)));
        assert!(!err.message().is_empty());
    }

    #[tokio::test]
    async fn test_slow_response_hits_timeout() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/posts");
                then.status(200).delay(Duration::from_secs(5)).json_body(json!({"posts": []}));
            })
            .await;

        let store = Arc::new(MemoryTokenStore::new());
        let client = ApiClient::with_timeout(server.base_url(), store, Some(Duration::from_millis(200)))
            .expect("client builds");

        let started = tokio::time::Instant::now();
        let err = client.get::<Value>("/posts").await.expect_err("times out");
        assert!(matches!(err, ApiError::Network(ref e) if e.is_timeout()));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let store = Arc::new(MemoryTokenStore::new());
        let client = ApiClient::new("http://localhost:3000/api/", store).expect("client builds");
        assert_eq!(client.base_url(), "http://localhost:3000/api");
    }
}
