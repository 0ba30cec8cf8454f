use tracing::warn;

use crate::api::{ApiClient, ApiError, Empty};
use crate::models::{
    BrandSettings, ConnectPageRequest, ConnectedPage, GetSettingsResponse, Id, Settings,
    SystemSettings, UpdateSettingsRequest,
};

/// Tenant settings and social page integrations.
#[derive(Clone)]
pub struct SettingsService {
    client: ApiClient,
}

impl SettingsService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// The tenant's settings record, or `None` when it is missing or the
    /// request failed. Failures are logged, not returned.
    pub async fn get_settings(&self) -> Option<Settings> {
        match self.client.get::<GetSettingsResponse>("/tenant/settings").await {
            Ok(response) => response.into_first(),
            Err(e) => {
                warn!(error = %e, "Failed to load tenant settings");
                None
            }
        }
    }

    pub async fn update(
        &self,
        brand: &BrandSettings,
        system: &SystemSettings,
    ) -> Result<Settings, ApiError> {
        let body = UpdateSettingsRequest {
            brand_settings: brand,
            system_settings: system,
        };
        self.client.put("/tenant/settings", &body).await
    }

    // ===== Social pages =====

    pub async fn list_pages(&self) -> Result<Vec<ConnectedPage>, ApiError> {
        self.client.get("/tenant/social-pages").await
    }

    pub async fn connect_page(&self, platform: &str, access_token: &str) -> Result<(), ApiError> {
        let access_token = access_token.trim();
        if access_token.is_empty() {
            return Err(ApiError::InvalidRequest("An access token is required".to_string()));
        }
        let body = ConnectPageRequest {
            platform: platform.to_string(),
            access_token: access_token.to_string(),
        };
        self.client
            .post::<Empty, _>("/tenant/social-pages", &body)
            .await
            .map(|_| ())
    }

    pub async fn disconnect_page(&self, id: &Id) -> Result<(), ApiError> {
        self.client
            .delete::<Empty>(&format!("/tenant/social-pages/{}", id))
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::auth::MemoryTokenStore;
    use crate::models::PageStatus;

    fn service_for(server: &MockServer) -> SettingsService {
        let store = Arc::new(MemoryTokenStore::with_token("jwt"));
        SettingsService::new(ApiClient::new(server.base_url(), store).unwrap())
    }

    #[tokio::test]
    async fn test_get_settings_takes_first_record() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/tenant/settings");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({
                        "statusCode": 200,
                        "brandSettings": [{
                            "id": 4,
                            "tenantId": "t-9",
                            "brandSettings": {"industry": "Fintech", "tone": "Calm"},
                            "systemSettings": {"businessName": "Orca Pay", "currency": "VND"}
                        }]
                    }));
            })
            .await;

        let settings = service_for(&server).get_settings().await.unwrap();
        assert_eq!(settings.brand_settings.industry, "Fintech");
        assert_eq!(settings.system_settings.business_name, "Orca Pay");
    }

    #[tokio::test]
    async fn test_get_settings_swallows_errors() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/tenant/settings");
                then.status(500).body("down");
            })
            .await;

        assert!(service_for(&server).get_settings().await.is_none());
    }

    #[tokio::test]
    async fn test_update_sends_both_sections() {
        let server = MockServer::start_async().await;
        let brand = BrandSettings::default();
        let system = SystemSettings::default();
        let expected = json!({
            "brandSettings": serde_json::to_value(&brand).unwrap(),
            "systemSettings": serde_json::to_value(&system).unwrap(),
        });
        let mock = server
            .mock_async(|when, then| {
                when.method(PUT).path("/tenant/settings").json_body(expected);
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({"id": 1, "tenantId": "t-1"}));
            })
            .await;

        let saved = service_for(&server).update(&brand, &system).await.unwrap();
        mock.assert_async().await;
        assert_eq!(saved.tenant_id, "t-1");
    }

    #[tokio::test]
    async fn test_pages_lifecycle() {
        let server = MockServer::start_async().await;
        let list = server
            .mock_async(|when, then| {
                when.method(GET).path("/tenant/social-pages");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!([{
                        "id": "pg-1", "name": "Orca", "platform": "facebook",
                        "pageId": "55", "status": "active", "connectedAt": "2024-01-01"
                    }]));
            })
            .await;
        let connect = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/tenant/social-pages")
                    .json_body(json!({"platform": "instagram", "accessToken": "IGQ"}));
                then.status(201)
                    .header("content-type", "application/json")
                    .json_body(json!({"id": "pg-2"}));
            })
            .await;
        let disconnect = server
            .mock_async(|when, then| {
                when.method(DELETE).path("/tenant/social-pages/pg-1");
                then.status(200);
            })
            .await;

        let service = service_for(&server);
        let pages = service.list_pages().await.unwrap();
        assert_eq!(pages[0].status, PageStatus::Active);

        service.connect_page("instagram", "  IGQ ").await.unwrap();
        service.disconnect_page(&pages[0].id).await.unwrap();

        list.assert_async().await;
        connect.assert_async().await;
        disconnect.assert_async().await;
    }

    #[tokio::test]
    async fn test_connect_requires_token() {
        let server = MockServer::start_async().await;
        let err = service_for(&server).connect_page("facebook", "   ").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }
}
