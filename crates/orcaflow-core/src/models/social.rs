use serde::{Deserialize, Serialize};

use super::Id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    Active,
    Inactive,
    #[default]
    Pending,
}

impl PageStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PageStatus::Active => "Active",
            PageStatus::Inactive => "Inactive",
            PageStatus::Pending => "Pending",
        }
    }
}

/// A social page linked to the tenant (`GET /tenant/social-pages`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectedPage {
    pub id: Id,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub platform: String,
    #[serde(rename = "pageId", default)]
    pub page_id: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub followers: Option<u64>,
    #[serde(default)]
    pub status: PageStatus,
    #[serde(rename = "connectedAt", default)]
    pub connected_at: String,
}

impl ConnectedPage {
    /// Connection date without the time part.
    pub fn connected_on(&self) -> &str {
        self.connected_at.get(..10).unwrap_or(&self.connected_at)
    }
}

/// Body of `POST /tenant/social-pages`.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectPageRequest {
    pub platform: String,
    #[serde(rename = "accessToken")]
    pub access_token: String,
}
