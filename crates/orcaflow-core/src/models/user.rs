use serde::{Deserialize, Serialize};

use super::Id;

/// Profile returned by `/auth/me` and embedded in the login response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct UserProfile {
    pub id: Id,
    #[serde(rename = "fullName", default)]
    pub full_name: String,
    #[serde(rename = "tenantId", default)]
    pub tenant_id: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "tenantPermissions", default)]
    pub tenant_permissions: Vec<String>,
    #[serde(default)]
    pub role: String,
}

/// Body of a successful `/auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub access_token: String,
    pub user: UserProfile,
}

/// The signed-in user as the dashboard sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Id,
    pub name: String,
    pub email: String,
    pub tenant_id: String,
    pub role: String,
    pub tenant_permissions: Vec<String>,
}

impl User {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.tenant_permissions.iter().any(|p| p == permission)
    }

    /// Name for headers, falling back to the email when the profile has none.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.email
        } else {
            &self.name
        }
    }
}

impl From<UserProfile> for User {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.id,
            name: profile.full_name,
            email: profile.email,
            tenant_id: profile.tenant_id,
            role: profile.role,
            tenant_permissions: profile.tenant_permissions,
        }
    }
}
