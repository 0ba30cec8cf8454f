//! Typed facades over `ApiClient`, one per backend area.

pub mod auth;
pub mod planner;
pub mod settings;

pub use auth::AuthService;
pub use planner::PlannerService;
pub use settings::SettingsService;

use crate::api::ApiClient;

/// All services sharing one client (and so one token store and signal channel).
#[derive(Clone)]
pub struct Services {
    pub auth: AuthService,
    pub planner: PlannerService,
    pub settings: SettingsService,
}

impl Services {
    pub fn new(client: ApiClient) -> Self {
        Self {
            auth: AuthService::new(client.clone()),
            planner: PlannerService::new(client.clone()),
            settings: SettingsService::new(client),
        }
    }
}
