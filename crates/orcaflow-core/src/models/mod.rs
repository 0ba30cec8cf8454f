//! Data models for OrcaFlow entities.
//!
//! These mirror the backend's JSON (camelCase on the wire) and are shared
//! with the web dashboard through the optional `ts` feature:
//!
//! - `Id`: backend ids that may be numbers or strings
//! - `User`, `UserProfile`, `LoginResponse`: authentication payloads
//! - `ScheduledPost`, `GetPostsParams`: content planner
//! - `Settings`, `BrandSettings`, `SystemSettings`: tenant settings
//! - `ConnectedPage`: social page integrations
//! - `Contact`: local CRM records

pub mod contact;
pub mod id;
pub mod post;
pub mod settings;
pub mod social;
pub mod user;

pub use contact::{Contact, ContactStatus, CustomField, HistoryEvent, HistoryEventType};
pub use id::Id;
pub use post::{
    GetPostsParams, GetPostsResponse, NewPost, Platform, PostStatus, PostUpdate, ScheduledPost,
    StatusFilter, DATE_FORMAT,
};
pub use settings::{
    AgentFeatures, BrandSettings, CustomAgentSettings, DateFormat, GetSettingsResponse, Language,
    Settings, SystemSettings, UpdateSettingsRequest,
};
pub use social::{ConnectPageRequest, ConnectedPage, PageStatus};
pub use user::{LoginResponse, User, UserProfile};
