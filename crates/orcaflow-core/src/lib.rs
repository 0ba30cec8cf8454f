//! OrcaFlow core library.
//!
//! Everything the dashboard needs to talk to the OrcaFlow backend lives here:
//!
//! - `api`: authenticated REST client, error normalisation, 401 signal
//! - `auth`: token storage backends and the session state machine
//! - `fetch`: loading/data/error state for async requests
//! - `services`: typed facades for auth, planner and tenant settings
//! - `models`: wire types shared with the web dashboard
//! - `calendar`: month/week/list date math for the content planner
//! - `contacts`: local CRM contact book
//! - `cache`: local fallback cache for settings, contacts and posts
//! - `config`: user configuration and directory layout

pub mod api;
pub mod auth;
pub mod cache;
pub mod calendar;
pub mod config;
pub mod contacts;
pub mod fetch;
pub mod models;
pub mod services;
pub mod utils;

pub use api::{ApiClient, ApiError, Auth, SessionEvent};
pub use auth::{AuthSession, AuthState, TokenStore};
pub use config::Config;
pub use fetch::{FetchHandle, FetchState};
