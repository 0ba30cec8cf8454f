//! REST API client module for the OrcaFlow backend.
//!
//! This module provides the `ApiClient` used by every domain service. The
//! backend authenticates with a JWT bearer token kept in a `TokenStore`;
//! a 401 from any endpoint purges that token and broadcasts
//! `SessionEvent::Unauthorized` to whoever subscribed.

pub mod client;
pub mod error;

pub use client::{ApiClient, Auth, Empty, SessionEvent};
pub use error::{ApiError, FieldErrors};
