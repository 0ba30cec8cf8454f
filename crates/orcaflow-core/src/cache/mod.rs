//! Local caching module for offline data access.
//!
//! This module provides the `CacheManager` for storing and retrieving
//! OrcaFlow data locally. Data is cached in JSON format and considered
//! stale after 60 minutes.
//!
//! Cached data types include:
//! - Brand voice and custom agent settings (local fallback for tenant settings)
//! - Contacts (the CRM book lives only here)
//! - The last fetched planner window
//! - Connected social pages

pub mod manager;

pub use manager::{CacheAges, CacheManager, CachedData, CachedPosts};
