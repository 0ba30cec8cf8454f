//! Tab-specific rendering.

pub mod contacts;
pub mod planner;
pub mod settings;
