//! Terminal UI module using ratatui.
//!
//! - `render`: frame layout, title/tab/status bars and overlays
//! - `input`: keyboard event handling
//! - `styles`: color palette and text styles
//! - `tabs`: per-tab content (planner, contacts, settings)

pub mod input;
pub mod render;
pub mod styles;
pub mod tabs;
