//! Core application logic and state
//!
//! This module contains:
//! - Persisted settings (JSON in the user's config directory)
//! - Directory argument resolution and M4A discovery

mod scanning;
mod state;

pub use scanning::{resolve_directory, scan_sources};
pub use state::AppSettings;
