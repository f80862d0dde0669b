//! Shared configuration, error and wire types for the campus navigator.

pub mod config;
pub mod error;
pub mod types;

pub use config::{CampusConfig, HotspotConfig, Surface};
pub use error::{CampusError, Result};
pub use types::*;
