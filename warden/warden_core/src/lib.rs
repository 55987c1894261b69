//! # Warden Core
//!
//! `warden_core` holds the pieces shared by every Warden crate: strongly-typed
//! identifiers for protection domains, the gate configuration, and the errors
//! raised while loading that configuration.
//!
//! ## Crate Structure
//!
//! - **id**: Strongly-typed identifier types
//! - **config**: Gate configuration, loaded from TOML
//! - **error**: Configuration errors

pub mod config;
pub mod error;
pub mod id;

pub use config::{AuditConfig, GateConfig, LogLevel};
pub use error::{ConfigError, Result};
pub use id::{DomainId, Id};
