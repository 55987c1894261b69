//! # Warden Capability
//!
//! The authority model of the Warden gate. Nothing in this crate holds state
//! or has side effects, so every predicate here is safe to call from inside
//! violation logging.
//!
//! Permissions form a partial order through [`Permission::implies`]. A
//! [`ProtectionDomain`] is one link of trust in a call: the permissions granted
//! to a piece of code together with its identity. A [`CallChain`] orders the
//! domains of a call from the innermost frame outward, and a request is
//! authorized against a chain only when every link implies it.
//!
//! ## Core Components
//!
//! - **Model**: Permission types (runtime, file, all) and the well-known gate permissions
//! - **Domain**: Protection domains, code sources, principals and permission sets
//! - **Chain**: Call chains, chain providers and the first-denial scan
//!
//! ## Usage Example
//!
//! ```rust
//! use warden_capability::{
//!     find_first_denial, CallChain, CodeSource, FileActions, FilePermission, ProtectionDomain,
//! };
//!
//! let app = ProtectionDomain::builder(CodeSource::new("file:/srv/app.wasm"))
//!     .grant(FilePermission::new("/srv/data/-", FileActions::READ))
//!     .build();
//! let system = ProtectionDomain::privileged(CodeSource::new("system"));
//!
//! let chain = CallChain::new(vec![app.clone(), system]);
//! let read = FilePermission::new("/srv/data/report.csv", FileActions::READ);
//! let write = FilePermission::new("/srv/data/report.csv", FileActions::WRITE);
//!
//! assert!(find_first_denial(&read, &chain).is_none());
//! assert_eq!(find_first_denial(&write, &chain).unwrap().id(), app.id());
//! ```

pub mod chain;
pub mod domain;
pub mod model;

pub use chain::{find_first_denial, CallChain, ChainProvider, FixedChainProvider};
pub use domain::{CodeSource, PermissionSet, Principal, ProtectionDomain, ProtectionDomainBuilder};
pub use model::{
    bypass_permission, gate_permission, parse_permission, AllPermission, FileActions,
    FilePermission, Permission, PermissionParseError, RuntimePermission, BYPASS_PERMISSION_NAME,
    GATE_PERMISSION_NAME,
};
