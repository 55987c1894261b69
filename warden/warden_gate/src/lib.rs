//! # Warden Gate
//!
//! A per-thread, toggleable access-control gate. Permission checks are only
//! enforced on threads that opted into checking, denials are reported with a
//! re-entrancy guard held so that the reporting path cannot recurse into
//! another decision, and the gate refuses every request that would replace or
//! disable it.
//!
//! ## Core Components
//!
//! - **State**: The inheritable `checking` flag and the re-entrancy guard, both thread-local
//! - **Engine**: [`SecurityGate`], which decides a request against a [`CallChain`]
//! - **Scope**: [`run_checked`] / [`run_unchecked`], which switch checking around a unit of work
//! - **Audit**: Violation sinks ([`TracingSink`], [`AuditLog`], [`FanoutSink`])
//! - **Registry**: The optional process-wide [`AccessController`]
//! - **Thread**: Spawning threads that inherit the parent's checking flag
//!
//! ## Usage Example
//!
//! ```rust
//! use warden_capability::{CallChain, CodeSource, ProtectionDomain, RuntimePermission};
//! use warden_gate::{run_checked, AccessError, DenialReason, SecurityGate};
//!
//! let gate = SecurityGate::new();
//! let plugin = ProtectionDomain::builder(CodeSource::new("plugin.wasm"))
//!     .grant(RuntimePermission::new("plugin.*"))
//!     .build();
//! let chain = CallChain::new(vec![plugin]);
//!
//! // Threads that never opted in pass straight through.
//! assert!(gate.check(&RuntimePermission::new("exitVM"), &chain).is_ok());
//!
//! run_checked(|| {
//!     assert!(gate.check(&RuntimePermission::new("plugin.load"), &chain).is_ok());
//!
//!     let err: AccessError = gate
//!         .check(&RuntimePermission::new("exitVM"), &chain)
//!         .unwrap_err();
//!     assert_eq!(err.reason(), DenialReason::PolicyViolation);
//! });
//! ```

pub mod audit;
pub mod engine;
pub mod error;
pub mod registry;
pub mod scope;
pub mod state;
pub mod thread;

pub use audit::{AuditEntry, AuditLog, FanoutSink, TracingSink, Violation, ViolationSink};
pub use engine::SecurityGate;
pub use error::{AccessError, DenialReason, SinkError};
pub use registry::{install, installed, is_checking_active, is_installed, uninstall, AccessController};
pub use scope::{run_checked, run_unchecked, try_run_unchecked};
pub use thread::{spawn, spawn_named, GateSnapshot};

// The pure scan is part of the gate's public surface as a diagnostics primitive.
pub use warden_capability::{find_first_denial, CallChain, ChainProvider};

/// Log target for access violations.
pub const ACCESS_TARGET: &str = "warden::access";
