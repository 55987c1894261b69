//! Errors surfaced by the gate.

use std::sync::Arc;

use thiserror::Error;
use warden_capability::ProtectionDomain;

/// Why a request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DenialReason {
    /// The request would replace or weaken the gate itself
    SelfProtection,
    /// A domain in the call chain does not imply the request
    PolicyViolation,
    /// The caller tried to switch checking off without the bypass capability
    MissingBypassCapability,
}

impl DenialReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenialReason::SelfProtection => "self_protection",
            DenialReason::PolicyViolation => "policy_violation",
            DenialReason::MissingBypassCapability => "missing_bypass_capability",
        }
    }
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A refused access decision
///
/// Every variant is terminal for the guarded operation. None of them is ever
/// downgraded to an allow.
#[derive(Debug, Clone, Error)]
pub enum AccessError {
    #[error("Changing the security gate is not allowed (requested {permission})")]
    SelfProtection { permission: String },

    #[error("Access denied for {permission} by {domain}")]
    PolicyViolation {
        permission: String,
        domain: Arc<ProtectionDomain>,
    },

    /// `caller` is `None` when the caller could not be resolved at all.
    #[error("Caller lacks {permission} required to run with checking disabled")]
    MissingBypassCapability {
        permission: String,
        caller: Option<Arc<ProtectionDomain>>,
    },
}

impl AccessError {
    pub fn reason(&self) -> DenialReason {
        match self {
            AccessError::SelfProtection { .. } => DenialReason::SelfProtection,
            AccessError::PolicyViolation { .. } => DenialReason::PolicyViolation,
            AccessError::MissingBypassCapability { .. } => DenialReason::MissingBypassCapability,
        }
    }

    /// The domain responsible for the refusal, if there is one
    pub fn domain(&self) -> Option<&Arc<ProtectionDomain>> {
        match self {
            AccessError::SelfProtection { .. } => None,
            AccessError::PolicyViolation { domain, .. } => Some(domain),
            AccessError::MissingBypassCapability { caller, .. } => caller.as_ref(),
        }
    }
}

/// Errors raised by a violation sink while recording a denial
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to record violation: {0}")]
    WriteFailed(String),

    #[error("Violation sink panicked")]
    Panicked,
}
