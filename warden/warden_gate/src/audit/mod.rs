//! Violation reporting.
//!
//! When a decision finds a denying domain, the gate hands a [`Violation`] to
//! its sink while the re-entrancy guard is held. A sink may therefore perform
//! guarded operations of its own: those checks pass through instead of
//! recursing into another decision.

mod log;
mod tracing_sink;

pub use self::log::{AuditEntry, AuditLog};
pub use self::tracing_sink::TracingSink;

use std::sync::Arc;

use warden_capability::{CodeSource, Permission, Principal, ProtectionDomain};

use crate::error::SinkError;

/// A denied request together with the domain that denied it
#[derive(Debug, Clone, Copy)]
pub struct Violation<'a> {
    permission: &'a dyn Permission,
    domain: &'a ProtectionDomain,
}

impl<'a> Violation<'a> {
    pub fn new(permission: &'a dyn Permission, domain: &'a ProtectionDomain) -> Self {
        Self { permission, domain }
    }

    pub fn permission(&self) -> &'a dyn Permission {
        self.permission
    }

    pub fn domain(&self) -> &'a ProtectionDomain {
        self.domain
    }

    pub fn code_source(&self) -> &'a CodeSource {
        self.domain.code_source()
    }

    pub fn loader(&self) -> Option<&'a str> {
        self.domain.loader()
    }

    pub fn principals(&self) -> &'a [Principal] {
        self.domain.principals()
    }

    /// Principals formatted as `[kind "name", ...]`, or `None` when there are none
    pub fn principals_display(&self) -> Option<String> {
        let principals = self.principals();
        if principals.is_empty() {
            return None;
        }
        let list: Vec<String> = principals.iter().map(ToString::to_string).collect();
        Some(format!("[{}]", list.join(", ")))
    }
}

/// Receives access violations found by the gate
pub trait ViolationSink: Send + Sync {
    /// Records a violation. Failures are reported back to the gate, which
    /// logs them and still returns the denial.
    fn record(&self, violation: &Violation<'_>) -> Result<(), SinkError>;
}

impl<S: ViolationSink + ?Sized> ViolationSink for Arc<S> {
    fn record(&self, violation: &Violation<'_>) -> Result<(), SinkError> {
        (**self).record(violation)
    }
}

/// Forwards each violation to several sinks
///
/// Every sink sees the violation even if an earlier one fails; the first
/// failure is returned.
#[derive(Default, Clone)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn ViolationSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn ViolationSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl ViolationSink for FanoutSink {
    fn record(&self, violation: &Violation<'_>) -> Result<(), SinkError> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.record(violation) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use warden_capability::RuntimePermission;

    struct Counting(AtomicUsize);

    impl ViolationSink for Counting {
        fn record(&self, _violation: &Violation<'_>) -> Result<(), SinkError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Failing;

    impl ViolationSink for Failing {
        fn record(&self, _violation: &Violation<'_>) -> Result<(), SinkError> {
            Err(SinkError::WriteFailed("disk full".to_string()))
        }
    }

    #[test]
    fn test_violation_accessors() {
        let domain = ProtectionDomain::builder(CodeSource::new("app.wasm"))
            .loader("apps")
            .principal(Principal::new("user", "alice"))
            .principal(Principal::new("role", "admin"))
            .build();
        let permission = RuntimePermission::new("exitVM");
        let violation = Violation::new(&permission, &domain);

        assert_eq!(violation.permission().name(), "exitVM");
        assert_eq!(violation.code_source().location(), Some("app.wasm"));
        assert_eq!(violation.loader(), Some("apps"));
        assert_eq!(
            violation.principals_display().as_deref(),
            Some("[user \"alice\", role \"admin\"]")
        );
    }

    #[test]
    fn test_fanout_reaches_every_sink() {
        let counting = Arc::new(Counting(AtomicUsize::new(0)));
        let fanout = FanoutSink::new()
            .with(Arc::new(Failing))
            .with(counting.clone());

        let domain = ProtectionDomain::builder(CodeSource::unknown()).build();
        let permission = RuntimePermission::new("exitVM");
        let result = fanout.record(&Violation::new(&permission, &domain));

        assert!(matches!(result, Err(SinkError::WriteFailed(_))));
        assert_eq!(counting.0.load(Ordering::SeqCst), 1);
        assert_eq!(fanout.len(), 2);
    }
}
