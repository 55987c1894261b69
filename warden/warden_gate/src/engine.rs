use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{trace, warn};
use warden_capability::{
    find_first_denial, gate_permission, CallChain, ChainProvider, Permission, ProtectionDomain,
};
use warden_core::GateConfig;

use crate::audit::{AuditLog, FanoutSink, TracingSink, Violation, ViolationSink};
use crate::error::{AccessError, SinkError};
use crate::registry::AccessController;
use crate::scope;
use crate::state::{self, GuardScope};
use crate::ACCESS_TARGET;

/// The access decision engine
///
/// A gate decides a permission request against an explicit call chain. It
/// only enforces anything on threads where checking is enabled (see
/// [`run_checked`](crate::run_checked)), and it never grants a request that
/// implies the gate meta-permission.
///
/// The gate holds no per-thread state of its own; the flags it consults are
/// thread-local, so deciding never contends on a lock.
pub struct SecurityGate {
    /// Where denials are reported
    sink: Option<Arc<dyn ViolationSink>>,

    /// Resolves the chain for [`check_current`](Self::check_current)
    chain_provider: Option<Arc<dyn ChainProvider>>,

    /// In-memory audit trail, also registered as a sink when present
    audit_log: Option<Arc<AuditLog>>,

    /// Contain panics raised by the sink instead of unwinding through the decision
    catch_sink_panics: bool,
}

impl SecurityGate {
    /// Creates a gate that reports denials through a [`TracingSink`] at debug level
    pub fn new() -> Self {
        Self::with_sink(Arc::new(TracingSink::default()))
    }

    /// Creates a gate reporting denials to `sink`
    pub fn with_sink(sink: Arc<dyn ViolationSink>) -> Self {
        Self {
            sink: Some(sink),
            chain_provider: None,
            audit_log: None,
            catch_sink_panics: true,
        }
    }

    /// Creates a gate that reports nothing
    pub fn silent() -> Self {
        Self {
            sink: None,
            chain_provider: None,
            audit_log: None,
            catch_sink_panics: true,
        }
    }

    /// Creates a gate from configuration
    ///
    /// Denials go to a [`TracingSink`] at the configured level and, when the
    /// audit trail is enabled, to an [`AuditLog`] as well.
    pub fn from_config(config: &GateConfig) -> Self {
        let tracing_sink: Arc<dyn ViolationSink> =
            Arc::new(TracingSink::new(config.violation_log_level));

        let (sink, audit_log) = if config.audit.enabled {
            let audit_log = Arc::new(
                AuditLog::new(config.audit.max_entries_per_domain)
                    .with_max_domains(config.audit.max_domains),
            );
            let fanout = FanoutSink::new()
                .with(tracing_sink)
                .with(audit_log.clone());
            (Arc::new(fanout) as Arc<dyn ViolationSink>, Some(audit_log))
        } else {
            (tracing_sink, None)
        };

        Self {
            sink: Some(sink),
            chain_provider: None,
            audit_log,
            catch_sink_panics: config.catch_sink_panics,
        }
    }

    /// Sets the provider used by [`check_current`](Self::check_current)
    pub fn with_chain_provider(mut self, provider: Arc<dyn ChainProvider>) -> Self {
        self.chain_provider = Some(provider);
        self
    }

    /// Whether sink panics are contained
    pub fn with_catch_sink_panics(mut self, catch: bool) -> Self {
        self.catch_sink_panics = catch;
        self
    }

    /// Gets a reference to the audit log, if one is configured
    pub fn audit_log(&self) -> Option<&Arc<AuditLog>> {
        self.audit_log.as_ref()
    }

    /// The gate's own notion of whether checking is on: the current
    /// thread's flag, regardless of what is installed process-wide
    pub fn is_checking() -> bool {
        state::is_checking()
    }

    /// Decides `permission` against `chain`
    ///
    /// 1. A request implying the gate meta-permission is refused, always.
    /// 2. Threads with checking disabled pass through.
    /// 3. Decisions made while the re-entrancy guard is held pass through.
    /// 4. Otherwise the first domain that does not imply the request is
    ///    reported to the sink, with the guard held, and named in the error.
    pub fn check(&self, permission: &dyn Permission, chain: &CallChain) -> Result<(), AccessError> {
        if permission.implies(&gate_permission()) {
            trace!(permission = %permission, "refusing request to change the gate");
            return Err(AccessError::SelfProtection {
                permission: permission.to_string(),
            });
        }

        if !state::is_checking() || state::is_guard_active() {
            return Ok(());
        }

        let _guard = GuardScope::enter();
        match find_first_denial(permission, chain) {
            Some(domain) => {
                self.report_violation(permission, domain);
                Err(AccessError::PolicyViolation {
                    permission: permission.to_string(),
                    domain: domain.clone(),
                })
            }
            None => Ok(()),
        }
    }

    /// Decides `permission` against the chain of the current point of execution
    ///
    /// Without a chain provider the chain is empty, which only the
    /// self-protection rule can refuse.
    pub fn check_current(&self, permission: &dyn Permission) -> Result<(), AccessError> {
        let chain = self
            .chain_provider
            .as_ref()
            .map(|provider| provider.current_chain())
            .unwrap_or_default();
        self.check(permission, &chain)
    }

    /// Probes whether every domain in `chain` implies `permission`
    ///
    /// Unlike [`check`](Self::check) this ignores the checking flag and the
    /// self-protection rule. A denial is still reported, unless the guard is
    /// already held by an enclosing decision.
    pub fn try_check(&self, permission: &dyn Permission, chain: &CallChain) -> bool {
        let Some(domain) = find_first_denial(permission, chain) else {
            return true;
        };

        if !state::is_guard_active() {
            let _guard = GuardScope::enter();
            self.report_violation(permission, domain);
        }
        false
    }

    /// Runs `work` with checking disabled, verifying the caller's bypass capability
    ///
    /// The gate is an authority in its own right, so the capability is always
    /// verified when checking is currently on.
    ///
    /// With a chain provider the caller is the innermost frame of the current
    /// chain and `caller` is ignored; an empty chain is refused. Without a
    /// provider the gate has no way to know who is calling, so `caller` is
    /// trusted as given. Gates handed to untrusted code should have a provider.
    pub fn run_unchecked<T, F>(&self, caller: &Arc<ProtectionDomain>, work: F) -> Result<T, AccessError>
    where
        F: FnOnce() -> T,
    {
        match &self.chain_provider {
            Some(provider) => {
                let chain = provider.current_chain();
                scope::unchecked(true, chain.innermost(), work)
            }
            None => scope::unchecked(true, Some(caller), work),
        }
    }

    /// Must only be called with the guard held.
    fn report_violation(&self, permission: &dyn Permission, domain: &ProtectionDomain) {
        debug_assert!(state::is_guard_active());

        let Some(sink) = &self.sink else {
            return;
        };
        let violation = Violation::new(permission, domain);

        let outcome = if self.catch_sink_panics {
            panic::catch_unwind(AssertUnwindSafe(|| sink.record(&violation)))
                .unwrap_or(Err(SinkError::Panicked))
        } else {
            sink.record(&violation)
        };

        if let Err(e) = outcome {
            warn!(
                target: ACCESS_TARGET,
                error = %e,
                domain = %domain.id(),
                "failed to record access violation"
            );
        }
    }
}

impl Default for SecurityGate {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SecurityGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityGate")
            .field("has_sink", &self.sink.is_some())
            .field("has_chain_provider", &self.chain_provider.is_some())
            .field("has_audit_log", &self.audit_log.is_some())
            .field("catch_sink_panics", &self.catch_sink_panics)
            .finish()
    }
}

impl AccessController for SecurityGate {
    fn check_permission(
        &self,
        permission: &dyn Permission,
        chain: &CallChain,
    ) -> Result<(), AccessError> {
        self.check(permission, chain)
    }

    fn as_gate(&self) -> Option<&SecurityGate> {
        Some(self)
    }
}
