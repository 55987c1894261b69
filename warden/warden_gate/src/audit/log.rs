use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use warden_core::DomainId;

use super::{Violation, ViolationSink};
use crate::error::SinkError;

/// An entry in the audit log
#[derive(Debug, Clone)]
pub struct AuditEntry {
    /// When the violation was recorded
    pub timestamp: DateTime<Utc>,

    /// The domain that denied the request
    pub domain_id: DomainId,

    /// Code source of the denying domain
    pub code_source: String,

    /// Loader identity of the denying domain
    pub loader: Option<String>,

    /// Principals asserted by the denying domain
    pub principals: Vec<String>,

    /// The denied permission
    pub permission: String,
}

impl AuditEntry {
    /// Creates a new audit entry
    pub fn new(violation: &Violation<'_>) -> Self {
        Self {
            timestamp: Utc::now(),
            domain_id: violation.domain().id(),
            code_source: violation.code_source().to_string(),
            loader: violation.loader().map(str::to_string),
            principals: violation
                .principals()
                .iter()
                .map(ToString::to_string)
                .collect(),
            permission: violation.permission().to_string(),
        }
    }
}

/// Default cap on the number of domains an [`AuditLog`] tracks
const DEFAULT_MAX_DOMAINS: usize = 1024;

#[derive(Default)]
struct Inner {
    /// Map from domain ID to its entries, oldest first
    by_domain: HashMap<DomainId, Vec<AuditEntry>>,

    /// Domains in the order they were first recorded
    order: VecDeque<DomainId>,
}

/// A thread-safe, bounded, in-memory record of access violations
///
/// Both dimensions are bounded: each domain keeps at most
/// `max_entries_per_domain` entries, and once `max_domains` domains are
/// tracked, recording a new one evicts the domain recorded first.
pub struct AuditLog {
    inner: RwLock<Inner>,

    /// Maximum number of entries per domain
    max_entries_per_domain: usize,

    /// Maximum number of domains tracked at once
    max_domains: usize,
}

impl AuditLog {
    /// Creates a new audit log with the specified maximum entries per domain
    pub fn new(max_entries_per_domain: usize) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            max_entries_per_domain,
            max_domains: DEFAULT_MAX_DOMAINS,
        }
    }

    /// Sets the maximum number of domains tracked at once
    pub fn with_max_domains(mut self, max_domains: usize) -> Self {
        self.max_domains = max_domains.max(1);
        self
    }

    /// Adds an entry, dropping the oldest ones beyond the per-domain limit
    pub fn push(&self, entry: AuditEntry) {
        let mut guard = self.inner.write();
        let inner = &mut *guard;
        let domain_id = entry.domain_id;

        if !inner.by_domain.contains_key(&domain_id) {
            while inner.order.len() >= self.max_domains {
                match inner.order.pop_front() {
                    Some(evicted) => {
                        inner.by_domain.remove(&evicted);
                    }
                    None => break,
                }
            }
            inner.order.push_back(domain_id);
        }

        let domain_entries = inner.by_domain.entry(domain_id).or_default();
        domain_entries.push(entry);

        if domain_entries.len() > self.max_entries_per_domain {
            let excess = domain_entries.len() - self.max_entries_per_domain;
            domain_entries.drain(0..excess);
        }
    }

    /// Gets the audit entries for a domain
    pub fn entries(&self, domain_id: DomainId) -> Vec<AuditEntry> {
        self.inner
            .read()
            .by_domain
            .get(&domain_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Gets all audit entries for all domains
    pub fn all_entries(&self) -> HashMap<DomainId, Vec<AuditEntry>> {
        self.inner.read().by_domain.clone()
    }

    /// Total number of entries across all domains
    pub fn len(&self) -> usize {
        self.inner.read().by_domain.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of domains currently tracked
    pub fn domain_count(&self) -> usize {
        self.inner.read().order.len()
    }

    /// Clears the audit entries for a domain
    pub fn clear(&self, domain_id: DomainId) {
        let mut inner = self.inner.write();
        if inner.by_domain.remove(&domain_id).is_some() {
            inner.order.retain(|id| *id != domain_id);
        }
    }

    /// Clears all audit entries
    pub fn clear_all(&self) {
        let mut inner = self.inner.write();
        inner.by_domain.clear();
        inner.order.clear();
    }

    pub fn max_entries_per_domain(&self) -> usize {
        self.max_entries_per_domain
    }

    pub fn max_domains(&self) -> usize {
        self.max_domains
    }
}

impl ViolationSink for AuditLog {
    fn record(&self, violation: &Violation<'_>) -> Result<(), SinkError> {
        self.push(AuditEntry::new(violation));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_capability::{CodeSource, Principal, ProtectionDomain, RuntimePermission};

    #[test]
    fn test_audit_log() {
        let log = AuditLog::new(10);
        let domain = ProtectionDomain::builder(CodeSource::new("app"))
            .principal(Principal::new("user", "carol"))
            .build();

        let exit = RuntimePermission::new("exitVM");
        let load = RuntimePermission::new("plugin.load");
        log.record(&Violation::new(&exit, &domain)).unwrap();
        log.record(&Violation::new(&load, &domain)).unwrap();

        let entries = log.entries(domain.id());
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].permission, exit.to_string());
        assert_eq!(entries[1].permission, load.to_string());
        assert_eq!(entries[0].code_source, "app");
        assert_eq!(entries[0].principals, vec!["user \"carol\"".to_string()]);

        log.clear(domain.id());
        assert!(log.entries(domain.id()).is_empty());
        assert!(log.is_empty());
    }

    #[test]
    fn test_audit_log_max_entries() {
        let log = AuditLog::new(2);
        let domain = ProtectionDomain::builder(CodeSource::unknown()).build();

        for i in 0..5 {
            let permission = RuntimePermission::new(format!("op{}", i));
            log.record(&Violation::new(&permission, &domain)).unwrap();
        }

        // Only the most recent entries are kept
        let entries = log.entries(domain.id());
        assert_eq!(entries.len(), 2);
        assert!(entries[0].permission.contains("op3"));
        assert!(entries[1].permission.contains("op4"));
    }

    #[test]
    fn test_entries_are_per_domain() {
        let log = AuditLog::new(5);
        let a = ProtectionDomain::builder(CodeSource::new("a")).build();
        let b = ProtectionDomain::builder(CodeSource::new("b")).build();
        let permission = RuntimePermission::new("exitVM");

        log.record(&Violation::new(&permission, &a)).unwrap();
        log.record(&Violation::new(&permission, &b)).unwrap();
        log.record(&Violation::new(&permission, &b)).unwrap();

        assert_eq!(log.entries(a.id()).len(), 1);
        assert_eq!(log.entries(b.id()).len(), 2);
        assert_eq!(log.all_entries().len(), 2);
        assert_eq!(log.len(), 3);

        log.clear_all();
        assert!(log.is_empty());
    }

    #[test]
    fn test_oldest_domain_is_evicted_at_cap() {
        let log = AuditLog::new(5).with_max_domains(2);
        let first = ProtectionDomain::builder(CodeSource::new("first")).build();
        let second = ProtectionDomain::builder(CodeSource::new("second")).build();
        let third = ProtectionDomain::builder(CodeSource::new("third")).build();
        let permission = RuntimePermission::new("exitVM");

        log.record(&Violation::new(&permission, &first)).unwrap();
        log.record(&Violation::new(&permission, &second)).unwrap();
        // Recording a known domain again does not evict anything.
        log.record(&Violation::new(&permission, &first)).unwrap();
        assert_eq!(log.domain_count(), 2);
        assert_eq!(log.entries(first.id()).len(), 2);

        log.record(&Violation::new(&permission, &third)).unwrap();
        assert_eq!(log.domain_count(), 2);
        assert!(log.entries(first.id()).is_empty());
        assert_eq!(log.entries(second.id()).len(), 1);
        assert_eq!(log.entries(third.id()).len(), 1);
    }

    #[test]
    fn test_clear_frees_a_domain_slot() {
        let log = AuditLog::new(5).with_max_domains(2);
        let a = ProtectionDomain::builder(CodeSource::new("a")).build();
        let b = ProtectionDomain::builder(CodeSource::new("b")).build();
        let c = ProtectionDomain::builder(CodeSource::new("c")).build();
        let permission = RuntimePermission::new("exitVM");

        log.record(&Violation::new(&permission, &a)).unwrap();
        log.record(&Violation::new(&permission, &b)).unwrap();
        log.clear(b.id());
        log.record(&Violation::new(&permission, &c)).unwrap();

        assert_eq!(log.domain_count(), 2);
        assert_eq!(log.entries(a.id()).len(), 1);
        assert_eq!(log.entries(c.id()).len(), 1);
        assert_eq!(log.max_domains(), 2);
    }
}
