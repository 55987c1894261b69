//! Call chains and the first-denial scan.
//!
//! A chain is an explicit, ordered value handed to the gate by whoever knows
//! the current point of execution. Nothing here inspects a runtime's stack.

use std::sync::Arc;

use crate::domain::ProtectionDomain;
use crate::model::Permission;

/// The domains of a logical call, innermost (currently executing) frame first
#[derive(Debug, Clone, Default)]
pub struct CallChain {
    domains: Vec<Arc<ProtectionDomain>>,
}

impl CallChain {
    /// Creates a chain from domains ordered innermost first
    pub fn new(domains: Vec<Arc<ProtectionDomain>>) -> Self {
        Self { domains }
    }

    /// A chain with no links. It authorizes every request.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The most deeply nested frame, i.e. the immediate caller of the gate
    pub fn innermost(&self) -> Option<&Arc<ProtectionDomain>> {
        self.domains.first()
    }

    /// Returns a new chain with `domain` added as the new innermost frame
    pub fn enter(&self, domain: Arc<ProtectionDomain>) -> Self {
        let mut domains = Vec::with_capacity(self.domains.len() + 1);
        domains.push(domain);
        domains.extend(self.domains.iter().cloned());
        Self { domains }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arc<ProtectionDomain>> {
        self.domains.iter()
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

impl FromIterator<Arc<ProtectionDomain>> for CallChain {
    fn from_iter<I: IntoIterator<Item = Arc<ProtectionDomain>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a CallChain {
    type Item = &'a Arc<ProtectionDomain>;
    type IntoIter = std::slice::Iter<'a, Arc<ProtectionDomain>>;

    fn into_iter(self) -> Self::IntoIter {
        self.domains.iter()
    }
}

/// Finds the first domain in `chain` that does not imply `permission`
///
/// Returns `None` when every link implies the request. The scan is pure: no
/// logging, no re-entrancy guard, no caching, so the answer depends only on
/// the request and the (immutable) domains in the chain.
pub fn find_first_denial<'a>(
    permission: &dyn Permission,
    chain: &'a CallChain,
) -> Option<&'a Arc<ProtectionDomain>> {
    chain.iter().find(|domain| !domain.implies(permission))
}

/// Materializes the call chain for the current point of execution
///
/// This is supplied by the surrounding runtime; the gate treats the returned
/// chain as an opaque input.
pub trait ChainProvider: Send + Sync {
    fn current_chain(&self) -> CallChain;
}

impl<F> ChainProvider for F
where
    F: Fn() -> CallChain + Send + Sync,
{
    fn current_chain(&self) -> CallChain {
        self()
    }
}

/// A provider that always returns the same chain
#[derive(Debug, Clone, Default)]
pub struct FixedChainProvider {
    chain: CallChain,
}

impl FixedChainProvider {
    pub fn new(chain: CallChain) -> Self {
        Self { chain }
    }
}

impl ChainProvider for FixedChainProvider {
    fn current_chain(&self) -> CallChain {
        self.chain.clone()
    }
}
