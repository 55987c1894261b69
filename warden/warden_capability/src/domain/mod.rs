//! Protection domains: one link of trust in a call chain.

mod set;

pub use set::PermissionSet;

use std::fmt;
use std::sync::Arc;

use warden_core::DomainId;

use crate::model::{AllPermission, Permission};

/// Where a piece of code came from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CodeSource {
    location: Option<String>,
}

impl CodeSource {
    /// Creates a code source for the given location
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: Some(location.into()),
        }
    }

    /// A code source whose origin is not known
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }
}

impl fmt::Display for CodeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => f.write_str(location),
            None => f.write_str("<unknown>"),
        }
    }
}

/// An identity claim attached to a domain for audit purposes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Principal {
    kind: String,
    name: String,
}

impl Principal {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} \"{}\"", self.kind, self.name)
    }
}

/// One link of trust: the permissions granted to some code plus its identity
///
/// Domains are immutable once built and are shared between chains through
/// `Arc`, so a decision can never observe a grant changing under it.
#[derive(Debug)]
pub struct ProtectionDomain {
    id: DomainId,
    code_source: CodeSource,
    loader: Option<String>,
    principals: Vec<Principal>,
    permissions: PermissionSet,
}

impl ProtectionDomain {
    /// Starts building a domain for code from `code_source`
    pub fn builder(code_source: CodeSource) -> ProtectionDomainBuilder {
        ProtectionDomainBuilder {
            id: None,
            code_source,
            loader: None,
            principals: Vec::new(),
            permissions: PermissionSet::new(),
        }
    }

    /// A fully trusted domain holding [`AllPermission`]
    pub fn privileged(code_source: CodeSource) -> Arc<Self> {
        Self::builder(code_source).grant(AllPermission).build()
    }

    /// Checks whether this domain's own grants cover `request`
    pub fn implies(&self, request: &dyn Permission) -> bool {
        self.permissions.implies(request)
    }

    pub fn id(&self) -> DomainId {
        self.id
    }

    pub fn code_source(&self) -> &CodeSource {
        &self.code_source
    }

    /// Loader or module identity, if the runtime supplied one
    pub fn loader(&self) -> Option<&str> {
        self.loader.as_deref()
    }

    pub fn principals(&self) -> &[Principal] {
        &self.principals
    }

    pub fn permissions(&self) -> &PermissionSet {
        &self.permissions
    }
}

impl fmt::Display for ProtectionDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProtectionDomain({} from {}", self.id, self.code_source)?;
        if let Some(loader) = &self.loader {
            write!(f, " via {}", loader)?;
        }
        f.write_str(")")
    }
}

/// Builder for [`ProtectionDomain`]
#[derive(Debug)]
pub struct ProtectionDomainBuilder {
    id: Option<DomainId>,
    code_source: CodeSource,
    loader: Option<String>,
    principals: Vec<Principal>,
    permissions: PermissionSet,
}

impl ProtectionDomainBuilder {
    /// Uses a fixed identifier instead of a random one
    pub fn id(mut self, id: DomainId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn loader(mut self, loader: impl Into<String>) -> Self {
        self.loader = Some(loader.into());
        self
    }

    pub fn principal(mut self, principal: Principal) -> Self {
        self.principals.push(principal);
        self
    }

    /// Grants a permission to the domain
    pub fn grant(mut self, permission: impl Permission + 'static) -> Self {
        self.permissions.add(Box::new(permission));
        self
    }

    /// Grants an already boxed permission to the domain
    pub fn grant_boxed(mut self, permission: Box<dyn Permission>) -> Self {
        self.permissions.add(permission);
        self
    }

    pub fn build(self) -> Arc<ProtectionDomain> {
        Arc::new(ProtectionDomain {
            id: self.id.unwrap_or_default(),
            code_source: self.code_source,
            loader: self.loader,
            principals: self.principals,
            permissions: self.permissions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{bypass_permission, gate_permission, RuntimePermission};

    #[test]
    fn test_domain_implies_own_grants_only() {
        let domain = ProtectionDomain::builder(CodeSource::new("file:/app"))
            .grant(bypass_permission())
            .build();

        assert!(domain.implies(&bypass_permission()));
        assert!(!domain.implies(&RuntimePermission::new("exitVM")));
    }

    #[test]
    fn test_privileged_domain() {
        let domain = ProtectionDomain::privileged(CodeSource::new("system"));
        assert!(domain.implies(&gate_permission()));
        assert!(domain.principals().is_empty());
    }

    #[test]
    fn test_domain_identity() {
        let id = DomainId::new();
        let domain = ProtectionDomain::builder(CodeSource::unknown())
            .id(id)
            .loader("plugins")
            .principal(Principal::new("user", "alice"))
            .build();

        assert_eq!(domain.id(), id);
        assert_eq!(domain.loader(), Some("plugins"));
        assert_eq!(domain.code_source().location(), None);
        assert_eq!(domain.principals()[0].to_string(), "user \"alice\"");
        assert_eq!(
            domain.to_string(),
            format!("ProtectionDomain({} from <unknown> via plugins)", id)
        );
    }
}
