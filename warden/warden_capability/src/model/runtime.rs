use std::any::Any;
use std::fmt;

use super::permission::Permission;

/// Name of the meta-permission that replaces or disables the gate itself.
pub const GATE_PERMISSION_NAME: &str = "setSecurityGate";

/// Name of the permission required to switch checking off for a unit of work.
pub const BYPASS_PERMISSION_NAME: &str = "doUnchecked";

/// A named runtime right with hierarchical wildcard names
///
/// `*` covers every runtime permission, `a.b.*` covers every name under
/// `a.b.`, anything else only covers the identical name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuntimePermission {
    name: String,
}

impl RuntimePermission {
    /// Creates a new runtime permission with the given target name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn covers(&self, other: &str) -> bool {
        if self.name == "*" {
            return true;
        }

        if let Some(prefix) = self.name.strip_suffix('*') {
            // `a.b.*` must not cover `a.b.` itself, nor an unrelated `a.bc`.
            if prefix.ends_with('.') {
                return other.len() > prefix.len() && other.starts_with(prefix);
            }
        }

        self.name == other
    }
}

impl Permission for RuntimePermission {
    fn permission_type(&self) -> &str {
        "runtime"
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn implies(&self, other: &dyn Permission) -> bool {
        match other.as_any().downcast_ref::<RuntimePermission>() {
            Some(other) => self.covers(&other.name),
            None => false,
        }
    }

    fn clone_box(&self) -> Box<dyn Permission> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Display for RuntimePermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(\"runtime\" \"{}\")", self.name)
    }
}

/// The meta-permission guarding replacement of the gate.
pub fn gate_permission() -> RuntimePermission {
    RuntimePermission::new(GATE_PERMISSION_NAME)
}

/// The capability a caller needs to run work with checking disabled.
pub fn bypass_permission() -> RuntimePermission {
    RuntimePermission::new(BYPASS_PERMISSION_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FileActions, FilePermission};

    #[test]
    fn test_exact_name() {
        let perm = RuntimePermission::new("exitVM");
        assert!(perm.implies(&RuntimePermission::new("exitVM")));
        assert!(!perm.implies(&RuntimePermission::new("exitVM.0")));
    }

    #[test]
    fn test_star_covers_everything() {
        let perm = RuntimePermission::new("*");
        assert!(perm.implies(&gate_permission()));
        assert!(perm.implies(&bypass_permission()));
        assert!(perm.implies(&RuntimePermission::new("a.b.c")));
    }

    #[test]
    fn test_prefix_wildcard() {
        let perm = RuntimePermission::new("plugin.*");
        assert!(perm.implies(&RuntimePermission::new("plugin.load")));
        assert!(perm.implies(&RuntimePermission::new("plugin.load.*")));
        assert!(!perm.implies(&RuntimePermission::new("plugin.")));
        assert!(!perm.implies(&RuntimePermission::new("plugins")));
        assert!(!perm.implies(&RuntimePermission::new("*")));
    }

    #[test]
    fn test_does_not_imply_other_types() {
        let perm = RuntimePermission::new("*");
        assert!(!perm.implies(&FilePermission::new("/tmp/x", FileActions::READ)));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            gate_permission().to_string(),
            "(\"runtime\" \"setSecurityGate\")"
        );
    }
}
