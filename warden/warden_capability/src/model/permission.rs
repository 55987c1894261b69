use std::any::Any;
use std::fmt::{Debug, Display};

use thiserror::Error;

use super::all::AllPermission;
use super::file::{FileActions, FilePermission};
use super::runtime::RuntimePermission;

/// Errors produced when parsing a textual permission spec
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PermissionParseError {
    #[error("Empty permission spec")]
    Empty,

    #[error("Unknown permission type '{0}'")]
    UnknownType(String),

    #[error("Malformed permission spec '{0}'")]
    Malformed(String),

    #[error("Unknown file action '{0}'")]
    UnknownAction(String),
}

/// A request for a right to perform an action
///
/// Permissions form a partial order: `a.implies(b)` holds when the scope of `a`
/// covers `b`. The relation need not be total, and two permissions that imply
/// each other are not required to be equal.
///
/// Implementations must be pure. `implies` is called from inside violation
/// reporting and must never trigger another access decision.
pub trait Permission: Send + Sync + Debug + Display {
    /// Returns the type identifier for this permission
    fn permission_type(&self) -> &str;

    /// Returns the target name of this permission
    fn name(&self) -> &str;

    /// Checks whether this permission covers `other`
    fn implies(&self, other: &dyn Permission) -> bool;

    /// Clones this permission (since dyn Trait cannot implement Clone directly)
    fn clone_box(&self) -> Box<dyn Permission>;

    /// Convert to Any for downcasting
    fn as_any(&self) -> &dyn Any;
}

impl Clone for Box<dyn Permission> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Parses a permission from its textual form.
///
/// Accepted forms:
/// - `all`
/// - `runtime:<name>`, e.g. `runtime:doUnchecked` or `runtime:plugin.*`
/// - `file:<pattern>:<actions>`, e.g. `file:/tmp/-:read,write`
pub fn parse_permission(spec: &str) -> Result<Box<dyn Permission>, PermissionParseError> {
    let spec = spec.trim();
    if spec.is_empty() {
        return Err(PermissionParseError::Empty);
    }

    if spec == "all" {
        return Ok(Box::new(AllPermission));
    }

    let (kind, rest) = spec
        .split_once(':')
        .ok_or_else(|| PermissionParseError::Malformed(spec.to_string()))?;

    match kind {
        "runtime" => {
            if rest.is_empty() {
                return Err(PermissionParseError::Malformed(spec.to_string()));
            }
            Ok(Box::new(RuntimePermission::new(rest)))
        }
        "file" => {
            // Paths may contain ':', the actions never do.
            let (path, actions) = rest
                .rsplit_once(':')
                .ok_or_else(|| PermissionParseError::Malformed(spec.to_string()))?;
            if path.is_empty() {
                return Err(PermissionParseError::Malformed(spec.to_string()));
            }
            let actions = FileActions::parse(actions)?;
            Ok(Box::new(FilePermission::new(path, actions)))
        }
        other => Err(PermissionParseError::UnknownType(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all() {
        let perm = parse_permission("all").unwrap();
        assert_eq!(perm.permission_type(), "all");
    }

    #[test]
    fn test_parse_runtime() {
        let perm = parse_permission("runtime:doUnchecked").unwrap();
        assert_eq!(perm.permission_type(), "runtime");
        assert_eq!(perm.name(), "doUnchecked");
    }

    #[test]
    fn test_parse_file_with_colon_in_path() {
        let perm = parse_permission("file:C:/data/-:read,write").unwrap();
        let file = perm.as_any().downcast_ref::<FilePermission>().unwrap();
        assert_eq!(file.name(), "C:/data/-");
        assert_eq!(file.actions(), FileActions::READ | FileActions::WRITE);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_permission("  "),
            Err(PermissionParseError::Empty)
        ));
        assert!(matches!(
            parse_permission("socket:localhost"),
            Err(PermissionParseError::UnknownType(_))
        ));
        assert!(matches!(
            parse_permission("runtime:"),
            Err(PermissionParseError::Malformed(_))
        ));
        assert!(matches!(
            parse_permission("file:/tmp/x:fly"),
            Err(PermissionParseError::UnknownAction(_))
        ));
        assert!(matches!(
            parse_permission("file:/tmp/x"),
            Err(PermissionParseError::Malformed(_))
        ));
        assert!(matches!(
            parse_permission("nonsense"),
            Err(PermissionParseError::Malformed(_))
        ));
    }
}
