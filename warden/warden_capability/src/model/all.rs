use std::any::Any;
use std::fmt;

use super::permission::Permission;

/// Implies every other permission. Granted to fully trusted code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AllPermission;

impl Permission for AllPermission {
    fn permission_type(&self) -> &str {
        "all"
    }

    fn name(&self) -> &str {
        "<all permissions>"
    }

    fn implies(&self, _other: &dyn Permission) -> bool {
        true
    }

    fn clone_box(&self) -> Box<dyn Permission> {
        Box::new(*self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Display for AllPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(\"all\" \"<all permissions>\")")
    }
}
