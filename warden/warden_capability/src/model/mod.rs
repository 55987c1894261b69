mod all;
pub mod file;
mod permission;
mod runtime;

pub use all::AllPermission;
pub use file::{FileActions, FilePermission};
pub use permission::{parse_permission, Permission, PermissionParseError};
pub use runtime::{
    bypass_permission, gate_permission, RuntimePermission, BYPASS_PERMISSION_NAME,
    GATE_PERMISSION_NAME,
};
