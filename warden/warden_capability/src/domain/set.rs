use std::collections::HashMap;

use crate::model::Permission;

/// A set of granted permissions grouped by type
///
/// A permission in the set only implies requests of its own type, except for
/// [`AllPermission`](crate::model::AllPermission), which implies everything.
#[derive(Debug, Clone, Default)]
pub struct PermissionSet {
    /// Map from permission type to the permissions of that type
    permissions: HashMap<String, Vec<Box<dyn Permission>>>,
}

impl PermissionSet {
    /// Creates a new empty permission set
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a permission to the set
    pub fn add(&mut self, permission: Box<dyn Permission>) {
        let permission_type = permission.permission_type().to_string();
        self.permissions
            .entry(permission_type)
            .or_default()
            .push(permission);
    }

    /// Checks whether any permission in the set implies `request`
    pub fn implies(&self, request: &dyn Permission) -> bool {
        let implied_by = |permission_type: &str| {
            self.permissions
                .get(permission_type)
                .is_some_and(|group| group.iter().any(|p| p.implies(request)))
        };

        implied_by("all") || implied_by(request.permission_type())
    }

    /// Iterates over every permission in the set
    pub fn iter(&self) -> impl Iterator<Item = &(dyn Permission + 'static)> {
        self.permissions.values().flatten().map(|p| &**p)
    }

    /// Gets the total number of permissions in this set
    pub fn len(&self) -> usize {
        self.permissions.values().map(Vec::len).sum()
    }

    /// Returns true if this set is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<Box<dyn Permission>> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Box<dyn Permission>>>(iter: I) -> Self {
        let mut set = PermissionSet::new();
        for permission in iter {
            set.add(permission);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        gate_permission, AllPermission, FileActions, FilePermission, RuntimePermission,
    };

    #[test]
    fn test_empty_set_implies_nothing() {
        let set = PermissionSet::new();
        assert!(set.is_empty());
        assert!(!set.implies(&RuntimePermission::new("exitVM")));
    }

    #[test]
    fn test_set_groups_by_type() {
        let mut set = PermissionSet::new();
        set.add(Box::new(RuntimePermission::new("plugin.*")));
        set.add(Box::new(FilePermission::new("/tmp/-", FileActions::READ)));
        set.add(Box::new(FilePermission::new("/etc/hosts", FileActions::READ)));

        assert_eq!(set.len(), 3);
        assert!(set.implies(&RuntimePermission::new("plugin.load")));
        assert!(set.implies(&FilePermission::read("/etc/hosts")));
        assert!(set.implies(&FilePermission::read("/tmp/a/b")));
        assert!(!set.implies(&FilePermission::new("/tmp/a", FileActions::WRITE)));
        assert!(!set.implies(&gate_permission()));
    }

    #[test]
    fn test_all_permission_implies_everything() {
        let set: PermissionSet = vec![Box::new(AllPermission) as Box<dyn Permission>]
            .into_iter()
            .collect();
        assert!(set.implies(&gate_permission()));
        assert!(set.implies(&FilePermission::read("/anything")));
        assert_eq!(set.iter().count(), 1);
    }
}
