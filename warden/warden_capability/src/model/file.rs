use bitflags::bitflags;
use std::any::Any;
use std::fmt;

use super::permission::{Permission, PermissionParseError};

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    /// File actions as a bit field for efficient subset checks
    pub struct FileActions: u8 {
        const READ = 0b00000001;
        const WRITE = 0b00000010;
        const EXECUTE = 0b00000100;
        const DELETE = 0b00001000;
    }
}

impl FileActions {
    /// Parses a comma separated action list such as `read,write`.
    pub fn parse(text: &str) -> Result<Self, PermissionParseError> {
        let mut actions = FileActions::empty();
        for action in text.split(',').map(str::trim).filter(|a| !a.is_empty()) {
            actions |= match action.to_lowercase().as_str() {
                "read" => FileActions::READ,
                "write" => FileActions::WRITE,
                "execute" => FileActions::EXECUTE,
                "delete" => FileActions::DELETE,
                _ => return Err(PermissionParseError::UnknownAction(action.to_string())),
            };
        }

        if actions.is_empty() {
            return Err(PermissionParseError::UnknownAction(text.to_string()));
        }
        Ok(actions)
    }
}

impl fmt::Display for FileActions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = [
            (FileActions::READ, "read"),
            (FileActions::WRITE, "write"),
            (FileActions::EXECUTE, "execute"),
            (FileActions::DELETE, "delete"),
        ]
        .iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, name)| *name)
        .collect();
        f.write_str(&names.join(","))
    }
}

/// Matches every file.
pub const ALL_FILES: &str = "<<ALL FILES>>";

/// Patterns and requests are compared after lexical normalization, so
/// `/srv/data/../../etc` is `/etc` and never falls under `/srv/data/-`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum PathPattern {
    AllFiles,
    /// `/dir/-`, stored as `/dir/`
    Recursive(String),
    /// `/dir/*`, stored as `/dir/`
    Directory(String),
    Exact(String),
    /// A path whose `..` climbs above its root. Only `<<ALL FILES>>` covers it.
    Escaping,
}

/// Resolves `.` and `..` and collapses repeated separators
///
/// Returns `None` when a `..` would climb above the start of the path.
fn normalize(path: &str) -> Option<String> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            name => segments.push(name),
        }
    }

    let joined = segments.join("/");
    Some(if path.starts_with('/') {
        format!("/{}", joined)
    } else {
        joined
    })
}

/// Normalizes the base of a `/dir/-` or `/dir/*` pattern, keeping the trailing `/`.
fn normalize_base(base: &str) -> Option<String> {
    let mut normalized = normalize(base)?;
    if !normalized.is_empty() && !normalized.ends_with('/') {
        normalized.push('/');
    }
    Some(normalized)
}

/// The part of `path` below `base`, if `path` lies under it
fn below<'a>(base: &str, path: &'a str) -> Option<&'a str> {
    if base.is_empty() {
        // Relative base: only relative paths live under it.
        return (!path.starts_with('/')).then_some(path);
    }
    path.strip_prefix(base)
}

impl PathPattern {
    fn parse(pattern: &str) -> Self {
        let parsed = if pattern == ALL_FILES {
            Some(PathPattern::AllFiles)
        } else if let Some(base) = pattern.strip_suffix('-').filter(|b| b.ends_with('/')) {
            normalize_base(base).map(PathPattern::Recursive)
        } else if let Some(base) = pattern.strip_suffix('*').filter(|b| b.ends_with('/')) {
            normalize_base(base).map(PathPattern::Directory)
        } else {
            normalize(pattern).map(PathPattern::Exact)
        };
        parsed.unwrap_or(PathPattern::Escaping)
    }

    fn covers(&self, other: &PathPattern) -> bool {
        match (self, other) {
            (PathPattern::AllFiles, _) => true,
            (_, PathPattern::AllFiles) | (_, PathPattern::Escaping) => false,
            (PathPattern::Escaping, _) => false,
            (PathPattern::Recursive(base), PathPattern::Exact(path)) => {
                below(base, path).is_some_and(|rest| !rest.is_empty())
            }
            (PathPattern::Recursive(base), PathPattern::Recursive(other_base))
            | (PathPattern::Recursive(base), PathPattern::Directory(other_base)) => {
                below(base, other_base).is_some()
            }
            (PathPattern::Directory(base), PathPattern::Exact(path)) => below(base, path)
                .is_some_and(|rest| !rest.is_empty() && !rest.contains('/')),
            (PathPattern::Directory(base), PathPattern::Directory(other_base)) => {
                base == other_base
            }
            (PathPattern::Directory(_), PathPattern::Recursive(_)) => false,
            (PathPattern::Exact(path), PathPattern::Exact(other_path)) => path == other_path,
            (PathPattern::Exact(_), _) => false,
        }
    }
}

/// A right to perform actions on a path or a tree of paths
///
/// Patterns: `<<ALL FILES>>` covers everything, `/dir/-` covers every path
/// below `/dir`, `/dir/*` covers the direct children of `/dir`, anything else
/// is an exact path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilePermission {
    pattern: String,
    parsed: PathPattern,
    actions: FileActions,
}

impl FilePermission {
    /// Creates a new file permission with the specified pattern and actions
    pub fn new(pattern: impl Into<String>, actions: FileActions) -> Self {
        let pattern = pattern.into();
        let parsed = PathPattern::parse(&pattern);
        Self {
            pattern,
            parsed,
            actions,
        }
    }

    /// Creates a permission for read access
    pub fn read(pattern: impl Into<String>) -> Self {
        Self::new(pattern, FileActions::READ)
    }

    /// Gets the actions this permission covers
    pub fn actions(&self) -> FileActions {
        self.actions
    }
}

impl Permission for FilePermission {
    fn permission_type(&self) -> &str {
        "file"
    }

    fn name(&self) -> &str {
        &self.pattern
    }

    fn implies(&self, other: &dyn Permission) -> bool {
        let Some(other) = other.as_any().downcast_ref::<FilePermission>() else {
            return false;
        };

        // Check actions first (faster)
        self.actions.contains(other.actions) && self.parsed.covers(&other.parsed)
    }

    fn clone_box(&self) -> Box<dyn Permission> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Display for FilePermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(\"file\" \"{}\" \"{}\")", self.pattern, self.actions)
    }
}
