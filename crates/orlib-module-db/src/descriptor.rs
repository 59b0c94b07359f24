use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

const BUILTIN_PREFIX: &str = "builtin:";

/// Completion state of a problem module, as declared by its author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleStatus {
    Complete,
    Incomplete,
    Unavailable,
}

impl ModuleStatus {
    pub fn label(self) -> &'static str {
        match self {
            ModuleStatus::Complete => "Ready",
            ModuleStatus::Incomplete => "In progress",
            ModuleStatus::Unavailable => "Unavailable",
        }
    }

    pub fn is_listed(self) -> bool {
        self != ModuleStatus::Unavailable
    }
}

/// A descriptor that does not declare its status is listed but not launchable.
impl Default for ModuleStatus {
    fn default() -> Self {
        ModuleStatus::Incomplete
    }
}

/// Where a module's code lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ModuleLocation {
    /// Logical reference into the dashboard's in-process catalog.
    Builtin(String),
    /// Dynamic library on disk. A path without an extension is expanded to
    /// the platform's library file name at load time.
    Library(PathBuf),
}

impl ModuleLocation {
    /// Anchor a relative library path at `base`. Builtin references and
    /// absolute paths are returned unchanged.
    pub fn rebased(&self, base: &Path) -> Self {
        match self {
            ModuleLocation::Library(path) if path.is_relative() => {
                ModuleLocation::Library(base.join(path))
            }
            other => other.clone(),
        }
    }

    pub fn library_path(&self) -> Option<&Path> {
        match self {
            ModuleLocation::Library(path) => Some(path),
            ModuleLocation::Builtin(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid module location {0:?}")]
pub struct InvalidLocation(String);

impl FromStr for ModuleLocation {
    type Err = InvalidLocation;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if let Some(name) = trimmed.strip_prefix(BUILTIN_PREFIX) {
            if name.is_empty() {
                return Err(InvalidLocation(value.to_string()));
            }
            return Ok(ModuleLocation::Builtin(name.to_string()));
        }
        if trimmed.is_empty() {
            return Err(InvalidLocation(value.to_string()));
        }
        Ok(ModuleLocation::Library(PathBuf::from(trimmed)))
    }
}

impl TryFrom<String> for ModuleLocation {
    type Error = InvalidLocation;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ModuleLocation> for String {
    fn from(location: ModuleLocation) -> Self {
        location.to_string()
    }
}

impl fmt::Display for ModuleLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleLocation::Builtin(name) => write!(f, "{BUILTIN_PREFIX}{name}"),
            ModuleLocation::Library(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Static metadata describing one integrable problem and how to load it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "module")]
    pub module_location: ModuleLocation,
    pub entry_point: String,
    #[serde(default)]
    pub status: ModuleStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Opt into more than one simultaneous window for this problem.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub allow_multiple: bool,
}

impl ModuleDescriptor {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        module_location: ModuleLocation,
        entry_point: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            module_location,
            entry_point: entry_point.into(),
            status: ModuleStatus::Complete,
            icon: None,
            allow_multiple: false,
        }
    }

    pub fn with_status(mut self, status: ModuleStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn allowing_multiple(mut self) -> Self {
        self.allow_multiple = true;
        self
    }

    /// Whether the dashboard offers this problem for launching.
    pub fn is_selectable(&self) -> bool {
        self.status == ModuleStatus::Complete
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn location_parses_builtin_and_paths() {
        assert_eq!(
            "builtin:hello".parse::<ModuleLocation>().unwrap(),
            ModuleLocation::Builtin("hello".into())
        );
        assert_eq!(
            "modules/nour".parse::<ModuleLocation>().unwrap(),
            ModuleLocation::Library(PathBuf::from("modules/nour"))
        );
        assert!("builtin:".parse::<ModuleLocation>().is_err());
        assert!("   ".parse::<ModuleLocation>().is_err());
    }

    #[test]
    fn rebase_only_touches_relative_libraries() {
        let base = Path::new("/opt/orlib");
        let relative = ModuleLocation::Library(PathBuf::from("modules/nour"));
        assert_eq!(
            relative.rebased(base),
            ModuleLocation::Library(PathBuf::from("/opt/orlib/modules/nour"))
        );
        let builtin = ModuleLocation::Builtin("hello".into());
        assert_eq!(builtin.rebased(base), builtin);
    }

    #[test]
    fn descriptor_json_uses_defaults() {
        let json = r#"{"id":"p1","title":"Routes","module":"builtin:routes","entry_point":"MainWindow","status":"complete"}"#;
        let descriptor: ModuleDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(descriptor.status, ModuleStatus::Complete);
        assert!(!descriptor.allow_multiple);
        assert!(descriptor.is_selectable());
        let back = serde_json::to_string(&descriptor).unwrap();
        assert!(back.contains("\"module\":\"builtin:routes\""));
        assert!(!back.contains("allow_multiple"));
    }

    #[test]
    fn undeclared_status_is_not_launchable() {
        let json = r#"{"id":"p2","title":"Flows","module":"modules/flows","entry_point":"MainWindow"}"#;
        let descriptor: ModuleDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(descriptor.status, ModuleStatus::Incomplete);
        assert!(descriptor.status.is_listed());
        assert!(!descriptor.is_selectable());
        assert_eq!(
            ModuleDescriptor::new("p2", "Flows", ModuleLocation::Builtin("flows".into()), "MainWindow")
                .status,
            ModuleStatus::Complete
        );
    }

    #[test]
    fn status_uses_snake_case() {
        let status: ModuleStatus = serde_json::from_str("\"incomplete\"").unwrap();
        assert_eq!(status, ModuleStatus::Incomplete);
        assert!(!ModuleStatus::Unavailable.is_listed());
    }
}
