use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::descriptor::ModuleDescriptor;

const APP_DIR_NAME: &str = "ORLibrary";
const MODULES_FILE: &str = "modules.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read descriptor file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse descriptor file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write descriptor file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no configuration directory available")]
    NoConfigDir,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct JsonDescriptorData {
    problems: Vec<ModuleDescriptor>,
}

/// JSON file listing the problems the dashboard hosts.
///
/// ```json
/// { "problems": [
///     { "id": "p1", "title": "Problem 1", "module": "modules/nour",
///       "entry_point": "MainWindow", "status": "complete" }
/// ] }
/// ```
///
/// Relative library paths are anchored at the directory holding the file.
#[derive(Debug)]
pub struct DescriptorFile;

impl DescriptorFile {
    pub fn default_path() -> Result<PathBuf, StoreError> {
        let config_dir = dirs::config_dir().ok_or(StoreError::NoConfigDir)?;
        Ok(config_dir.join(APP_DIR_NAME).join(MODULES_FILE))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Vec<ModuleDescriptor>, StoreError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| StoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let data: JsonDescriptorData =
            serde_json::from_str(&raw).map_err(|source| StoreError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let descriptors: Vec<_> = data
            .problems
            .into_iter()
            .map(|mut descriptor| {
                descriptor.module_location = descriptor.module_location.rebased(base);
                descriptor
            })
            .collect();
        info!(
            path = %path.display(),
            count = descriptors.len(),
            "loaded problem descriptors"
        );
        Ok(descriptors)
    }

    pub fn save(path: impl AsRef<Path>, descriptors: &[ModuleDescriptor]) -> Result<(), StoreError> {
        let path = path.as_ref();
        let write_err = |source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(write_err)?;
            }
        }
        let data = JsonDescriptorData {
            problems: descriptors.to_vec(),
        };
        let json = serde_json::to_string_pretty(&data).map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(write_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;
    use crate::descriptor::{ModuleLocation, ModuleStatus};

    #[test]
    fn load_rebases_relative_libraries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("modules.json");
        fs::write(
            &path,
            r#"{ "problems": [
                { "id": "p1", "title": "Routes", "module": "modules/nour", "entry_point": "MainWindow", "status": "complete" },
                { "id": "p2", "title": "Demo", "module": "builtin:hello", "entry_point": "HelloWindow", "status": "incomplete" }
            ] }"#,
        )
        .unwrap();

        let descriptors = DescriptorFile::load(&path).unwrap();
        assert_eq!(descriptors.len(), 2);
        assert_eq!(
            descriptors[0].module_location,
            ModuleLocation::Library(dir.path().join("modules/nour"))
        );
        assert_eq!(
            descriptors[1].module_location,
            ModuleLocation::Builtin("hello".into())
        );
        assert_eq!(descriptors[1].status, ModuleStatus::Incomplete);
    }

    #[test]
    fn save_then_load_preserves_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("modules.json");
        let descriptors = crate::stock_problems();
        DescriptorFile::save(&path, &descriptors).unwrap();
        let loaded = DescriptorFile::load(&path).unwrap();
        let ids: Vec<_> = loaded.iter().map(|d| d.id.as_str()).collect();
        let expected: Vec<_> = descriptors.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn malformed_files_report_parse_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("modules.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            DescriptorFile::load(&path),
            Err(StoreError::Parse { .. })
        ));
        assert!(matches!(
            DescriptorFile::load(dir.path().join("absent.json")),
            Err(StoreError::Read { .. })
        ));
    }
}
