use std::path::PathBuf;

use orlib_module_db::ModuleStatus;
use thiserror::Error;

use crate::fault::FaultRecord;

/// Errors raised while turning a descriptor into an entry point.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("cannot load module for problem {id:?} from {location}: {reason}")]
    ModuleLoad {
        id: String,
        location: String,
        reason: String,
        /// File whose absence caused the failure, if any.
        missing: Option<PathBuf>,
        /// Set when the missing file has appeared since the failure was
        /// recorded, so another attempt may succeed.
        retryable: bool,
    },
    #[error("module for problem {id:?} at {location} has no entry point {symbol:?}")]
    EntryPointMissing {
        id: String,
        location: String,
        symbol: String,
    },
}

impl ResolveError {
    pub(crate) fn module_load(
        id: impl Into<String>,
        location: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        ResolveError::ModuleLoad {
            id: id.into(),
            location: location.to_string(),
            reason: reason.into(),
            missing: None,
            retryable: false,
        }
    }

    pub(crate) fn missing_file(id: impl Into<String>, location: impl ToString, path: PathBuf) -> Self {
        ResolveError::ModuleLoad {
            id: id.into(),
            location: location.to_string(),
            reason: format!("module file {} does not exist", path.display()),
            missing: Some(path),
            retryable: false,
        }
    }

    pub(crate) fn entry_point_missing(
        id: impl Into<String>,
        location: impl ToString,
        symbol: impl Into<String>,
    ) -> Self {
        ResolveError::EntryPointMissing {
            id: id.into(),
            location: location.to_string(),
            symbol: symbol.into(),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            ResolveError::ModuleLoad { id, .. } | ResolveError::EntryPointMissing { id, .. } => id,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, ResolveError::ModuleLoad { retryable: true, .. })
    }

    /// Copy of a cached failure as reported to a new caller.
    pub(crate) fn reported(&self) -> Self {
        let mut report = self.clone();
        if let ResolveError::ModuleLoad {
            missing, retryable, ..
        } = &mut report
        {
            *retryable = missing.as_ref().is_some_and(|path| path.exists());
        }
        report
    }
}

/// Reasons a launch request did not produce or focus a window.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LaunchError {
    #[error("no problem registered under id {id:?}")]
    UnknownProblem { id: String },
    #[error("problem {id:?} is not launchable ({status:?})")]
    NotLaunchable { id: String, status: ModuleStatus },
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Fault(#[from] FaultRecord),
}
