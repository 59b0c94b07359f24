//! Hosting layer for ORLib problem modules.
//!
//! Problem windows come either from an in-process [`ModuleCatalog`] or from
//! dynamic libraries built with `orlib_module_sdk::export_problem!`. The
//! [`EntryPointResolver`] loads a module the first time its problem is
//! launched and caches the outcome. The [`LaunchController`] owns every open
//! window, enforces one window per problem unless a descriptor opts into
//! more, and runs all hosted code behind the [`FaultBoundary`] so a failing
//! module only takes down its own window.

mod controller;
mod error;
mod fault;
mod library;
mod present;
mod resolver;
mod session;
mod window;

pub use controller::{ControllerOptions, LaunchController, LaunchOutcome};
pub use error::{LaunchError, ResolveError};
pub use fault::{FaultBoundary, FaultRecord, FaultStage};
pub use library::{library_file, LibrarySource};
pub use present::viewport_id;
pub use resolver::{BuiltinSource, EntryPoint, EntryPointResolver, ModuleSource};
pub use session::{LaunchSession, SessionId, SessionSnapshot, SessionState};
pub use window::{CloseSignal, ModuleKeepAlive, WindowHandle};

use orlib_module_sdk::ModuleCatalog;

/// Resolver that serves `builtin:` locations from `catalog` and everything
/// else from dynamic libraries.
pub fn standard_resolver(catalog: ModuleCatalog) -> EntryPointResolver {
    EntryPointResolver::new()
        .with_source(BuiltinSource::new(catalog))
        .with_source(LibrarySource::new())
}
