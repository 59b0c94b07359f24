use std::path::{Path, PathBuf};
use std::sync::Arc;

use libloading::Library;
use orlib_module_db::{ModuleDescriptor, ModuleLocation};
use orlib_module_sdk::{EntryPointFn, ABI_MARKER_SYMBOL, ORLIB_MODULE_ABI_VERSION};
use tracing::debug;

use crate::error::ResolveError;
use crate::resolver::{EntryPoint, ModuleSource};
use crate::window::ModuleKeepAlive;

/// Loads problem modules built as dynamic libraries with
/// `orlib_module_sdk::export_problem!`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LibrarySource;

impl LibrarySource {
    pub fn new() -> Self {
        Self
    }
}

/// Expand an extension-less module path to the platform's library name, so
/// `modules/nour` becomes `modules/libnour.so` on Linux.
pub fn library_file(path: &Path) -> PathBuf {
    if path.extension().is_some() {
        return path.to_path_buf();
    }
    match path.file_name() {
        Some(name) => path.with_file_name(libloading::library_filename(name)),
        None => path.to_path_buf(),
    }
}

fn check_abi(descriptor: &ModuleDescriptor, abi: u32) -> Result<(), ResolveError> {
    if abi == ORLIB_MODULE_ABI_VERSION {
        return Ok(());
    }
    Err(ResolveError::module_load(
        &descriptor.id,
        &descriptor.module_location,
        format!("module ABI {abi} does not match host ABI {ORLIB_MODULE_ABI_VERSION}"),
    ))
}

impl ModuleSource for LibrarySource {
    fn handles(&self, location: &ModuleLocation) -> bool {
        matches!(location, ModuleLocation::Library(_))
    }

    fn load(&self, descriptor: &ModuleDescriptor) -> Result<EntryPoint, ResolveError> {
        let id = descriptor.id.as_str();
        let location = &descriptor.module_location;
        let Some(path) = location.library_path() else {
            return Err(ResolveError::module_load(id, location, "not a library path"));
        };
        let path = library_file(path);
        if !path.exists() {
            return Err(ResolveError::missing_file(id, location, path));
        }

        debug!(problem = %id, path = %path.display(), "loading module library");
        // The one place module code runs outside the fault boundary: library
        // initialisers cannot unwind into the host, and modules are trusted.
        let library = unsafe { Library::new(&path) }
            .map_err(|err| ResolveError::module_load(id, location, err.to_string()))?;

        let abi = unsafe {
            library
                .get::<*const u32>(ABI_MARKER_SYMBOL.as_bytes())
                .map(|marker| **marker)
                .map_err(|_| {
                    ResolveError::module_load(
                        id,
                        location,
                        format!("library does not export {ABI_MARKER_SYMBOL}"),
                    )
                })?
        };
        check_abi(descriptor, abi)?;

        let entry: EntryPointFn = unsafe {
            *library
                .get::<EntryPointFn>(descriptor.entry_point.as_bytes())
                .map_err(|_| ResolveError::entry_point_missing(id, location, &descriptor.entry_point))?
        };

        let library: ModuleKeepAlive = Arc::new(library);
        Ok(EntryPoint::new(descriptor, Arc::new(move || entry())).with_module(library))
    }
}
