use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use orlib_module_db::{stock_problems, DescriptorFile, ModuleDescriptor, ModuleRegistry};
use orlib_module_host::{standard_resolver, ControllerOptions, LaunchController};
use orlib_module_sdk::{BuiltinModule, ModuleCatalog};
use tracing::info;

use crate::config::DashboardConfig;

/// Where the descriptor table came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorSource {
    File(PathBuf),
    Stock { base: PathBuf },
}

/// Modules compiled into the dashboard.
pub fn builtin_catalog() -> ModuleCatalog {
    ModuleCatalog::new().with_module(
        "hello",
        BuiltinModule::new().with_entry_fn("HelloWindow", hello_problem::HelloWindow),
    )
}

/// Pick the descriptor table: an explicitly named file must exist, the
/// per-user file is used when present, otherwise the stock table anchored at
/// the executable's directory.
pub fn descriptor_source(explicit: Option<&Path>) -> Result<DescriptorSource> {
    if let Some(path) = explicit {
        if !path.exists() {
            bail!("descriptor file {} does not exist", path.display());
        }
        return Ok(DescriptorSource::File(path.to_path_buf()));
    }
    if let Ok(path) = DescriptorFile::default_path() {
        if path.exists() {
            return Ok(DescriptorSource::File(path));
        }
    }
    let base = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));
    Ok(DescriptorSource::Stock { base })
}

pub fn load_descriptors(source: &DescriptorSource) -> Result<Vec<ModuleDescriptor>> {
    match source {
        DescriptorSource::File(path) => Ok(DescriptorFile::load(path)?),
        DescriptorSource::Stock { base } => Ok(stock_problems()
            .into_iter()
            .map(|mut descriptor| {
                descriptor.module_location = descriptor.module_location.rebased(base);
                descriptor
            })
            .collect()),
    }
}

pub fn load_registry(source: &DescriptorSource) -> Result<ModuleRegistry> {
    let descriptors = load_descriptors(source)?;
    let registry =
        ModuleRegistry::from_descriptors(descriptors).context("invalid problem descriptor table")?;
    info!(source = ?source, problems = registry.len(), "problem registry ready");
    Ok(registry)
}

pub fn build_controller(registry: ModuleRegistry, config: &DashboardConfig) -> LaunchController {
    LaunchController::new(Arc::new(registry), standard_resolver(builtin_catalog())).with_options(
        ControllerOptions {
            close_timeout: config.close_timeout(),
            ..ControllerOptions::default()
        },
    )
}
