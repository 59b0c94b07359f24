use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use orlib_module_db::{ModuleDescriptor, ModuleLocation};
use orlib_module_sdk::{ModuleCatalog, ProblemWindow, WindowFactory};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::ResolveError;
use crate::window::ModuleKeepAlive;

/// A constructible entry point, ready to produce windows.
#[derive(Clone)]
pub struct EntryPoint {
    id: String,
    symbol: String,
    location: ModuleLocation,
    factory: WindowFactory,
    module: Option<ModuleKeepAlive>,
}

impl EntryPoint {
    pub fn new(descriptor: &ModuleDescriptor, factory: WindowFactory) -> Self {
        Self {
            id: descriptor.id.clone(),
            symbol: descriptor.entry_point.clone(),
            location: descriptor.module_location.clone(),
            factory,
            module: None,
        }
    }

    pub fn with_module(mut self, module: ModuleKeepAlive) -> Self {
        self.module = Some(module);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn location(&self) -> &ModuleLocation {
        &self.location
    }

    /// Run the module's constructor. Hosted code: call through the fault
    /// boundary.
    pub fn instantiate(&self) -> Box<dyn ProblemWindow> {
        (self.factory)()
    }

    pub(crate) fn module(&self) -> Option<ModuleKeepAlive> {
        self.module.clone()
    }
}

impl fmt::Debug for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryPoint")
            .field("id", &self.id)
            .field("symbol", &self.symbol)
            .field("location", &self.location)
            .finish()
    }
}

/// Something that can load the module behind a kind of [`ModuleLocation`].
pub trait ModuleSource: Send + Sync {
    fn handles(&self, location: &ModuleLocation) -> bool;
    fn load(&self, descriptor: &ModuleDescriptor) -> Result<EntryPoint, ResolveError>;
}

/// Resolves `builtin:<name>` locations against an in-process catalog.
#[derive(Debug, Default)]
pub struct BuiltinSource {
    catalog: ModuleCatalog,
}

impl BuiltinSource {
    pub fn new(catalog: ModuleCatalog) -> Self {
        Self { catalog }
    }
}

impl ModuleSource for BuiltinSource {
    fn handles(&self, location: &ModuleLocation) -> bool {
        matches!(location, ModuleLocation::Builtin(_))
    }

    fn load(&self, descriptor: &ModuleDescriptor) -> Result<EntryPoint, ResolveError> {
        let ModuleLocation::Builtin(name) = &descriptor.module_location else {
            return Err(ResolveError::module_load(
                &descriptor.id,
                &descriptor.module_location,
                "not a builtin module reference",
            ));
        };
        let module = self.catalog.module(name).ok_or_else(|| {
            ResolveError::module_load(
                &descriptor.id,
                &descriptor.module_location,
                format!("no builtin module named {name:?}"),
            )
        })?;
        let factory = module.entry_point(&descriptor.entry_point).ok_or_else(|| {
            ResolveError::entry_point_missing(
                &descriptor.id,
                &descriptor.module_location,
                &descriptor.entry_point,
            )
        })?;
        Ok(EntryPoint::new(descriptor, factory))
    }
}

enum Resolution {
    Ready(Arc<EntryPoint>),
    Failed(ResolveError),
}

/// Lazily turns descriptors into entry points and remembers the outcome.
///
/// Nothing is loaded until a problem is first resolved, so a broken module
/// that is never launched cannot affect the dashboard. Both successes and
/// failures are cached per problem id for the life of the resolver.
pub struct EntryPointResolver {
    sources: Vec<Box<dyn ModuleSource>>,
    cache: Mutex<HashMap<String, Resolution>>,
}

impl Default for EntryPointResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl EntryPointResolver {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_source(mut self, source: impl ModuleSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    pub fn resolve(&self, descriptor: &ModuleDescriptor) -> Result<Arc<EntryPoint>, ResolveError> {
        if let Some(cached) = self.cached(&descriptor.id) {
            return cached;
        }

        // Loading runs outside the cache lock. Callers serialise resolution
        // of a single id, so two loads of the same module do not race.
        let resolution = match self.load(descriptor) {
            Ok(entry) => {
                info!(problem = %descriptor.id, symbol = %descriptor.entry_point, "resolved entry point");
                Resolution::Ready(Arc::new(entry))
            }
            Err(err) => {
                warn!(problem = %descriptor.id, "entry point resolution failed: {err}");
                Resolution::Failed(err)
            }
        };

        let mut cache = self.cache.lock();
        let slot = cache.entry(descriptor.id.clone()).or_insert(resolution);
        Self::report(slot)
    }

    /// Drop the cached outcome for `id` so the next `resolve` loads again.
    pub fn evict(&self, id: &str) -> bool {
        let removed = self.cache.lock().remove(id).is_some();
        if removed {
            debug!(problem = %id, "evicted cached resolution");
        }
        removed
    }

    pub fn is_cached(&self, id: &str) -> bool {
        self.cache.lock().contains_key(id)
    }

    fn cached(&self, id: &str) -> Option<Result<Arc<EntryPoint>, ResolveError>> {
        self.cache.lock().get(id).map(Self::report)
    }

    fn report(resolution: &Resolution) -> Result<Arc<EntryPoint>, ResolveError> {
        match resolution {
            Resolution::Ready(entry) => Ok(Arc::clone(entry)),
            Resolution::Failed(err) => Err(err.reported()),
        }
    }

    fn load(&self, descriptor: &ModuleDescriptor) -> Result<EntryPoint, ResolveError> {
        let source = self
            .sources
            .iter()
            .find(|source| source.handles(&descriptor.module_location))
            .ok_or_else(|| {
                ResolveError::module_load(
                    &descriptor.id,
                    &descriptor.module_location,
                    "no module source handles this location",
                )
            })?;
        source.load(descriptor)
    }
}

impl fmt::Debug for EntryPointResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryPointResolver")
            .field("sources", &self.sources.len())
            .field("cached", &self.cache.lock().len())
            .finish()
    }
}
