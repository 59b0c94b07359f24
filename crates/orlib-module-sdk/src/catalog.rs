use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::{EntryPointFn, ProblemWindow};

/// Constructor behind a resolved entry point.
pub type WindowFactory = Arc<dyn Fn() -> Box<dyn ProblemWindow> + Send + Sync>;

/// A module compiled into the dashboard, addressed as `builtin:<name>`.
#[derive(Default, Clone)]
pub struct BuiltinModule {
    entry_points: Vec<(String, WindowFactory)>,
}

impl BuiltinModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_entry_point<F>(&mut self, symbol: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn ProblemWindow> + Send + Sync + 'static,
    {
        let symbol = symbol.into();
        self.entry_points.retain(|(existing, _)| existing != &symbol);
        self.entry_points.push((symbol, Arc::new(factory)));
        self
    }

    pub fn with_entry_point<F>(mut self, symbol: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Box<dyn ProblemWindow> + Send + Sync + 'static,
    {
        self.register_entry_point(symbol, factory);
        self
    }

    /// Register a plain entry point function, as exported by dynamic modules.
    pub fn with_entry_fn(self, symbol: impl Into<String>, entry: EntryPointFn) -> Self {
        self.with_entry_point(symbol, move || entry())
    }

    pub fn entry_point(&self, symbol: &str) -> Option<WindowFactory> {
        self.entry_points
            .iter()
            .find(|(name, _)| name == symbol)
            .map(|(_, factory)| Arc::clone(factory))
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.entry_points.iter().map(|(name, _)| name.as_str())
    }
}

impl fmt::Debug for BuiltinModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinModule")
            .field("entry_points", &self.symbols().collect::<Vec<_>>())
            .finish()
    }
}

/// In-process table of builtin modules keyed by logical name.
#[derive(Debug, Default, Clone)]
pub struct ModuleCatalog {
    modules: HashMap<String, BuiltinModule>,
}

impl ModuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_module(&mut self, name: impl Into<String>, module: BuiltinModule) -> &mut Self {
        self.modules.insert(name.into(), module);
        self
    }

    pub fn with_module(mut self, name: impl Into<String>, module: BuiltinModule) -> Self {
        self.register_module(name, module);
        self
    }

    pub fn module(&self, name: &str) -> Option<&BuiltinModule> {
        self.modules.get(name)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    struct Blank;

    impl ProblemWindow for Blank {
        fn title(&self) -> String {
            "Blank".into()
        }

        fn ui(&mut self, _ctx: &egui::Context) {}
    }

    fn blank() -> Box<dyn ProblemWindow> {
        Box::new(Blank)
    }

    #[test]
    fn catalog_resolves_registered_symbols() {
        let catalog = ModuleCatalog::new().with_module(
            "demo",
            BuiltinModule::new()
                .with_entry_fn("MainWindow", blank)
                .with_entry_point("Other", || Box::new(Blank)),
        );
        let module = catalog.module("demo").unwrap();
        assert_eq!(module.symbols().collect::<Vec<_>>(), vec!["MainWindow", "Other"]);
        let window = (module.entry_point("MainWindow").unwrap())();
        assert_eq!(window.title(), "Blank");
        assert!(module.entry_point("Missing").is_none());
        assert!(catalog.module("absent").is_none());
    }

    #[test]
    fn re_registering_a_symbol_replaces_it() {
        let mut module = BuiltinModule::new();
        module.register_entry_point("MainWindow", || Box::new(Blank));
        module.register_entry_point("MainWindow", || Box::new(Blank));
        assert_eq!(module.symbols().count(), 1);
    }
}
