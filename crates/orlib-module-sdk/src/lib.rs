//! ORLib Module SDK
//! ================
//!
//! Building blocks for problem modules hosted by the ORLib dashboard. A module
//! exposes one or more entry points; each entry point constructs a window that
//! implements [`ProblemWindow`]. Modules are either compiled into the
//! dashboard and registered in a [`ModuleCatalog`], or built as a `cdylib`
//! that exports its entry points with [`export_problem!`].

mod catalog;
mod window;

pub use catalog::{BuiltinModule, ModuleCatalog, WindowFactory};
pub use window::ProblemWindow;

/// ABI revision shared between the dashboard and dynamically loaded modules.
///
/// Bumped whenever [`ProblemWindow`] or [`EntryPointFn`] change shape. The
/// host refuses to resolve entry points from libraries exporting a different
/// value.
pub const ORLIB_MODULE_ABI_VERSION: u32 = 1;

/// Name of the exported static carrying the module's ABI revision.
pub const ABI_MARKER_SYMBOL: &str = "ORLIB_MODULE_ABI";

/// Signature of an entry point exported by a dynamic module.
pub type EntryPointFn = fn() -> Box<dyn ProblemWindow>;

/// Common imports for module authors.
pub mod prelude {
    pub use crate::{export_problem, BuiltinModule, ModuleCatalog, ProblemWindow};
    pub use egui;
}

/// Export entry points from a dynamic problem module.
///
/// Each `symbol => constructor` pair produces an unmangled function named
/// `symbol` returning the boxed window. The macro also exports the ABI marker
/// the host checks before resolving any symbol, so it must be invoked exactly
/// once per library.
///
/// # Example
///
/// ```ignore
/// use orlib_module_sdk::prelude::*;
///
/// struct MainWindow;
///
/// impl ProblemWindow for MainWindow { /* ... */ }
///
/// export_problem!(MainWindow => MainWindow);
/// ```
#[macro_export]
macro_rules! export_problem {
    ($($symbol:ident => $ctor:expr),+ $(,)?) => {
        #[no_mangle]
        pub static ORLIB_MODULE_ABI: u32 = $crate::ORLIB_MODULE_ABI_VERSION;

        $(
            #[no_mangle]
            #[allow(non_snake_case)]
            pub fn $symbol() -> Box<dyn $crate::ProblemWindow> {
                Box::new($ctor)
            }
        )+
    };
}
