use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use orlib_module_db::{ModuleDescriptor, ModuleLocation, ModuleRegistry};
use orlib_module_host::{
    EntryPointResolver, LaunchController, LaunchError, LaunchOutcome, LibrarySource,
    ResolveError, SessionState,
};
use pretty_assertions::assert_eq;

/// The sample module's cdylib, which cargo builds into the same directory as
/// this test binary because the crate is a dev-dependency.
fn hello_library() -> PathBuf {
    let exe = std::env::current_exe().unwrap();
    let deps = exe.parent().unwrap();
    let exact = deps.join(libloading::library_filename("hello_problem"));
    if exact.exists() {
        return exact;
    }
    let prefix = format!("{DLL_PREFIX}hello_problem");
    let search = |dir: &Path| {
        fs::read_dir(dir).ok()?.flatten().map(|entry| entry.path()).find(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map_or(false, |name| name.starts_with(&prefix) && name.ends_with(DLL_SUFFIX))
        })
    };
    search(deps)
        .or_else(|| deps.parent().and_then(search))
        .unwrap_or_else(|| panic!("hello_problem library not found near {}", deps.display()))
}

fn controller(entry_point: &str) -> LaunchController {
    let descriptor = ModuleDescriptor::new(
        "hello",
        "Sample",
        ModuleLocation::Library(hello_library()),
        entry_point,
    );
    let registry = ModuleRegistry::from_descriptors(vec![descriptor]).unwrap();
    LaunchController::new(
        Arc::new(registry),
        EntryPointResolver::new().with_source(LibrarySource::new()),
    )
}

#[test]
fn exported_windows_are_loaded_from_the_library() {
    let controller = controller("HelloWindow");
    let session = match controller.launch("hello") {
        Ok(LaunchOutcome::Opened(session)) => session,
        other => panic!("expected a new window, got {other:?}"),
    };
    assert!(controller.resolver().is_cached("hello"));

    let title = controller.dispatch(session, |window| window.title());
    assert_eq!(title, Some(Ok("Sample Problem".to_string())));
    assert_eq!(controller.launch("hello"), Ok(LaunchOutcome::Focused(session)));

    let ctx = egui::Context::default();
    let _ = ctx.run(egui::RawInput::default(), |ctx| controller.present(ctx));
    assert!(controller.is_active("hello"));

    // The window is dropped before the library it came from.
    assert_eq!(controller.close("hello"), 1);
    assert_eq!(controller.recent()[0].state, SessionState::Closed);
    assert!(matches!(
        controller.launch("hello"),
        Ok(LaunchOutcome::Opened(reopened)) if reopened != session
    ));
    assert_eq!(controller.close_all(), 1);
}

#[test]
fn unknown_symbols_in_a_loaded_library_are_reported() {
    let controller = controller("NoSuchWindow");
    let Err(LaunchError::Resolve(err)) = controller.launch("hello") else {
        panic!("missing entry point expected");
    };
    assert!(matches!(
        &err,
        ResolveError::EntryPointMissing { id, symbol, .. } if id == "hello" && symbol == "NoSuchWindow"
    ));
    assert!(controller.sessions().is_empty());
    assert!(controller.faults().try_recv().is_err());
}
