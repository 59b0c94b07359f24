use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use once_cell::sync::Lazy;
use thiserror::Error;
use tracing::error;

use crate::session::SessionId;

/// When a hosted module failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultStage {
    /// The entry point or `show` failed; no session was ever created.
    Construction,
    /// A running window failed; its session must be torn down.
    Runtime,
}

impl fmt::Display for FaultStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultStage::Construction => f.write_str("construction"),
            FaultStage::Runtime => f.write_str("runtime"),
        }
    }
}

/// Structured report of a failure raised by hosted module code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{stage} fault in problem {id:?}: {message}")]
pub struct FaultRecord {
    pub id: String,
    pub session: Option<SessionId>,
    pub stage: FaultStage,
    pub message: String,
    pub cause: Option<String>,
}

impl FaultRecord {
    pub fn new(id: impl Into<String>, stage: FaultStage, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            session: None,
            stage,
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_session(mut self, session: SessionId) -> Self {
        self.session = Some(session);
        self
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }
}

thread_local! {
    static BOUNDARY_DEPTH: Cell<usize> = Cell::new(0);
    static LAST_PANIC_SITE: RefCell<Option<String>> = RefCell::new(None);
}

// Panics raised inside the boundary are recorded instead of printed; the
// boundary logs them through `tracing`. Everything else reaches the
// previously installed hook untouched.
static PANIC_HOOK: Lazy<()> = Lazy::new(|| {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let contained = BOUNDARY_DEPTH.with(|depth| depth.get() > 0);
        if contained {
            let site = info
                .location()
                .map(|location| format!("{}:{}", location.file(), location.line()));
            LAST_PANIC_SITE.with(|slot| *slot.borrow_mut() = site);
        } else {
            previous(info);
        }
    }));
});

struct DepthGuard;

impl DepthGuard {
    fn enter() -> Self {
        BOUNDARY_DEPTH.with(|depth| depth.set(depth.get() + 1));
        LAST_PANIC_SITE.with(|slot| slot.borrow_mut().take());
        DepthGuard
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        BOUNDARY_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// The only place hosted module code is executed.
///
/// Every call is wrapped in `catch_unwind`; a panic comes back as a
/// [`FaultRecord`] instead of unwinding into the dashboard. Modules built
/// with `panic = "abort"` cannot be contained.
#[derive(Debug, Clone, Copy)]
pub struct FaultBoundary {
    _hook: (),
}

impl Default for FaultBoundary {
    fn default() -> Self {
        Self::new()
    }
}

impl FaultBoundary {
    pub fn new() -> Self {
        Lazy::force(&PANIC_HOOK);
        Self { _hook: () }
    }

    /// Run an entry point and its first `show`.
    pub fn construct<R>(&self, id: &str, f: impl FnOnce() -> R) -> Result<R, FaultRecord> {
        self.contain(id, None, FaultStage::Construction, f)
    }

    /// Run a call into an already running window.
    pub fn run<R>(
        &self,
        id: &str,
        session: SessionId,
        f: impl FnOnce() -> R,
    ) -> Result<R, FaultRecord> {
        self.contain(id, Some(session), FaultStage::Runtime, f)
    }

    fn contain<R>(
        &self,
        id: &str,
        session: Option<SessionId>,
        stage: FaultStage,
        f: impl FnOnce() -> R,
    ) -> Result<R, FaultRecord> {
        let guard = DepthGuard::enter();
        let outcome = panic::catch_unwind(AssertUnwindSafe(f));
        drop(guard);

        outcome.map_err(|payload| {
            let mut fault = FaultRecord::new(id, stage, panic_message(payload.as_ref()));
            if let Some(session) = session {
                fault = fault.with_session(session);
            }
            if let Some(site) = LAST_PANIC_SITE.with(|slot| slot.borrow_mut().take()) {
                fault = fault.with_cause(format!("panicked at {site}"));
            }
            error!(
                problem = %fault.id,
                stage = %fault.stage,
                cause = fault.cause.as_deref().unwrap_or("unknown"),
                "hosted module faulted: {}",
                fault.message
            );
            fault
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "module panicked with a non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn successful_calls_pass_through() {
        let boundary = FaultBoundary::new();
        assert_eq!(boundary.construct("p1", || 42).unwrap(), 42);
    }

    #[test]
    fn construction_panics_become_records() {
        let boundary = FaultBoundary::new();
        let fault = boundary
            .construct("p1", || -> u32 { panic!("missing solver backend") })
            .unwrap_err();
        assert_eq!(fault.id, "p1");
        assert_eq!(fault.stage, FaultStage::Construction);
        assert_eq!(fault.message, "missing solver backend");
        assert_eq!(fault.session, None);
        assert!(fault.cause.unwrap().contains("fault.rs"));
    }

    #[test]
    fn runtime_panics_carry_the_session() {
        let boundary = FaultBoundary::new();
        let fault = boundary
            .run("p4", SessionId(7), || panic!("{} nodes", 3))
            .unwrap_err();
        assert_eq!(fault.stage, FaultStage::Runtime);
        assert_eq!(fault.session, Some(SessionId(7)));
        assert_eq!(fault.message, "3 nodes");
    }

    #[test]
    fn nested_boundaries_unwind_cleanly() {
        let boundary = FaultBoundary::new();
        let outer = boundary.construct("outer", || {
            boundary
                .construct("inner", || panic!("inner failure"))
                .map_err(|fault| fault.id)
        });
        assert_eq!(outer.unwrap(), Err::<(), _>("inner".to_string()));
        BOUNDARY_DEPTH.with(|depth| assert_eq!(depth.get(), 0));
    }
}
