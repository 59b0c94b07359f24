use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use orlib_module_sdk::ProblemWindow;

/// Keeps whatever backs a module (a loaded library) alive while windows
/// constructed from it exist.
pub type ModuleKeepAlive = Arc<dyn Any + Send + Sync>;

/// Fires once the window it belongs to has been closed.
///
/// The signal is the disconnection of a channel, so any number of clones can
/// observe it and late observers still see it.
#[derive(Debug, Clone)]
pub struct CloseSignal {
    rx: Receiver<()>,
}

impl CloseSignal {
    fn pair() -> (Sender<()>, Self) {
        let (tx, rx) = bounded(0);
        (tx, Self { rx })
    }

    /// Block until the window closes or `timeout` elapses. Returns whether
    /// the window closed.
    pub fn wait(&self, timeout: Duration) -> bool {
        matches!(
            self.rx.recv_timeout(timeout),
            Err(RecvTimeoutError::Disconnected)
        )
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.rx.try_recv(), Err(TryRecvError::Disconnected))
    }
}

/// Host-side owner of one hosted window.
///
/// Calls into the wrapped window must go through the fault boundary; the
/// handle itself only tracks host state.
pub struct WindowHandle {
    // Declared before `_module` so the window drops before its library.
    window: Option<Box<dyn ProblemWindow>>,
    title: String,
    size: [f32; 2],
    closer: Option<Sender<()>>,
    signal: CloseSignal,
    focus_pending: bool,
    _module: Option<ModuleKeepAlive>,
}

impl WindowHandle {
    /// Wrap a freshly constructed window. Reads its title and size, so this
    /// must run inside the fault boundary.
    pub(crate) fn new(window: Box<dyn ProblemWindow>, module: Option<ModuleKeepAlive>) -> Self {
        let title = window.title();
        let size = window.initial_size();
        let (closer, signal) = CloseSignal::pair();
        Self {
            window: Some(window),
            title,
            size,
            closer: Some(closer),
            signal,
            focus_pending: false,
            _module: module,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn initial_size(&self) -> [f32; 2] {
        self.size
    }

    pub fn close_signal(&self) -> CloseSignal {
        self.signal.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closer.is_none()
    }

    /// `None` once the window has been disposed.
    pub(crate) fn window_mut(&mut self) -> Option<&mut (dyn ProblemWindow + 'static)> {
        self.window.as_deref_mut()
    }

    /// Move the window out so it can be closed and dropped inside the fault
    /// boundary.
    pub(crate) fn take_window(&mut self) -> Option<Box<dyn ProblemWindow>> {
        self.window.take()
    }

    pub(crate) fn request_focus(&mut self) {
        self.focus_pending = true;
    }

    pub(crate) fn take_focus_request(&mut self) -> bool {
        std::mem::take(&mut self.focus_pending)
    }

    pub(crate) fn mark_closed(&mut self) {
        self.closer.take();
    }
}

impl fmt::Debug for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowHandle")
            .field("title", &self.title)
            .field("closed", &self.is_closed())
            .field("focus_pending", &self.focus_pending)
            .finish()
    }
}
