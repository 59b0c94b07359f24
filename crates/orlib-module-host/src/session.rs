use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use crate::fault::FaultRecord;
use crate::window::WindowHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl SessionId {
    pub(crate) fn next(counter: &AtomicU64) -> Self {
        SessionId(counter.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of a launched problem window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Loading,
    Running,
    Closed,
    Faulted,
}

/// Runtime record of one open hosted window.
pub struct LaunchSession {
    pub(crate) session_id: SessionId,
    pub(crate) descriptor_id: String,
    pub(crate) title: String,
    pub(crate) window: Arc<Mutex<WindowHandle>>,
    pub(crate) state: SessionState,
    pub(crate) last_error: Option<FaultRecord>,
    pub(crate) opened_at: Instant,
}

impl LaunchSession {
    pub(crate) fn running(session_id: SessionId, descriptor_id: &str, window: WindowHandle) -> Self {
        Self {
            session_id,
            descriptor_id: descriptor_id.to_string(),
            title: window.title().to_string(),
            window: Arc::new(Mutex::new(window)),
            state: SessionState::Running,
            last_error: None,
            opened_at: Instant::now(),
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn descriptor_id(&self) -> &str {
        &self.descriptor_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn last_error(&self) -> Option<&FaultRecord> {
        self.last_error.as_ref()
    }

    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id,
            descriptor_id: self.descriptor_id.clone(),
            title: self.title.clone(),
            state: self.state,
            opened_at: self.opened_at,
            last_error: self.last_error.clone(),
        }
    }
}

impl fmt::Debug for LaunchSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaunchSession")
            .field("session_id", &self.session_id)
            .field("descriptor_id", &self.descriptor_id)
            .field("state", &self.state)
            .field("last_error", &self.last_error)
            .finish()
    }
}

/// Read-only view of a session for UI code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub descriptor_id: String,
    pub title: String,
    pub state: SessionState,
    pub opened_at: Instant,
    pub last_error: Option<FaultRecord>,
}
