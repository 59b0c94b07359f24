use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, Sender};
use orlib_module_db::{ModuleDescriptor, ModuleRegistry};
use orlib_module_sdk::ProblemWindow;
use parking_lot::{Condvar, Mutex};
use tracing::{debug, info, warn};

use crate::error::LaunchError;
use crate::fault::{FaultBoundary, FaultRecord, FaultStage};
use crate::resolver::EntryPointResolver;
use crate::session::{LaunchSession, SessionId, SessionSnapshot, SessionState};
use crate::window::{CloseSignal, WindowHandle};

/// Tunables for [`LaunchController`].
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerOptions {
    /// How long `close` waits for a window to report that its close
    /// finished before dropping it anyway.
    pub close_timeout: Duration,
    /// Number of ended sessions kept for [`LaunchController::recent`].
    pub history_len: usize,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            close_timeout: Duration::from_secs(2),
            history_len: 16,
        }
    }
}

/// What a successful [`LaunchController::launch`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// A new window was constructed and shown.
    Opened(SessionId),
    /// A window for the problem already existed and was brought forward.
    Focused(SessionId),
}

impl LaunchOutcome {
    pub fn session(&self) -> SessionId {
        match self {
            LaunchOutcome::Opened(session) | LaunchOutcome::Focused(session) => *session,
        }
    }
}

const CLOSE_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Outcome of a load in progress, shared with launches that arrive while it
/// runs.
#[derive(Default)]
struct InFlight {
    outcome: Mutex<Option<Result<SessionId, LaunchError>>>,
    done: Condvar,
}

impl InFlight {
    fn wait(&self) -> Result<SessionId, LaunchError> {
        let mut outcome = self.outcome.lock();
        loop {
            if let Some(outcome) = outcome.as_ref() {
                return outcome.clone();
            }
            self.done.wait(&mut outcome);
        }
    }

    fn finish(&self, outcome: Result<SessionId, LaunchError>) {
        *self.outcome.lock() = Some(outcome);
        self.done.notify_all();
    }
}

#[derive(Default)]
struct Slot {
    loading: Option<Arc<InFlight>>,
    sessions: Vec<LaunchSession>,
}

impl Slot {
    fn is_idle(&self) -> bool {
        self.loading.is_none() && self.sessions.is_empty()
    }
}

/// Clears the loading mark for a problem even if resolution unwinds.
struct LoadingGuard<'a> {
    controller: &'a LaunchController,
    id: &'a str,
    in_flight: Arc<InFlight>,
    armed: bool,
}

impl LoadingGuard<'_> {
    fn complete(mut self, window: Result<WindowHandle, LaunchError>) -> Result<SessionId, LaunchError> {
        self.armed = false;
        let outcome = self.controller.settle(self.id, window);
        self.in_flight.finish(outcome.clone());
        outcome
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let fault = FaultRecord::new(self.id, FaultStage::Construction, "launch aborted");
            let outcome = self.controller.settle(self.id, Err(fault.into()));
            self.in_flight.finish(outcome);
        }
    }
}

/// Owns every open problem window and the rules for opening and closing
/// them.
///
/// The session map lock is never held while hosted code runs, and it is
/// never taken while a window lock is held.
pub struct LaunchController {
    registry: Arc<ModuleRegistry>,
    resolver: EntryPointResolver,
    boundary: FaultBoundary,
    options: ControllerOptions,
    slots: Mutex<HashMap<String, Slot>>,
    next_session: AtomicU64,
    history: Mutex<VecDeque<SessionSnapshot>>,
    fault_tx: Sender<FaultRecord>,
    fault_rx: Receiver<FaultRecord>,
}

impl LaunchController {
    pub fn new(registry: Arc<ModuleRegistry>, resolver: EntryPointResolver) -> Self {
        let (fault_tx, fault_rx) = unbounded();
        Self {
            registry,
            resolver,
            boundary: FaultBoundary::new(),
            options: ControllerOptions::default(),
            slots: Mutex::new(HashMap::new()),
            next_session: AtomicU64::new(0),
            history: Mutex::new(VecDeque::new()),
            fault_tx,
            fault_rx,
        }
    }

    pub fn with_options(mut self, options: ControllerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn resolver(&self) -> &EntryPointResolver {
        &self.resolver
    }

    /// Every fault that crosses the boundary, construction and runtime alike.
    /// Meant for a single consumer such as the dashboard's notification area.
    pub fn faults(&self) -> Receiver<FaultRecord> {
        self.fault_rx.clone()
    }

    /// Open the window for `id`, or focus it if it is already open.
    ///
    /// A launch that arrives while the same problem is loading waits for
    /// that load and shares its result instead of starting a second one.
    pub fn launch(&self, id: &str) -> Result<LaunchOutcome, LaunchError> {
        let descriptor = self.registry.get(id).map_err(|_| LaunchError::UnknownProblem {
            id: id.to_string(),
        })?;
        if !descriptor.is_selectable() {
            return Err(LaunchError::NotLaunchable {
                id: id.to_string(),
                status: descriptor.status,
            });
        }

        loop {
            let mut slots = self.slots.lock();
            let slot = slots.entry(id.to_string()).or_default();

            if let Some(in_flight) = slot.loading.clone() {
                drop(slots);
                debug!(problem = %id, "waiting for launch already in progress");
                let outcome = in_flight.wait();
                if descriptor.allow_multiple {
                    continue;
                }
                match outcome {
                    Ok(session) => match self.focus_session(id, session) {
                        Some(focused) => return focused,
                        // Closed before we got to it; start over.
                        None => continue,
                    },
                    Err(err) => return Err(err),
                }
            }

            if !descriptor.allow_multiple {
                if let Some(session) = slot.sessions.first() {
                    let session_id = session.session_id;
                    let window = Arc::clone(&session.window);
                    drop(slots);
                    return self.focus(id, session_id, &window);
                }
            }

            let in_flight = Arc::new(InFlight::default());
            slot.loading = Some(Arc::clone(&in_flight));
            drop(slots);

            let guard = LoadingGuard {
                controller: self,
                id,
                in_flight,
                armed: true,
            };
            let window = self.open(descriptor);
            return guard.complete(window).map(LaunchOutcome::Opened);
        }
    }

    /// Close every window of `id`. Returns how many were closed; closing a
    /// problem with no windows does nothing.
    pub fn close(&self, id: &str) -> usize {
        let sessions = {
            let mut slots = self.slots.lock();
            match slots.get_mut(id) {
                Some(slot) => {
                    let sessions = std::mem::take(&mut slot.sessions);
                    if slot.is_idle() {
                        slots.remove(id);
                    }
                    sessions
                }
                None => Vec::new(),
            }
        };
        let closed = sessions.len();
        for session in sessions {
            self.finish_close(session);
        }
        closed
    }

    /// Close one window. Returns `false` if the session is not open.
    pub fn close_session(&self, session: SessionId) -> bool {
        let taken = {
            let mut slots = self.slots.lock();
            let mut taken = None;
            for slot in slots.values_mut() {
                if let Some(index) = slot.sessions.iter().position(|s| s.session_id == session) {
                    taken = Some(slot.sessions.remove(index));
                    break;
                }
            }
            slots.retain(|_, slot| !slot.is_idle());
            taken
        };
        match taken {
            Some(session) => {
                self.finish_close(session);
                true
            }
            None => false,
        }
    }

    /// Close every open window, for shutdown.
    pub fn close_all(&self) -> usize {
        let ids: Vec<String> = self.slots.lock().keys().cloned().collect();
        ids.iter().map(|id| self.close(id)).sum()
    }

    /// Tear down the session named by `fault` (or every session of `id` if
    /// the fault names none) and publish the fault, followed by any fault
    /// raised while closing the window.
    pub fn on_window_fault(&self, id: &str, fault: FaultRecord) {
        let faulted = {
            let mut slots = self.slots.lock();
            let mut faulted = Vec::new();
            if let Some(slot) = slots.get_mut(id) {
                let sessions = std::mem::take(&mut slot.sessions);
                let (hit, kept): (Vec<_>, Vec<_>) = sessions
                    .into_iter()
                    .partition(|s| fault.session.map_or(true, |target| s.session_id == target));
                slot.sessions = kept;
                faulted = hit;
                if slot.is_idle() {
                    slots.remove(id);
                }
            }
            faulted
        };

        let mut teardown = Vec::new();
        for mut session in faulted {
            warn!(problem = %id, session = %session.session_id, "closing faulted window");
            if let Err(second) = self.dispose(&session) {
                teardown.push(second);
            }
            session.state = SessionState::Faulted;
            session.last_error = Some(fault.clone());
            self.remember(&session);
        }
        self.publish(fault);
        for second in teardown {
            self.publish(second);
        }
    }

    /// Run `f` against a running window inside the fault boundary. A fault
    /// tears the session down. Returns `None` if the session is not open.
    pub fn dispatch<R>(
        &self,
        session: SessionId,
        f: impl FnOnce(&mut dyn ProblemWindow) -> R,
    ) -> Option<Result<R, FaultRecord>> {
        let (id, window) = self.find_session(session)?;
        let outcome = {
            let mut handle = window.lock();
            let window = handle.window_mut()?;
            self.boundary.run(&id, session, || f(window))
        };
        if let Err(fault) = &outcome {
            self.on_window_fault(&id, fault.clone());
        }
        Some(outcome)
    }

    /// `Running` while a window is open, `Loading` while the first one is
    /// being constructed, `None` when the problem has no session.
    pub fn state(&self, id: &str) -> Option<SessionState> {
        let slots = self.slots.lock();
        let slot = slots.get(id)?;
        if !slot.sessions.is_empty() {
            Some(SessionState::Running)
        } else if slot.loading.is_some() {
            Some(SessionState::Loading)
        } else {
            None
        }
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.state(id) == Some(SessionState::Running)
    }

    pub fn session_count(&self, id: &str) -> usize {
        self.slots.lock().get(id).map_or(0, |slot| slot.sessions.len())
    }

    /// Open sessions ordered by when they were launched.
    pub fn sessions(&self) -> Vec<SessionSnapshot> {
        let mut sessions: Vec<_> = self
            .slots
            .lock()
            .values()
            .flat_map(|slot| slot.sessions.iter().map(LaunchSession::snapshot))
            .collect();
        sessions.sort_by_key(|session| session.session_id);
        sessions
    }

    /// Recently ended sessions, newest first.
    pub fn recent(&self) -> Vec<SessionSnapshot> {
        self.history.lock().iter().cloned().collect()
    }

    /// Signal that fires once `session` has been closed and dropped. `None`
    /// if the session is not open.
    pub fn close_signal(&self, session: SessionId) -> Option<CloseSignal> {
        let (_, window) = self.find_session(session)?;
        let signal = window.lock().close_signal();
        Some(signal)
    }

    pub(crate) fn live_windows(&self) -> Vec<(SessionId, Arc<Mutex<WindowHandle>>)> {
        let mut windows: Vec<_> = self
            .slots
            .lock()
            .values()
            .flat_map(|slot| {
                slot.sessions
                    .iter()
                    .map(|session| (session.session_id, Arc::clone(&session.window)))
            })
            .collect();
        windows.sort_by_key(|(session, _)| *session);
        windows
    }

    fn open(&self, descriptor: &ModuleDescriptor) -> Result<WindowHandle, LaunchError> {
        let entry = match self.resolver.resolve(descriptor) {
            Err(err) if err.is_retryable() => {
                info!(problem = %descriptor.id, "module file appeared, retrying resolution");
                self.resolver.evict(&descriptor.id);
                self.resolver.resolve(descriptor)?
            }
            resolved => resolved?,
        };

        let module = entry.module();
        let constructed = self.boundary.construct(&descriptor.id, || {
            let mut window = entry.instantiate();
            window.show();
            WindowHandle::new(window, module)
        });
        constructed.map_err(|fault| {
            self.publish(fault.clone());
            LaunchError::Fault(fault)
        })
    }

    fn settle(
        &self,
        id: &str,
        window: Result<WindowHandle, LaunchError>,
    ) -> Result<SessionId, LaunchError> {
        let mut slots = self.slots.lock();
        let slot = slots.entry(id.to_string()).or_default();
        slot.loading = None;
        let outcome = window.map(|window| {
            let session_id = SessionId::next(&self.next_session);
            slot.sessions
                .push(LaunchSession::running(session_id, id, window));
            session_id
        });
        if slot.is_idle() {
            slots.remove(id);
        }
        drop(slots);

        match &outcome {
            Ok(session) => info!(problem = %id, %session, "opened problem window"),
            Err(err) => warn!(problem = %id, "launch failed: {err}"),
        }
        outcome
    }

    fn focus(
        &self,
        id: &str,
        session: SessionId,
        window: &Mutex<WindowHandle>,
    ) -> Result<LaunchOutcome, LaunchError> {
        let outcome = {
            let mut handle = window.lock();
            handle.request_focus();
            match handle.window_mut() {
                Some(window) => self.boundary.run(id, session, || window.focus()),
                None => Ok(()),
            }
        };
        match outcome {
            Ok(()) => {
                debug!(problem = %id, %session, "focused existing window");
                Ok(LaunchOutcome::Focused(session))
            }
            Err(fault) => {
                self.on_window_fault(id, fault.clone());
                Err(LaunchError::Fault(fault))
            }
        }
    }

    fn focus_session(&self, id: &str, session: SessionId) -> Option<Result<LaunchOutcome, LaunchError>> {
        let (_, window) = self.find_session(session)?;
        Some(self.focus(id, session, &window))
    }

    fn find_session(&self, session: SessionId) -> Option<(String, Arc<Mutex<WindowHandle>>)> {
        let slots = self.slots.lock();
        slots.iter().find_map(|(id, slot)| {
            slot.sessions
                .iter()
                .find(|s| s.session_id == session)
                .map(|s| (id.clone(), Arc::clone(&s.window)))
        })
    }

    fn finish_close(&self, mut session: LaunchSession) {
        match self.dispose(&session) {
            Ok(()) => session.state = SessionState::Closed,
            Err(fault) => {
                session.state = SessionState::Faulted;
                session.last_error = Some(fault.clone());
                self.publish(fault);
            }
        }
        info!(problem = %session.descriptor_id, session = %session.session_id, "closed problem window");
        self.remember(&session);
    }

    /// Close the hosted window, wait up to the close timeout for it to
    /// finish, and drop it, all inside the boundary. The close signal fires
    /// once the window is gone, whatever the outcome.
    fn dispose(&self, session: &LaunchSession) -> Result<(), FaultRecord> {
        let timeout = self.options.close_timeout;
        let mut handle = session.window.lock();
        let outcome = match handle.take_window() {
            Some(mut window) => self
                .boundary
                .run(&session.descriptor_id, session.session_id, move || {
                    window.close();
                    let finished = wait_for_close(&*window, timeout);
                    drop(window);
                    finished
                }),
            None => Ok(true),
        };
        handle.mark_closed();
        drop(handle);

        if let Ok(false) = outcome {
            warn!(
                problem = %session.descriptor_id,
                session = %session.session_id,
                timeout_ms = timeout.as_millis() as u64,
                "window did not finish closing in time"
            );
        }
        outcome.map(|_| ())
    }

    fn remember(&self, session: &LaunchSession) {
        if self.options.history_len == 0 {
            return;
        }
        let mut history = self.history.lock();
        history.push_front(session.snapshot());
        history.truncate(self.options.history_len);
    }

    fn publish(&self, fault: FaultRecord) {
        // The controller holds a receiver, so the channel never disconnects.
        let _ = self.fault_tx.send(fault);
    }
}

/// Poll `close_finished` until it holds or `timeout` elapses.
fn wait_for_close(window: &dyn ProblemWindow, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if window.close_finished() {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        thread::sleep(CLOSE_POLL_INTERVAL.min(deadline - now));
    }
}

impl fmt::Debug for LaunchController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaunchController")
            .field("registry", &self.registry.len())
            .field("resolver", &self.resolver)
            .field("open", &self.sessions().len())
            .finish()
    }
}
