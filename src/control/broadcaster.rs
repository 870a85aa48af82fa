//! # Status broadcaster: the single source of reported truth.
//!
//! [`StatusBroadcaster`] owns the last state reported to the OS and the
//! persistent accept mask, and serializes every outgoing emission through
//! one sink. Any component that wants the OS to see a state change goes
//! through [`StatusBroadcaster::send_state`]; nothing else mutates the
//! reported state.
//!
//! ## Rules
//! - The sink exists only while the OS control loop is attached; emissions
//!   without a sink are dropped silently.
//! - [`StatusBroadcaster::send_accepts`] is transient: it narrows what is
//!   advertised while a command is mid-flight without persisting the mask.
//! - Handler registration merges accept-flags via
//!   [`StatusBroadcaster::merge_accepts`], which re-broadcasts immediately
//!   so the OS's live view never lags the handler table.
//! - All mutation is funneled through one mutex; emissions observe a single
//!   total order.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;

use crate::control::status::{AcceptMask, ServiceState, UnitStatus};

struct Inner {
    state: ServiceState,
    accepts: AcceptMask,
    sink: Option<mpsc::UnboundedSender<UnitStatus>>,
}

/// Owner of the reported state, the persistent accept mask, and the
/// outgoing status sink.
///
/// Cheap to clone; all clones share the same state.
#[derive(Clone)]
pub struct StatusBroadcaster {
    inner: Arc<Mutex<Inner>>,
}

impl StatusBroadcaster {
    /// Creates a broadcaster with no sink, an empty accept mask, and
    /// `StartPending` as the initial state.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: ServiceState::StartPending,
                accepts: AcceptMask::NONE,
                sink: None,
            })),
        }
    }

    /// Attaches the outgoing sink for the lifetime of the OS control loop.
    pub(crate) fn attach_sink(&self, sink: mpsc::UnboundedSender<UnitStatus>) {
        self.lock().sink = Some(sink);
    }

    /// Detaches the sink once the control loop has ended.
    pub(crate) fn detach_sink(&self) {
        self.lock().sink = None;
    }

    /// Last state reported to the OS.
    pub fn state(&self) -> ServiceState {
        self.lock().state
    }

    /// The persistent accept mask.
    pub fn accepts(&self) -> AcceptMask {
        self.lock().accepts
    }

    /// Stores `state` as the reported state and emits it with the
    /// persistent accept mask. Passing `None` re-emits the last stored
    /// state, refreshing the advertised mask without a transition.
    pub fn send_state(&self, state: impl Into<Option<ServiceState>>) {
        let mut inner = self.lock();
        if let Some(state) = state.into() {
            inner.state = state;
        }
        let status = UnitStatus::new(inner.state, inner.accepts);
        Self::emit(&inner, status);
    }

    /// Emits the current state with `mask`, without persisting `mask`.
    pub fn send_accepts(&self, mask: AcceptMask) {
        let inner = self.lock();
        let status = UnitStatus::new(inner.state, mask);
        Self::emit(&inner, status);
    }

    /// Emits a raw status value unchanged. Dropped when no sink is
    /// attached.
    pub fn send_status(&self, status: UnitStatus) {
        let inner = self.lock();
        Self::emit(&inner, status);
    }

    /// ORs `mask` into the persistent accept set and re-broadcasts the
    /// current state with the updated set.
    pub(crate) fn merge_accepts(&self, mask: AcceptMask) {
        let mut inner = self.lock();
        inner.accepts |= mask;
        let status = UnitStatus::new(inner.state, inner.accepts);
        Self::emit(&inner, status);
    }

    fn emit(inner: &Inner, status: UnitStatus) {
        if let Some(sink) = &inner.sink {
            let _ = sink.send(status);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for StatusBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
