//! # Control dispatcher: the per-command state machine.
//!
//! [`ControlDispatcher`] owns the handler table and turns each incoming
//! [`ControlRequest`] into the status choreography the OS expects.
//!
//! ## Dispatch state machine
//! ```text
//! request ──► Interrogate?  ──► echo OS status twice, 100 ms apart, done
//!         ──► no handler?   ──► ignored (commands may be probed speculatively)
//!         ──► Pause         ──► PausePending(narrowed) → handler → Paused(persistent)
//!         ──► Continue      ──► ContinuePending(narrowed) → handler → Running(persistent)
//!         ──► Stop family   ──► StopPending(narrowed) → handler     (no settled status;
//!                                final Stopped comes from the execution wrapper
//!                                once the task tree has unwound)
//!         ──► anything else ──► handler only; it alone decides what to report
//! ```
//!
//! ## Rules
//! - The narrowed mask excludes the in-flight command itself and, for Pause
//!   or Continue, both members of the pause/continue family (refusing races
//!   during the transition) while keeping every other currently accepted
//!   command.
//! - The narrowing is transient: the settled emission restores the
//!   persistent mask, and a registration mid-flight re-broadcasts the full
//!   set on its own.
//! - Requests are consumed one at a time from a single listener; handlers
//!   never run concurrently with each other.
//! - Handlers are looked up under the table lock but awaited outside it, so
//!   a handler may itself register handlers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::time;

use crate::control::broadcaster::StatusBroadcaster;
use crate::control::command::Command;
use crate::control::handler::HandlerRef;
use crate::control::status::{AcceptMask, ControlRequest, ServiceState, UnitStatus};
use crate::service::ServiceManager;

/// Pause between the two interrogate echo emissions. The OS's
/// interrogation protocol can miss a single emission; two spaced emissions
/// close that race.
pub(crate) const INTERROGATE_ECHO_GAP: Duration = Duration::from_millis(100);

/// The pending/settled status bracket computed for one command.
struct Bracket {
    pending: Option<UnitStatus>,
    settled: Option<UnitStatus>,
}

/// Handler table plus dispatch routine for incoming control requests.
///
/// Cheap to clone; all clones share the table and the broadcaster.
#[derive(Clone)]
pub struct ControlDispatcher {
    broadcaster: StatusBroadcaster,
    handlers: Arc<Mutex<HashMap<Command, HandlerRef>>>,
}

impl ControlDispatcher {
    /// Creates a dispatcher with an empty handler table and a fresh
    /// [`StatusBroadcaster`].
    pub fn new() -> Self {
        Self {
            broadcaster: StatusBroadcaster::new(),
            handlers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The broadcaster carrying this dispatcher's reported status.
    pub fn broadcaster(&self) -> &StatusBroadcaster {
        &self.broadcaster
    }

    /// Registers `handler` for `command`. The last registration for a
    /// command wins. The command's accept-flag is merged into the
    /// persistent mask and, when the OS sink is open, re-broadcast
    /// immediately.
    pub fn register(&self, command: Command, handler: HandlerRef) {
        self.table().insert(command, handler);
        self.broadcaster.merge_accepts(command.accepts());
    }

    /// True when a handler is registered for `command`.
    pub fn has_handler(&self, command: Command) -> bool {
        self.table().contains_key(&command)
    }

    /// Dispatches one control request: interrogate echo, silent ignore, or
    /// the pending → handler → settled bracket.
    pub async fn dispatch(&self, manager: Arc<ServiceManager>, request: ControlRequest) {
        if request.command == Command::Interrogate {
            self.broadcaster.send_status(request.status);
            time::sleep(INTERROGATE_ECHO_GAP).await;
            self.broadcaster.send_status(request.status);
            return;
        }

        let handler = self.table().get(&request.command).cloned();
        let Some(handler) = handler else {
            tracing::trace!(command = %request.command, "no handler registered; ignoring");
            return;
        };

        let bracket = self.bracket(request.command);
        if let Some(pending) = bracket.pending {
            self.broadcaster.send_status(pending);
        }
        handler.handle(manager, request).await;
        if let Some(settled) = bracket.settled {
            self.broadcaster.send_status(settled);
        }
    }

    /// The transient mask advertised while `command` is mid-flight: every
    /// currently accepted command except `command` itself and, for Pause or
    /// Continue, the whole pause/continue family.
    fn narrowed_accepts(&self, command: Command) -> AcceptMask {
        let table = self.table();
        let mut mask = AcceptMask::NONE;
        for registered in table.keys() {
            if registered.is_pause_or_continue() && command.is_pause_or_continue() {
                continue;
            }
            if *registered == command {
                continue;
            }
            mask |= registered.accepts();
        }
        mask
    }

    fn bracket(&self, command: Command) -> Bracket {
        match command {
            Command::Pause => Bracket {
                pending: Some(UnitStatus::new(
                    ServiceState::PausePending,
                    self.narrowed_accepts(command),
                )),
                settled: Some(UnitStatus::new(ServiceState::Paused, self.broadcaster.accepts())),
            },
            Command::Continue => Bracket {
                pending: Some(UnitStatus::new(
                    ServiceState::ContinuePending,
                    self.narrowed_accepts(command),
                )),
                settled: Some(UnitStatus::new(ServiceState::Running, self.broadcaster.accepts())),
            },
            Command::Stop | Command::Shutdown | Command::PreShutdown => Bracket {
                pending: Some(UnitStatus::new(
                    ServiceState::StopPending,
                    self.narrowed_accepts(command),
                )),
                settled: None,
            },
            _ => Bracket {
                pending: None,
                settled: None,
            },
        }
    }

    fn table(&self) -> MutexGuard<'_, HashMap<Command, HandlerRef>> {
        match self.handlers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for ControlDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
