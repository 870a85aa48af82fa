//! # unitvisor
//!
//! **unitvisor** lets a long-running process register itself as a managed,
//! controllable unit with the host OS's service-control facility, and lets
//! an external controller install, remove, start, stop, pause, resume, and
//! query that unit.
//!
//! Two subsystems carry the weight:
//!
//! 1. the **control state machine** — receives asynchronous control
//!    requests from the OS, advertises a per-command accept mask, brackets
//!    each transition with the pending/settled status pair the OS expects,
//!    and dispatches to registered handlers while the reported status stays
//!    consistent with what the OS last saw;
//! 2. the **scheduler** — a structured-concurrency tree for the service's
//!    business logic; the unit reports stopped only after the whole tree
//!    has unwound, and a panic anywhere in the tree becomes an ordered
//!    fault record instead of a crashed process.
//!
//! ## Architecture
//! ```text
//!            OS service runtime (behind the Host seam)
//!                 │ ControlRequest             ▲ UnitStatus
//!                 ▼                            │
//!        listener (detached task) ──► ControlDispatcher ──► StatusBroadcaster
//!                                        │ handler table         ▲
//!                                        ▼                       │
//!                                 ControlHandler(s) ─────────────┘ started()/send_state
//!
//!        ServiceHandler (main task)
//!            │ go / go_detached
//!            ▼
//!        Scheduler tree ──► FaultChannel ──► collector ──► tracing
//!            │
//!            └── root.wait() ──► final { Stopped, NONE }
//!
//!        Controller process ──► ServiceManager ──► Registry seam ──► OS
//! ```
//!
//! ## Surface
//! | Area            | Description                                              | Key types / traits                         |
//! |-----------------|----------------------------------------------------------|--------------------------------------------|
//! | **Facade**      | Process entry, verbs, controller-side waits.             | [`ServiceManager`], [`RunState`]           |
//! | **Control**     | Command vocabulary, accept mask, status choreography.    | [`Command`], [`AcceptMask`], [`ControlDispatcher`] |
//! | **Handlers**    | Business logic and per-command reactions.                | [`ServiceHandler`], [`ControlHandler`]     |
//! | **Scheduling**  | Strict-join task tree with detached auxiliaries.         | [`Scheduler`], [`WaitGroup`]               |
//! | **Faults**      | Panic capture, bounded conduit, single collector.        | [`FaultChannel`], [`FaultRecord`]          |
//! | **Platform**    | External registry/runtime seams and opaque config.       | [`Registry`], [`Host`], [`UnitConfig`]     |
//! | **Errors**      | Typed registry, protocol, and facade errors.             | [`RegistryError`], [`ControlError`], [`ServiceError`] |
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use unitvisor::{
//!     Command, ControlFn, Host, Registry, Scheduler, ServiceFn, ServiceIdentity, ServiceManager,
//! };
//!
//! async fn entry(registry: Arc<dyn Registry>, host: Arc<dyn Host>) {
//!     let identity = ServiceIdentity::new("demo", "Demo Service", "Serves demos");
//!     let manager = ServiceManager::new(identity, registry, host);
//!
//!     let logic = ServiceFn::arc(|manager: Arc<ServiceManager>, scheduler: Scheduler, _args| async move {
//!         let (stop_tx, mut stop_rx) = tokio::sync::mpsc::channel::<()>(1);
//!         manager.register_control_handler(
//!             Command::Stop,
//!             ControlFn::arc(move |_manager, _request| {
//!                 let stop_tx = stop_tx.clone();
//!                 async move {
//!                     let _ = stop_tx.send(()).await;
//!                 }
//!             }),
//!         );
//!         manager.started();
//!
//!         scheduler.go(|_node| async {
//!             // background work; gates the stopped report until done
//!         });
//!
//!         stop_rx.recv().await;
//!     });
//!
//!     if let Err(err) = manager.run(logic).await {
//!         eprintln!("{err}");
//!     }
//! }
//! ```

mod config;
mod control;
mod error;
mod registry;
mod scheduler;
mod service;

#[cfg(test)]
mod testutil;

// ---- Public re-exports ----

pub use config::{StartKind, UnitConfig};
pub use control::{
    AcceptMask, Command, ControlDispatcher, ControlFn, ControlHandler, ControlRequest, HandlerRef,
    ServiceState, StatusBroadcaster, UnitStatus,
};
pub use error::{ControlError, ServiceError};
pub use registry::{Registry, RegistryError, UnitHandle};
pub use scheduler::{FaultChannel, FaultRecord, Scheduler, WaitGroup, FAULT_BACKLOG};
pub use service::{
    Host, RunState, ServiceCore, ServiceFn, ServiceHandler, ServiceIdentity, ServiceManager,
    ServiceRef, DEFAULT_WAIT_WINDOW, QUERY_POLL_INTERVAL,
};
