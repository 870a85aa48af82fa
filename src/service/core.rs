//! # In-service execution wrapper.
//!
//! [`ServiceCore`] is what the [`Host`](crate::Host) adapter drives once
//! the OS attaches the control loop. It wires the status sink, the fault
//! conduit, the control-request listener, and the main task together, and
//! owns the one hard ordering guarantee of the whole crate: **the final
//! stopped status is emitted only after the entire task tree has unwound.**
//!
//! ## Execution sequence
//! ```text
//! execute(args, requests, status):
//!   1. attach sink, emit StartPending
//!   2. fault channel + collector task
//!   3. root scheduler node
//!   4. go_detached(listener): requests ─► dispatcher, strictly in order
//!   5. install fail-fast Stop handler if none registered
//!   6. go(main): handler.run(manager, node, args)
//!   7. root.wait()            ← whole tree settles here
//!   8. emit { Stopped, NONE }, detach sink
//! ```
//!
//! ## Rules
//! - The listener is detached: it lives for the whole process and never
//!   gates the join in step 7.
//! - Silently ignoring a stop request is unacceptable; the fail-fast
//!   default raises a fault instead, and a later user registration for
//!   Stop replaces it.
//! - A handler that never returns blocks step 7 forever; that is the
//!   contract, and handlers are expected to honor stop requests promptly.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::control::{Command, ControlFn, ControlRequest, ServiceState, UnitStatus};
use crate::scheduler::{FaultChannel, Scheduler};
use crate::service::handler::ServiceRef;
use crate::service::ServiceManager;

/// One attached in-service execution: the manager plus the unit's business
/// logic, ready to be driven by the OS control loop.
pub struct ServiceCore {
    manager: Arc<ServiceManager>,
    handler: ServiceRef,
}

impl ServiceCore {
    pub(crate) fn new(manager: Arc<ServiceManager>, handler: ServiceRef) -> Arc<Self> {
        Arc::new(Self { manager, handler })
    }

    /// Runs the unit to completion.
    ///
    /// `requests` delivers control requests in OS order; `status` is the
    /// sink the OS observes. Returns once the final stopped status has been
    /// emitted.
    pub async fn execute(
        self: Arc<Self>,
        args: Vec<String>,
        mut requests: mpsc::Receiver<ControlRequest>,
        status: mpsc::UnboundedSender<UnitStatus>,
    ) {
        let dispatcher = self.manager.dispatcher().clone();
        let broadcaster = dispatcher.broadcaster().clone();

        broadcaster.attach_sink(status);
        broadcaster.send_state(ServiceState::StartPending);

        let (faults, fault_rx) = FaultChannel::bounded();
        let _collector = FaultChannel::spawn_collector(fault_rx);

        let root = Scheduler::root(faults);

        {
            let dispatcher = dispatcher.clone();
            let manager = self.manager.clone();
            root.go_detached(move |_node| async move {
                while let Some(request) = requests.recv().await {
                    dispatcher.dispatch(manager.clone(), request).await;
                }
            });
        }

        if !dispatcher.has_handler(Command::Stop) {
            let name = self.manager.name().to_string();
            dispatcher.register(
                Command::Stop,
                ControlFn::arc(move |_manager, _request| {
                    let name = name.clone();
                    async move {
                        panic!("{name} service received stop signal but no handler was registered");
                    }
                }),
            );
        }

        {
            let manager = self.manager.clone();
            let handler = self.handler.clone();
            root.go(move |node| handler.run(manager, node, args));
        }

        root.wait().await;

        broadcaster.send_status(UnitStatus::stopped());
        broadcaster.detach_sink();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;
    use std::time::Duration;

    use tokio::sync::Notify;
    use tokio::time::timeout;

    use crate::control::AcceptMask;
    use crate::service::ServiceFn;
    use crate::testutil::test_manager;

    struct Harness {
        requests: mpsc::Sender<ControlRequest>,
        status: mpsc::UnboundedReceiver<UnitStatus>,
        run: tokio::task::JoinHandle<()>,
    }

    impl Harness {
        /// Drives `execute` directly with raw channels, the way a host
        /// adapter would.
        fn launch(manager: Arc<ServiceManager>, handler: ServiceRef, args: Vec<String>) -> Self {
            let (req_tx, req_rx) = mpsc::channel(8);
            let (status_tx, status_rx) = mpsc::unbounded_channel();
            let core = ServiceCore::new(manager, handler);
            let run = tokio::spawn(core.execute(args, req_rx, status_tx));
            Self {
                requests: req_tx,
                status: status_rx,
                run,
            }
        }

        async fn next_status(&mut self) -> UnitStatus {
            self.status.recv().await.expect("status sink closed unexpectedly")
        }

        async fn send(&self, command: Command) {
            let request = ControlRequest::new(
                command,
                UnitStatus::new(ServiceState::Running, AcceptMask::NONE),
            );
            self.requests.send(request).await.expect("request channel closed");
        }
    }

    fn status(state: ServiceState, accepts: AcceptMask) -> UnitStatus {
        UnitStatus::new(state, accepts)
    }

    #[tokio::test]
    async fn test_full_lifecycle_emission_order() {
        let manager = test_manager();
        let stop_gate = Arc::new(Notify::new());

        let gate = stop_gate.clone();
        let handler = ServiceFn::arc(move |manager: Arc<ServiceManager>, _node, _args| {
            let gate = gate.clone();
            async move {
                let signal = gate.clone();
                manager.register_control_handler(
                    Command::Stop,
                    ControlFn::arc(move |_m, _r| {
                        let signal = signal.clone();
                        async move {
                            signal.notify_one();
                        }
                    }),
                );
                manager.started();
                gate.notified().await;
            }
        });

        let mut harness = Harness::launch(manager, handler, Vec::new());

        // Startup: initial report, fail-fast Stop default, the user's own
        // Stop registration, then the started() transition.
        assert_eq!(
            harness.next_status().await,
            status(ServiceState::StartPending, AcceptMask::NONE)
        );
        assert_eq!(
            harness.next_status().await,
            status(ServiceState::StartPending, AcceptMask::STOP)
        );
        assert_eq!(
            harness.next_status().await,
            status(ServiceState::StartPending, AcceptMask::STOP)
        );
        assert_eq!(
            harness.next_status().await,
            status(ServiceState::Running, AcceptMask::STOP)
        );

        harness.send(Command::Stop).await;

        assert_eq!(
            harness.next_status().await,
            status(ServiceState::StopPending, AcceptMask::NONE)
        );
        assert_eq!(harness.next_status().await, UnitStatus::stopped());

        harness.run.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_waits_for_spawned_children() {
        let manager = test_manager();
        let stop_gate = Arc::new(Notify::new());
        let child_gate = Arc::new(Notify::new());

        let stop = stop_gate.clone();
        let child = child_gate.clone();
        let handler = ServiceFn::arc(move |manager: Arc<ServiceManager>, node: Scheduler, _args| {
            let stop = stop.clone();
            let child = child.clone();
            async move {
                let signal = stop.clone();
                manager.register_control_handler(
                    Command::Stop,
                    ControlFn::arc(move |_m, _r| {
                        let signal = signal.clone();
                        async move {
                            signal.notify_one();
                        }
                    }),
                );
                manager.started();

                // Background work that outlives the main task.
                node.go(move |_n| async move {
                    child.notified().await;
                });

                stop.notified().await;
            }
        });

        let mut harness = Harness::launch(manager, handler, Vec::new());
        // Initial report, fail-fast default, user registration, started().
        for _ in 0..4 {
            harness.next_status().await;
        }

        harness.send(Command::Stop).await;
        assert_eq!(
            harness.next_status().await,
            status(ServiceState::StopPending, AcceptMask::NONE)
        );

        // Main task has returned, but the child still holds the tree open:
        // no stopped report may appear yet.
        let early = timeout(Duration::from_secs(5), harness.status.recv()).await;
        assert!(early.is_err(), "stopped was reported before the task tree unwound");

        child_gate.notify_one();
        assert_eq!(harness.next_status().await, UnitStatus::stopped());
        harness.run.await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_stop_handler_faults_without_killing_the_unit() {
        let manager = test_manager();
        let main_gate = Arc::new(Notify::new());

        let gate = main_gate.clone();
        let handler = ServiceFn::arc(move |manager: Arc<ServiceManager>, _node, _args| {
            let gate = gate.clone();
            async move {
                manager.started();
                gate.notified().await;
            }
        });

        let mut harness = Harness::launch(manager, handler, Vec::new());

        assert_eq!(
            harness.next_status().await,
            status(ServiceState::StartPending, AcceptMask::NONE)
        );
        // The fail-fast default was installed and advertised.
        assert_eq!(
            harness.next_status().await,
            status(ServiceState::StartPending, AcceptMask::STOP)
        );
        assert_eq!(
            harness.next_status().await,
            status(ServiceState::Running, AcceptMask::STOP)
        );

        harness.send(Command::Stop).await;
        assert_eq!(
            harness.next_status().await,
            status(ServiceState::StopPending, AcceptMask::NONE)
        );

        // The fail-fast handler panics; the fault retires the listener,
        // dropping its end of the request channel.
        harness.requests.closed().await;

        // The faulting listener is detached: the unit still drains and
        // reports stopped once the main task returns.
        main_gate.notify_one();
        assert_eq!(harness.next_status().await, UnitStatus::stopped());
        harness.run.await.unwrap();
    }

    #[tokio::test]
    async fn test_launch_arguments_reach_the_handler() {
        let manager = test_manager();
        let seen: Arc<Mutex<Option<Vec<String>>>> = Arc::new(Mutex::new(None));

        let record = seen.clone();
        let handler = ServiceFn::arc(move |manager: Arc<ServiceManager>, _node, args| {
            let record = record.clone();
            async move {
                *record.lock().unwrap() = Some(args);
                manager.started();
            }
        });

        let args = vec!["--mode".to_string(), "demo".to_string()];
        let mut harness = Harness::launch(manager, handler, args.clone());

        while harness.next_status().await != UnitStatus::stopped() {}
        harness.run.await.unwrap();

        assert_eq!(seen.lock().unwrap().as_deref(), Some(args.as_slice()));
    }
}
