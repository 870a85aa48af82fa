//! # Service manager facade.
//!
//! [`ServiceManager`] is the process-entry surface. One binary, two roles:
//!
//! - **Managed instance** — launched by the OS service runtime. The manager
//!   changes into the registered binary's directory and hands the process
//!   to the [`Host`] control loop, which drives the dispatcher for the
//!   process lifetime.
//! - **Controller** — launched by an operator or installer. The first
//!   invocation argument is a verb from `{install, remove, start, stop,
//!   pause, continue}`; anything else is forwarded as launch arguments
//!   through the start path.
//!
//! Which role applies is probed exactly once per entry via
//! [`Host::in_service`] and cached as [`RunState`].
//!
//! ## Controller wait loop
//! `stop` / `pause` / `continue` send the control code, then poll the
//! unit's status every [`QUERY_POLL_INTERVAL`] until the target state is
//! reached or [`DEFAULT_WAIT_WINDOW`] elapses. A unit observed stopped
//! while a different target is awaited fails fast with
//! [`ControlError::UnexpectedStop`] instead of polling on.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::time::{self, Instant};

use crate::config::UnitConfig;
use crate::control::{Command, ControlDispatcher, HandlerRef, ServiceState, UnitStatus};
use crate::error::{ControlError, ServiceError};
use crate::registry::{Registry, RegistryError, UnitHandle};
use crate::service::core::ServiceCore;
use crate::service::handler::ServiceRef;
use crate::service::host::Host;
use crate::service::identity::ServiceIdentity;
use crate::service::workdir;

/// Interval between controller-side status polls.
pub const QUERY_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Default window a controller-side command waits for its target state.
pub const DEFAULT_WAIT_WINDOW: Duration = Duration::from_secs(10);

/// Whether the process was launched as a managed service instance.
///
/// Determined once at process entry; never changes afterward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    /// Ordinary process; invocation arguments are controller verbs.
    NotInService,
    /// Launched by the OS service runtime.
    InService,
}

/// Facade composing the control plane, the scheduler, and the external
/// registry/host collaborators.
pub struct ServiceManager {
    identity: ServiceIdentity,
    registry: Arc<dyn Registry>,
    host: Arc<dyn Host>,
    dispatcher: ControlDispatcher,
    run_state: OnceLock<RunState>,
}

impl ServiceManager {
    /// Creates a manager for the given unit over the platform
    /// collaborators.
    pub fn new(
        identity: ServiceIdentity,
        registry: Arc<dyn Registry>,
        host: Arc<dyn Host>,
    ) -> Arc<Self> {
        Arc::new(Self {
            identity,
            registry,
            host,
            dispatcher: ControlDispatcher::new(),
            run_state: OnceLock::new(),
        })
    }

    /// Registered unit name.
    pub fn name(&self) -> &str {
        self.identity.name()
    }

    /// Human-readable unit name.
    pub fn display_name(&self) -> &str {
        self.identity.display_name()
    }

    /// Unit description.
    pub fn description(&self) -> &str {
        self.identity.description()
    }

    /// The full identity triple.
    pub fn identity(&self) -> &ServiceIdentity {
        &self.identity
    }

    /// Role probed at the last [`ServiceManager::run`] entry, if any.
    pub fn run_state(&self) -> Option<RunState> {
        self.run_state.get().copied()
    }

    /// True when the process runs as a managed instance.
    pub fn is_in_service(&self) -> bool {
        matches!(self.run_state.get(), Some(RunState::InService))
    }

    pub(crate) fn dispatcher(&self) -> &ControlDispatcher {
        &self.dispatcher
    }

    /// Registers a control handler. The last registration for a command
    /// wins; the command's accept-flag is advertised immediately when the
    /// OS sink is open.
    pub fn register_control_handler(&self, command: Command, handler: HandlerRef) {
        tracing::debug!(service = self.name(), command = %command, "registering control handler");
        self.dispatcher.register(command, handler);
    }

    /// Reports the unit as running. Called by the service handler once its
    /// own initialization is complete.
    pub fn started(&self) {
        self.dispatcher.broadcaster().send_state(ServiceState::Running);
    }

    /// Process entry using the process's own invocation arguments.
    pub async fn run(self: &Arc<Self>, handler: ServiceRef) -> Result<(), ServiceError> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        self.run_with(handler, args).await
    }

    /// Process entry with explicit invocation arguments (everything after
    /// the program name).
    ///
    /// As a managed instance this blocks for the process lifetime; as a
    /// controller it performs one verb and returns. Errors are wrapped
    /// naming the service and, for recognized verbs, the verb.
    pub async fn run_with(
        self: &Arc<Self>,
        handler: ServiceRef,
        args: Vec<String>,
    ) -> Result<(), ServiceError> {
        let in_service = self
            .host
            .in_service()
            .map_err(|source| self.invocation_error(source))?;
        if in_service {
            let _ = self.run_state.set(RunState::InService);
            return self
                .serve(handler)
                .await
                .map_err(|source| self.invocation_error(source));
        }
        let _ = self.run_state.set(RunState::NotInService);

        let Some(first) = args.first() else {
            return self
                .start(&[])
                .await
                .map_err(|source| self.invocation_error(source.into()));
        };

        match first.to_ascii_lowercase().as_str() {
            "install" => self
                .install(UnitConfig::for_identity(&self.identity))
                .await
                .map_err(|source| self.command_error("install", source.into())),
            "remove" => self
                .uninstall()
                .await
                .map_err(|source| self.command_error("remove", source.into())),
            "start" => self
                .start(&[])
                .await
                .map_err(|source| self.command_error("start", source.into())),
            "stop" => self
                .stop()
                .await
                .map_err(|source| self.command_error("stop", source.into())),
            "pause" => self
                .pause()
                .await
                .map_err(|source| self.command_error("pause", source.into())),
            "continue" => self
                .resume()
                .await
                .map_err(|source| self.command_error("continue", source.into())),
            // Not a verb: forward the whole tail as launch arguments.
            _ => self
                .start(&args)
                .await
                .map_err(|source| self.invocation_error(source.into())),
        }
    }

    /// Registers the unit. The binary path defaults to the current
    /// executable; the opaque platform fields pass through unchanged.
    pub async fn install(&self, config: UnitConfig) -> Result<(), RegistryError> {
        let binary = match &config.binary_path {
            Some(path) => path.clone(),
            None => std::env::current_exe().map_err(|e| RegistryError::Os {
                op: "current_exe",
                reason: e.to_string(),
            })?,
        };
        tracing::debug!(service = self.name(), binary = %binary.display(), "installing unit");
        self.registry.install(&self.identity, &binary, &config).await
    }

    /// Deletes the unit's registration.
    pub async fn uninstall(&self) -> Result<(), RegistryError> {
        tracing::debug!(service = self.name(), "removing unit");
        let mut unit = self.registry.open(self.name()).await?;
        unit.delete().await
    }

    /// Requests launch of the unit. Start carries no target-state wait; the
    /// OS reports launch failures directly.
    pub async fn start(&self, args: &[String]) -> Result<(), RegistryError> {
        let mut unit = self.registry.open(self.name()).await?;
        unit.start(args).await
    }

    /// Stops the unit and waits for `Stopped` within the default window.
    pub async fn stop(&self) -> Result<(), ControlError> {
        self.control_to(Command::Stop, ServiceState::Stopped, DEFAULT_WAIT_WINDOW)
            .await
    }

    /// Pauses the unit and waits for `Paused` within the default window.
    pub async fn pause(&self) -> Result<(), ControlError> {
        self.control_to(Command::Pause, ServiceState::Paused, DEFAULT_WAIT_WINDOW)
            .await
    }

    /// Resumes a paused unit and waits for `Running` within the default
    /// window.
    pub async fn resume(&self) -> Result<(), ControlError> {
        self.control_to(Command::Continue, ServiceState::Running, DEFAULT_WAIT_WINDOW)
            .await
    }

    /// Sends `command` and polls until the unit reports `target`.
    ///
    /// Polls every [`QUERY_POLL_INTERVAL`]. Fails with
    /// [`ControlError::Timeout`] when `window` elapses first, and with
    /// [`ControlError::UnexpectedStop`] when the unit reports `Stopped`
    /// while a different target is awaited.
    pub async fn control_to(
        &self,
        command: Command,
        target: ServiceState,
        window: Duration,
    ) -> Result<(), ControlError> {
        let mut unit = self.registry.open(self.name()).await?;
        let mut status = unit.control(command).await?;
        let deadline = Instant::now() + window;

        while status.state != target {
            if status.state == ServiceState::Stopped && target != ServiceState::Stopped {
                return Err(ControlError::UnexpectedStop { target });
            }
            if Instant::now() >= deadline {
                return Err(ControlError::Timeout { target, window });
            }
            time::sleep(QUERY_POLL_INTERVAL).await;
            status = unit.query().await?;
        }

        tracing::debug!(service = self.name(), command = %command, state = %target, "unit reached target state");
        Ok(())
    }

    /// Reads the unit's current status.
    pub async fn query(&self) -> Result<UnitStatus, RegistryError> {
        let mut unit = self.registry.open(self.name()).await?;
        unit.query().await
    }

    /// Runs as a managed instance: change into the registered binary's
    /// directory, then hand the process to the OS control loop. Residual
    /// launch arguments reach the handler through the host runtime, not the
    /// invocation line.
    async fn serve(self: &Arc<Self>, handler: ServiceRef) -> Result<(), ServiceError> {
        self.enter_unit_workdir().await?;
        let core = ServiceCore::new(self.clone(), handler);
        self.host.run(self.name(), core).await
    }

    async fn enter_unit_workdir(&self) -> Result<(), ServiceError> {
        let mut unit = self.registry.open(self.name()).await?;
        let binary = unit.binary_path().await?;
        let dir = workdir::derive_workdir(&binary);
        std::env::set_current_dir(&dir)
            .map_err(|source| ServiceError::Workdir { path: dir, source })
    }

    fn command_error(&self, command: &'static str, source: ServiceError) -> ServiceError {
        ServiceError::Command {
            service: self.name().to_string(),
            command,
            source: Box::new(source),
        }
    }

    fn invocation_error(&self, source: ServiceError) -> ServiceError {
        ServiceError::Invocation {
            service: self.name().to_string(),
            source: Box::new(source),
        }
    }
}
