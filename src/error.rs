//! Error types used by the service facade and controller-side waits.
//!
//! This module defines two error enums:
//!
//! - [`ControlError`] — controller-side protocol failures: a unit that
//!   never reaches the requested state, or stops while something else was
//!   awaited.
//! - [`ServiceError`] — failures of the process-entry facade, including the
//!   formatted per-invocation wrappers naming the service and verb.
//!
//! Registry failures have their own type,
//! [`RegistryError`](crate::RegistryError), and convert into both enums.
//! Task faults are deliberately *not* errors: they are captured as
//! [`FaultRecord`](crate::FaultRecord)s and logged by the collector.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::control::ServiceState;
use crate::registry::RegistryError;

/// # Controller-side control-protocol errors.
///
/// Produced while driving a unit toward a target state. Never retried
/// automatically.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ControlError {
    /// The unit did not reach the target state within the wait window.
    #[error("timeout after {window:?} waiting for service to reach state <{target}>")]
    Timeout {
        /// The state that was awaited.
        target: ServiceState,
        /// The wait window that elapsed.
        window: Duration,
    },

    /// The unit stopped while a different target state was awaited.
    #[error("service stopped while waiting for state <{target}>")]
    UnexpectedStop {
        /// The state that was awaited.
        target: ServiceState,
    },

    /// The registry failed underneath the wait loop.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl ControlError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ControlError::Timeout { .. } => "control_timeout",
            ControlError::UnexpectedStop { .. } => "control_unexpected_stop",
            ControlError::Registry(_) => "control_registry",
        }
    }
}

/// # Errors produced by the service facade.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Could not determine whether the process runs as a managed service.
    #[error("failed to determine if the process runs as a managed service: {reason}")]
    Probe {
        /// Underlying failure description.
        reason: String,
    },

    /// The OS service runtime loop failed.
    #[error("{name} service failed: {reason}")]
    Runtime {
        /// Unit name.
        name: String,
        /// Underlying failure description.
        reason: String,
    },

    /// Could not change into the unit's working directory.
    #[error("could not change into service working directory {path:?}")]
    Workdir {
        /// The derived directory.
        path: PathBuf,
        /// The filesystem failure.
        #[source]
        source: std::io::Error,
    },

    /// A registry operation failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A controller-side control operation failed.
    #[error(transparent)]
    Control(#[from] ControlError),

    /// Failure of a recognized invocation verb, named after it.
    #[error("{service} - error with command <{command}>: {source}")]
    Command {
        /// Unit name.
        service: String,
        /// The failing verb.
        command: &'static str,
        /// The underlying failure.
        #[source]
        source: Box<ServiceError>,
    },

    /// Failure of an invocation that carried no recognized verb.
    #[error("{service} - error: {source}")]
    Invocation {
        /// Unit name.
        service: String,
        /// The underlying failure.
        #[source]
        source: Box<ServiceError>,
    },
}

impl ServiceError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ServiceError::Probe { .. } => "service_probe",
            ServiceError::Runtime { .. } => "service_runtime",
            ServiceError::Workdir { .. } => "service_workdir",
            ServiceError::Registry(_) => "service_registry",
            ServiceError::Control(_) => "service_control",
            ServiceError::Command { .. } => "service_command",
            ServiceError::Invocation { .. } => "service_invocation",
        }
    }
}
