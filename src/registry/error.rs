use thiserror::Error;

/// Errors surfaced by the service registry collaborator.
///
/// Produced by platform adapters implementing
/// [`Registry`](crate::Registry) / [`UnitHandle`](crate::UnitHandle).
/// Never retried automatically; retry policy belongs to the caller.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RegistryError {
    /// A unit with this name is already registered.
    #[error("service {name} already exists")]
    AlreadyExists {
        /// Unit name.
        name: String,
    },

    /// No unit with this name is registered.
    #[error("service {name} is not installed")]
    NotFound {
        /// Unit name.
        name: String,
    },

    /// The registry itself could not be reached.
    #[error("could not connect to the service registry: {reason}")]
    Connect {
        /// Underlying failure description.
        reason: String,
    },

    /// A registry call failed, named after the failing operation.
    #[error("service registry call <{op}> failed: {reason}")]
    Os {
        /// The failing operation.
        op: &'static str,
        /// Underlying failure description.
        reason: String,
    },
}

impl RegistryError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RegistryError::AlreadyExists { .. } => "registry_already_exists",
            RegistryError::NotFound { .. } => "registry_not_found",
            RegistryError::Connect { .. } => "registry_connect",
            RegistryError::Os { .. } => "registry_os_call",
        }
    }
}
