//! # Service Registry seam.
//!
//! [`Registry`] and [`UnitHandle`] are the crate's view of the OS facility
//! that stores registered units and brokers control access to them. The
//! mechanics (SCM syscalls, binary configuration blobs, quoting of launch
//! arguments) live entirely in platform adapters behind these traits; the
//! opaque fields of [`UnitConfig`](crate::UnitConfig) pass through
//! unchanged.
//!
//! Tests implement both traits in memory; the controller-side operations of
//! [`ServiceManager`](crate::ServiceManager) are written against this seam
//! only.

mod error;

pub use error::RegistryError;

use std::path::Path;

use async_trait::async_trait;

use crate::config::UnitConfig;
use crate::control::{Command, UnitStatus};
use crate::service::ServiceIdentity;

/// The OS facility that stores registered units.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Registers a unit. Fails with [`RegistryError::AlreadyExists`] when a
    /// unit with this name is present.
    async fn install(
        &self,
        identity: &ServiceIdentity,
        binary: &Path,
        config: &UnitConfig,
    ) -> Result<(), RegistryError>;

    /// Opens a control connection to a registered unit. Fails with
    /// [`RegistryError::NotFound`] when no unit with this name is present.
    async fn open(&self, name: &str) -> Result<Box<dyn UnitHandle>, RegistryError>;
}

/// An open control connection to one registered unit.
#[async_trait]
pub trait UnitHandle: Send {
    /// Requests launch of the unit with the given extra arguments.
    async fn start(&mut self, args: &[String]) -> Result<(), RegistryError>;

    /// Delivers a control command and returns the status the unit reported
    /// in response.
    async fn control(&mut self, command: Command) -> Result<UnitStatus, RegistryError>;

    /// Reads the unit's current status.
    async fn query(&mut self) -> Result<UnitStatus, RegistryError>;

    /// The registered binary path, as stored by the registry (may carry
    /// quoting and platform separators).
    async fn binary_path(&mut self) -> Result<String, RegistryError>;

    /// Deletes the unit's registration.
    async fn delete(&mut self) -> Result<(), RegistryError>;
}
