//! # OS service-runtime seam.
//!
//! [`Host`] is the crate's view of the in-process side of the OS service
//! facility: the one-shot probe telling the process whether it was launched
//! as a managed instance, and the blocking control loop that owns the
//! request/status channels for the lifetime of the service.
//!
//! A platform adapter implements `run` by wiring the OS callback surface to
//! a pair of channels and handing them to
//! [`ServiceCore::execute`](crate::ServiceCore::execute):
//!
//! ```text
//! OS ──ControlRequest──► mpsc::Receiver ─┐
//!                                        ├─► core.execute(args, rx, tx)
//! OS ◄──UnitStatus────── mpsc::Sender  ──┘
//! ```
//!
//! Tests skip the trait entirely and drive `execute` with raw channels.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ServiceError;
use crate::service::core::ServiceCore;

/// The in-process side of the OS service facility.
#[async_trait]
pub trait Host: Send + Sync {
    /// Reports whether the current process was launched as a managed
    /// service instance. Called once per process entry; the answer never
    /// changes afterward.
    fn in_service(&self) -> Result<bool, ServiceError>;

    /// Hands the process to the OS control loop, driving `core` until the
    /// unit is fully stopped. Blocks for the process lifetime.
    async fn run(&self, name: &str, core: Arc<ServiceCore>) -> Result<(), ServiceError>;
}
