//! Service side: identity, business-logic seam, host runtime seam, the
//! in-service execution wrapper, and the process-entry facade.
//!
//! Modules:
//! - [`identity`]: the immutable unit identity triple;
//! - [`handler`]: the `ServiceHandler`/`ServiceFn` seam for business logic;
//! - [`host`]: the OS service-runtime seam;
//! - [`core`]: the in-service execution wrapper;
//! - [`manager`]: the `ServiceManager` facade and controller operations;
//! - [`workdir`]: working-directory derivation from registered paths.

mod core;
mod handler;
mod host;
mod identity;
mod manager;
mod workdir;

pub use self::core::ServiceCore;
pub use handler::{ServiceFn, ServiceHandler, ServiceRef};
pub use host::Host;
pub use identity::ServiceIdentity;
pub use manager::{RunState, ServiceManager, DEFAULT_WAIT_WINDOW, QUERY_POLL_INTERVAL};
