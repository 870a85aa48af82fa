//! # Service-handler seam (`ServiceHandler` / `ServiceFn`)
//!
//! The [`ServiceHandler`] is the unit's business logic: the one function the
//! in-service runtime executes as the root of the task tree. It receives
//! the manager handle, a [`Scheduler`](crate::Scheduler) node for spawning
//! subtasks, and the residual launch arguments.
//!
//! A handler is expected to:
//! - register control handlers, at least one for
//!   [`Command::Stop`](crate::Command::Stop) (a fail-fast default is
//!   installed otherwise);
//! - call [`ServiceManager::started`](crate::ServiceManager::started) once
//!   its own initialization is complete;
//! - return when the unit should stop; the stopped status is reported only
//!   after every task it spawned has unwound.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::scheduler::Scheduler;
use crate::service::ServiceManager;

/// Shared handle to the unit's business logic.
pub type ServiceRef = Arc<dyn ServiceHandler>;

/// The main function of a managed unit.
pub trait ServiceHandler: Send + Sync + 'static {
    /// Executes the unit until it is ready to stop.
    fn run(
        &self,
        manager: Arc<ServiceManager>,
        scheduler: Scheduler,
        args: Vec<String>,
    ) -> BoxFuture<'static, ()>;
}

/// Function-backed service handler.
///
/// Wraps a closure that *creates* the main future; shared state between the
/// closure and control handlers goes through explicit `Arc`s.
///
/// ## Example
/// ```no_run
/// use std::sync::Arc;
/// use unitvisor::{ServiceFn, ServiceManager, ServiceRef};
///
/// let logic: ServiceRef = ServiceFn::arc(|manager: Arc<ServiceManager>, _scheduler, _args| async move {
///     manager.started();
///     // serve until told to stop...
/// });
/// ```
pub struct ServiceFn<F> {
    f: F,
}

impl<F> ServiceFn<F> {
    /// Creates a new function-backed handler.
    ///
    /// Prefer [`ServiceFn::arc`] when you immediately need a [`ServiceRef`].
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the handler and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

impl<F, Fut> ServiceHandler for ServiceFn<F>
where
    F: Fn(Arc<ServiceManager>, Scheduler, Vec<String>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn run(
        &self,
        manager: Arc<ServiceManager>,
        scheduler: Scheduler,
        args: Vec<String>,
    ) -> BoxFuture<'static, ()> {
        Box::pin((self.f)(manager, scheduler, args))
    }
}
