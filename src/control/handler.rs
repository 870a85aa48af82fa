//! # Control-handler seam (`ControlHandler` / `ControlFn`)
//!
//! A [`ControlHandler`] is invoked by the dispatcher for one control
//! request; [`ControlFn`] wraps a closure
//! `F: Fn(Arc<ServiceManager>, ControlRequest) -> Fut`, producing a fresh
//! future per invocation so the handler carries no hidden state between
//! deliveries. Handlers for one unit never run concurrently with each
//! other (requests are dispatched strictly in arrival order) but they do
//! run concurrently with the main service task.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::control::status::ControlRequest;
use crate::service::ServiceManager;

/// Shared handle to a registered control handler.
pub type HandlerRef = Arc<dyn ControlHandler>;

/// Reaction to one delivered control request.
///
/// Implementations receive the manager handle (for status transitions and
/// further registration) and the originating request.
pub trait ControlHandler: Send + Sync + 'static {
    /// Handles one control request. Awaited to completion before the
    /// dispatcher emits the settled status or consumes the next request.
    fn handle(&self, manager: Arc<ServiceManager>, request: ControlRequest) -> BoxFuture<'static, ()>;
}

/// Function-backed control handler.
///
/// Wraps a closure that *creates* a new future per delivery.
pub struct ControlFn<F> {
    f: F,
}

impl<F> ControlFn<F> {
    /// Creates a new function-backed handler.
    ///
    /// Prefer [`ControlFn::arc`] when you immediately need a [`HandlerRef`].
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the handler and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

impl<F, Fut> ControlHandler for ControlFn<F>
where
    F: Fn(Arc<ServiceManager>, ControlRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn handle(&self, manager: Arc<ServiceManager>, request: ControlRequest) -> BoxFuture<'static, ()> {
        Box::pin((self.f)(manager, request))
    }
}
