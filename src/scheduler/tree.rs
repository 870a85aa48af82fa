//! # Scheduler: structured concurrency for the service task tree.
//!
//! The [`Scheduler`] is a cheap-clone handle to one node in a tree of
//! concurrent tasks rooted at the service's main task. It answers one
//! question precisely: *when has everything the service started actually
//! finished?* The OS expects a single definitive stopped report, and
//! reporting it while spawned work is still unwinding is a correctness bug:
//! resources still held, listeners still active.
//!
//! ## Architecture
//! ```text
//! root ──┬── go(main task) ──┬── go(worker)          strict join
//!        │                   └── go(worker)          strict join
//!        │                         └── go(sub)       strict join
//!        └── go_detached(control listener)           never gates wait()
//!
//! root.wait() returns only after every go()-descendant has retired.
//! ```
//!
//! ## Rules
//! - [`Scheduler::go`] registers the child with the node's completion group
//!   **before** spawning; [`Scheduler::wait`] cannot slip past a child that
//!   is registered but not yet running.
//! - A node retires only after its own children have drained, so the join
//!   is transitive: the root's `wait` covers the entire tree.
//! - [`Scheduler::go_detached`] attaches the child to the *grandparent's*
//!   group, so it lives as long as it likes without gating the spawner's
//!   own completion. Registration is synchronous, so there is no startup
//!   race against a spawner that exits immediately.
//! - Every body runs under a guard: a panic becomes a [`FaultRecord`] on the
//!   shared fault channel and the node still retires. A faulting child never
//!   deadlocks its ancestors.
//! - [`Scheduler::exit`] is idempotent; a node signals its parent exactly
//!   once even if a recovery path races a normal return.
//!
//! There is no cancellation signal in the tree. A task that never returns
//! blocks `wait` forever; bodies are responsible for honoring stop requests
//! promptly.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::scheduler::fault::{FaultChannel, Guarded};

/// Handle to one node in the service task tree.
///
/// Clones refer to the same node; [`Scheduler::go`] hands each spawned body
/// a fresh node of its own.
#[derive(Clone, Debug)]
pub struct Scheduler {
    /// Group this node signals on retirement. `None` for the root and for
    /// tasks detached from it.
    parent: Option<super::WaitGroup>,
    /// Completion group for direct children, created on first `go`.
    children: Arc<Mutex<Option<super::WaitGroup>>>,
    /// Retirement latch; flips once.
    exited: Arc<AtomicBool>,
    /// Shared fault conduit for the whole tree.
    faults: FaultChannel,
}

impl Scheduler {
    /// Creates the root node of a task tree.
    pub fn root(faults: FaultChannel) -> Self {
        Self::node(None, faults)
    }

    fn node(parent: Option<super::WaitGroup>, faults: FaultChannel) -> Self {
        Self {
            parent,
            children: Arc::new(Mutex::new(None)),
            exited: Arc::new(AtomicBool::new(false)),
            faults,
        }
    }

    /// Spawns `f` as a strict-join child of this node.
    ///
    /// The child is registered with this node's completion group before the
    /// task starts; [`Scheduler::wait`] does not return while the child, or
    /// any `go`-descendant it spawns in turn, is still live.
    pub fn go<F, Fut>(&self, f: F)
    where
        F: FnOnce(Scheduler) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let group = self.child_group();
        group.add(1);
        let node = Self::node(Some(group), self.faults.clone());
        tokio::spawn(Self::supervise(node, f));
    }

    /// Spawns `f` detached from this node's own completion.
    ///
    /// The child joins the group this node itself signals to, so it gates
    /// the grandparent's join but never the spawner's [`Scheduler::wait`].
    /// Used for auxiliary loops that live for the whole process, such as the
    /// control-request listener. Registration happens synchronously, before
    /// the task is spawned.
    pub fn go_detached<F, Fut>(&self, f: F)
    where
        F: FnOnce(Scheduler) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if let Some(parent) = &self.parent {
            parent.add(1);
        }
        let node = Self::node(self.parent.clone(), self.faults.clone());
        tokio::spawn(Self::supervise(node, f));
    }

    /// Waits until every child spawned from this node via [`Scheduler::go`]
    /// has retired. Returns immediately when no child was ever spawned.
    pub async fn wait(&self) {
        let group = self.child_slot().clone();
        if let Some(group) = group {
            group.wait().await;
        }
    }

    /// Signals this node's completion to its parent. Idempotent; only the
    /// first call has an effect.
    pub fn exit(&self) {
        if !self.exited.swap(true, Ordering::AcqRel) {
            if let Some(parent) = &self.parent {
                parent.done();
            }
        }
    }

    /// Runs one spawned body to retirement: guard the body, surface any
    /// fault, drain the node's own children, then signal the parent.
    async fn supervise<F, Fut>(node: Scheduler, f: F)
    where
        F: FnOnce(Scheduler) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let body = Guarded::new(f(node.clone()));
        if let Err(fault) = body.await {
            node.faults.report(fault).await;
        }
        node.wait().await;
        node.exit();
    }

    fn child_group(&self) -> super::WaitGroup {
        self.child_slot().get_or_insert_with(super::WaitGroup::new).clone()
    }

    fn child_slot(&self) -> MutexGuard<'_, Option<super::WaitGroup>> {
        match self.children.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
