//! Structured concurrency for the in-service task tree.
//!
//! Modules:
//! - [`tree`]: the task-tree node handle (`go` / `go_detached` /
//!   `wait` / `exit`);
//! - [`waitgroup`]: completion-group counter used for parent/child joins;
//! - [`fault`]: fault records, the bounded fault conduit, and panic capture.

mod fault;
mod tree;
mod waitgroup;

pub use fault::{FaultChannel, FaultRecord, FAULT_BACKLOG};
pub use tree::Scheduler;
pub use waitgroup::WaitGroup;
