//! # Fault records and the fault conduit.
//!
//! A task spawned on the [`Scheduler`](crate::Scheduler) runs under a
//! guarded wrapper. When the body panics, the wrapper turns the panic into a
//! [`FaultRecord`] (the payload text plus a call-stack snapshot with the
//! panic-machinery frames stripped) and pushes it onto the [`FaultChannel`].
//! A single collector task drains the channel and logs each record, so a
//! fault in one task never tears down its siblings or the process.
//!
//! ## Architecture
//! ```text
//! Producers (many):                     Consumer (one):
//!   task A ──┐
//!   task B ──┼──► FaultChannel ───────► collector ───► tracing::error!
//!   task C ──┘   (bounded mpsc)
//! ```
//!
//! ## Rules
//! - The channel is bounded ([`FAULT_BACKLOG`]); a faulting task whose
//!   record does not fit blocks until the collector drains. This is a soft
//!   backstop, not a normal operating mode.
//! - Each record is consumed exactly once.
//! - The collector terminates when every producer handle has been dropped.

use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Once;
use std::task::{Context, Poll};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Capacity of the fault conduit.
///
/// Large enough that producers block only when the collector has fallen
/// badly behind.
pub const FAULT_BACKLOG: usize = 10;

/// A captured task fault: panic payload text plus a trimmed backtrace.
#[derive(Clone, Debug)]
pub struct FaultRecord {
    message: String,
    backtrace: String,
}

impl FaultRecord {
    pub(crate) fn new(message: impl Into<String>, backtrace: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            backtrace: backtrace.into(),
        }
    }

    /// The panic payload rendered as text.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Call-stack snapshot taken at the fault site, with the frames of the
    /// panic machinery itself stripped. Empty when no snapshot was captured.
    pub fn backtrace(&self) -> &str {
        &self.backtrace
    }
}

impl fmt::Display for FaultRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.backtrace.is_empty() {
            write!(f, "panic: {}", self.message)
        } else {
            write!(f, "panic: {}\n{}", self.message, self.backtrace)
        }
    }
}

/// Bounded many-producer conduit carrying [`FaultRecord`]s to one collector.
///
/// Cheap to clone; every scheduler node holds a handle so any task in the
/// tree can report.
#[derive(Clone, Debug)]
pub struct FaultChannel {
    tx: mpsc::Sender<FaultRecord>,
}

impl FaultChannel {
    /// Creates the conduit, returning the producer handle and the receiver
    /// to hand to [`FaultChannel::spawn_collector`].
    pub fn bounded() -> (Self, mpsc::Receiver<FaultRecord>) {
        let (tx, rx) = mpsc::channel(FAULT_BACKLOG);
        (Self { tx }, rx)
    }

    /// Pushes one record, waiting for capacity if the channel is full.
    ///
    /// Dropped silently once the collector is gone; there is nobody left to
    /// tell.
    pub async fn report(&self, record: FaultRecord) {
        let _ = self.tx.send(record).await;
    }

    /// Spawns the dedicated collector task.
    ///
    /// The collector logs every record at `error` level and exits when all
    /// producer handles have been dropped.
    pub fn spawn_collector(mut rx: mpsc::Receiver<FaultRecord>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(record) = rx.recv().await {
                tracing::error!("task fault: {record}");
            }
        })
    }
}

thread_local! {
    /// Set while a guarded task body is being polled on this thread.
    static CAPTURE_ARMED: Cell<bool> = const { Cell::new(false) };
    /// Trimmed backtrace recorded by the panic hook for the in-flight fault.
    static CAPTURED_BACKTRACE: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Installs the process-wide panic hook that snapshots a backtrace for
/// guarded tasks. Panics outside a guarded body fall through to the
/// previously installed hook.
fn install_capture_hook() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if CAPTURE_ARMED.with(Cell::get) {
                let raw = Backtrace::force_capture().to_string();
                let trimmed = trim_backtrace(&raw);
                CAPTURED_BACKTRACE.with(|slot| *slot.borrow_mut() = Some(trimmed));
            } else {
                previous(info);
            }
        }));
    });
}

/// Frame symbols belonging to the panic machinery rather than the fault site.
const MACHINERY_FRAMES: &[&str] = &[
    "core::panicking",
    "std::panicking",
    "rust_begin_unwind",
    "std::panic::panic_any",
];

/// Drops every frame at or above the last panic-machinery frame, leaving the
/// stack from the fault site downward. Returns the input unchanged when no
/// machinery frame is present.
fn trim_backtrace(raw: &str) -> String {
    let lines: Vec<&str> = raw.lines().collect();

    let mut last_machinery = None;
    for (i, line) in lines.iter().enumerate() {
        if is_frame_line(line) && MACHINERY_FRAMES.iter().any(|m| line.contains(m)) {
            last_machinery = Some(i);
        }
    }

    let start = match last_machinery {
        Some(i) => {
            // Skip the frame line itself plus its location continuation.
            let mut j = i + 1;
            while j < lines.len() && !is_frame_line(lines[j]) {
                j += 1;
            }
            j
        }
        None => 0,
    };

    lines[start..].join("\n")
}

/// A backtrace frame line has the shape `  N: symbol`; location lines are
/// indented continuations (`       at src/lib.rs:10:5`).
fn is_frame_line(line: &str) -> bool {
    let head = line.trim_start();
    match head.split_once(':') {
        Some((index, _)) => !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

/// Renders a panic payload the way the panic message would have appeared.
fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Future wrapper isolating panics in a task body.
///
/// Each poll of the inner future runs inside `catch_unwind` with the capture
/// hook armed, so a panic resolves the wrapper to `Err(FaultRecord)` instead
/// of unwinding into the runtime.
pub(crate) struct Guarded {
    inner: Pin<Box<dyn Future<Output = ()> + Send>>,
}

impl Guarded {
    pub(crate) fn new(body: impl Future<Output = ()> + Send + 'static) -> Self {
        install_capture_hook();
        Self { inner: Box::pin(body) }
    }
}

impl Future for Guarded {
    type Output = Result<(), FaultRecord>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        CAPTURE_ARMED.with(|armed| armed.set(true));
        let polled = panic::catch_unwind(AssertUnwindSafe(|| self.inner.as_mut().poll(cx)));
        CAPTURE_ARMED.with(|armed| armed.set(false));

        match polled {
            Ok(Poll::Pending) => Poll::Pending,
            Ok(Poll::Ready(())) => Poll::Ready(Ok(())),
            Err(payload) => {
                let backtrace = CAPTURED_BACKTRACE
                    .with(|slot| slot.borrow_mut().take())
                    .unwrap_or_default();
                Poll::Ready(Err(FaultRecord::new(panic_message(payload.as_ref()), backtrace)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
   0: std::backtrace_rs::backtrace::libunwind::trace
             at /rustc/lib/std/src/backtrace.rs:332:13
   1: std::panicking::rust_panic_with_hook
             at /rustc/lib/std/src/panicking.rs:785:13
   2: rust_begin_unwind
             at /rustc/lib/std/src/panicking.rs:647:5
   3: core::panicking::panic_fmt
             at /rustc/lib/core/src/panicking.rs:72:14
   4: myapp::worker::tick
             at ./src/worker.rs:41:9
   5: tokio::runtime::task::core::poll
             at /cargo/tokio-1.37.0/src/runtime/task/core.rs:328:17";

    #[test]
    fn test_trim_drops_machinery_frames() {
        let trimmed = trim_backtrace(SAMPLE);
        assert!(trimmed.starts_with("   4: myapp::worker::tick"));
        assert!(trimmed.contains("tokio::runtime::task::core::poll"));
        assert!(!trimmed.contains("rust_begin_unwind"));
        assert!(!trimmed.contains("core::panicking"));
    }

    #[test]
    fn test_trim_without_machinery_is_identity() {
        let raw = "   0: myapp::main\n             at ./src/main.rs:3:5";
        assert_eq!(trim_backtrace(raw), raw);
    }

    #[test]
    fn test_frame_line_detection() {
        assert!(is_frame_line("   4: myapp::worker::tick"));
        assert!(!is_frame_line("             at ./src/worker.rs:41:9"));
        assert!(!is_frame_line(""));
    }

    #[tokio::test]
    async fn test_guarded_captures_panic_payload() {
        let guarded = Guarded::new(async {
            panic!("boom in task");
        });
        let fault = guarded.await.expect_err("panic should surface as a fault");
        assert_eq!(fault.message(), "boom in task");
    }

    #[tokio::test]
    async fn test_guarded_passes_through_clean_completion() {
        let guarded = Guarded::new(async {});
        assert!(guarded.await.is_ok());
    }

    #[tokio::test]
    async fn test_report_and_collect_roundtrip() {
        let (channel, mut rx) = FaultChannel::bounded();
        channel.report(FaultRecord::new("lost heartbeat", "")).await;

        let record = rx.recv().await.expect("record should arrive");
        assert_eq!(record.message(), "lost heartbeat");
        assert_eq!(format!("{record}"), "panic: lost heartbeat");
    }
}
