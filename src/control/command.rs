//! # Control command vocabulary.
//!
//! [`Command`] is the closed set of control requests the OS can deliver to
//! a managed unit. Each command maps to the accept-flag it implies via
//! [`Command::accepts`]; the mapping is fixed:
//!
//! - `Pause` and `Continue` both map to the single combined
//!   [`AcceptMask::PAUSE_CONTINUE`] flag;
//! - the four net-bind variants all map to
//!   [`AcceptMask::NET_BIND_CHANGE`];
//! - `Stop`, `Shutdown`, `PreShutdown`, `ParamChange`,
//!   `HardwareProfileChange`, `PowerEvent` and `SessionChange` each map to
//!   their own flag;
//! - `Interrogate` maps to no flag; it is always answered, never promised.

use std::fmt;

use crate::control::status::AcceptMask;

/// A control request kind deliverable by the OS service manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    /// Stop the unit.
    Stop,
    /// System is shutting down.
    Shutdown,
    /// System is about to shut down; delivered ahead of `Shutdown`.
    PreShutdown,
    /// Pause the unit.
    Pause,
    /// Resume a paused unit.
    Continue,
    /// Report current status; probed by the OS at any time.
    Interrogate,
    /// Service parameters changed.
    ParamChange,
    /// A network binding was added.
    NetBindAdd,
    /// A network binding was removed.
    NetBindRemove,
    /// A network binding was enabled.
    NetBindEnable,
    /// A network binding was disabled.
    NetBindDisable,
    /// Hardware profile changed.
    HardwareProfileChange,
    /// Power status event.
    PowerEvent,
    /// Session change event.
    SessionChange,
}

impl Command {
    /// The accept-flag a registered handler for this command implies.
    ///
    /// ## Example
    /// ```
    /// use unitvisor::{AcceptMask, Command};
    ///
    /// assert_eq!(Command::Pause.accepts(), AcceptMask::PAUSE_CONTINUE);
    /// assert_eq!(Command::Continue.accepts(), AcceptMask::PAUSE_CONTINUE);
    /// assert_eq!(Command::NetBindAdd.accepts(), AcceptMask::NET_BIND_CHANGE);
    /// assert_eq!(Command::Interrogate.accepts(), AcceptMask::NONE);
    /// ```
    pub fn accepts(self) -> AcceptMask {
        match self {
            Command::Stop => AcceptMask::STOP,
            Command::Shutdown => AcceptMask::SHUTDOWN,
            Command::PreShutdown => AcceptMask::PRE_SHUTDOWN,
            Command::Pause | Command::Continue => AcceptMask::PAUSE_CONTINUE,
            Command::ParamChange => AcceptMask::PARAM_CHANGE,
            Command::NetBindAdd
            | Command::NetBindRemove
            | Command::NetBindEnable
            | Command::NetBindDisable => AcceptMask::NET_BIND_CHANGE,
            Command::HardwareProfileChange => AcceptMask::HARDWARE_PROFILE_CHANGE,
            Command::PowerEvent => AcceptMask::POWER_EVENT,
            Command::SessionChange => AcceptMask::SESSION_CHANGE,
            Command::Interrogate => AcceptMask::NONE,
        }
    }

    /// True for the two commands sharing the pause/continue accept promise.
    pub fn is_pause_or_continue(self) -> bool {
        matches!(self, Command::Pause | Command::Continue)
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(self) -> &'static str {
        match self {
            Command::Stop => "stop",
            Command::Shutdown => "shutdown",
            Command::PreShutdown => "pre_shutdown",
            Command::Pause => "pause",
            Command::Continue => "continue",
            Command::Interrogate => "interrogate",
            Command::ParamChange => "param_change",
            Command::NetBindAdd => "net_bind_add",
            Command::NetBindRemove => "net_bind_remove",
            Command::NetBindEnable => "net_bind_enable",
            Command::NetBindDisable => "net_bind_disable",
            Command::HardwareProfileChange => "hardware_profile_change",
            Command::PowerEvent => "power_event",
            Command::SessionChange => "session_change",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}
