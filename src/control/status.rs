//! # Reported service states and the accept mask.
//!
//! [`ServiceState`] is the closed set of states a managed unit reports to
//! the OS; [`AcceptMask`] is the bitset advertising which control commands
//! the unit currently promises to handle. Together they form the
//! [`UnitStatus`] wire value every emission carries.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use crate::control::command::Command;

/// State of a managed unit as reported to the OS.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ServiceState {
    /// Unit is initializing; not yet accepting commands.
    StartPending,
    /// Unit is fully operational.
    Running,
    /// Pause requested; transition in flight.
    PausePending,
    /// Unit is paused.
    Paused,
    /// Resume requested; transition in flight.
    ContinuePending,
    /// Stop requested; the task tree is unwinding.
    StopPending,
    /// Unit has fully stopped. Terminal.
    Stopped,
}

impl ServiceState {
    /// Returns a short stable label (snake_case) for use in logs/errors.
    pub fn as_label(self) -> &'static str {
        match self {
            ServiceState::StartPending => "start_pending",
            ServiceState::Running => "running",
            ServiceState::PausePending => "pause_pending",
            ServiceState::Paused => "paused",
            ServiceState::ContinuePending => "continue_pending",
            ServiceState::StopPending => "stop_pending",
            ServiceState::Stopped => "stopped",
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Bitset of control commands a unit promises to handle.
///
/// The persistent mask held by the
/// [`StatusBroadcaster`](crate::StatusBroadcaster) is always the union of
/// [`Command::accepts`] over every registered handler command; transient
/// narrowed masks are emitted around in-flight transitions without being
/// persisted.
///
/// ## Example
/// ```
/// use unitvisor::AcceptMask;
///
/// let mask = AcceptMask::STOP | AcceptMask::PAUSE_CONTINUE;
/// assert!(mask.contains(AcceptMask::STOP));
/// assert!(!mask.contains(AcceptMask::SHUTDOWN));
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AcceptMask(u32);

impl AcceptMask {
    /// Accepts nothing.
    pub const NONE: AcceptMask = AcceptMask(0);
    /// Stop.
    pub const STOP: AcceptMask = AcceptMask(0x0000_0001);
    /// Pause and continue, one combined promise.
    pub const PAUSE_CONTINUE: AcceptMask = AcceptMask(0x0000_0002);
    /// System shutdown notification.
    pub const SHUTDOWN: AcceptMask = AcceptMask(0x0000_0004);
    /// Service parameter change.
    pub const PARAM_CHANGE: AcceptMask = AcceptMask(0x0000_0008);
    /// Network binding add/remove/enable/disable, one combined promise.
    pub const NET_BIND_CHANGE: AcceptMask = AcceptMask(0x0000_0010);
    /// Hardware profile change.
    pub const HARDWARE_PROFILE_CHANGE: AcceptMask = AcceptMask(0x0000_0020);
    /// Power status event.
    pub const POWER_EVENT: AcceptMask = AcceptMask(0x0000_0040);
    /// Session change event.
    pub const SESSION_CHANGE: AcceptMask = AcceptMask(0x0000_0080);
    /// Pre-shutdown notification.
    pub const PRE_SHUTDOWN: AcceptMask = AcceptMask(0x0000_0100);

    const FLAGS: &'static [(AcceptMask, &'static str)] = &[
        (Self::STOP, "STOP"),
        (Self::PAUSE_CONTINUE, "PAUSE_CONTINUE"),
        (Self::SHUTDOWN, "SHUTDOWN"),
        (Self::PARAM_CHANGE, "PARAM_CHANGE"),
        (Self::NET_BIND_CHANGE, "NET_BIND_CHANGE"),
        (Self::HARDWARE_PROFILE_CHANGE, "HARDWARE_PROFILE_CHANGE"),
        (Self::POWER_EVENT, "POWER_EVENT"),
        (Self::SESSION_CHANGE, "SESSION_CHANGE"),
        (Self::PRE_SHUTDOWN, "PRE_SHUTDOWN"),
    ];

    /// Returns true when no command is accepted.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns true when every flag in `other` is set in `self`.
    pub fn contains(self, other: AcceptMask) -> bool {
        self.0 & other.0 == other.0
    }

    /// Sets every flag in `other`.
    pub fn insert(&mut self, other: AcceptMask) {
        self.0 |= other.0;
    }

    /// Returns the union of both masks.
    pub const fn union(self, other: AcceptMask) -> AcceptMask {
        AcceptMask(self.0 | other.0)
    }

    /// Raw bit representation, for platform adapters translating to the
    /// OS wire encoding.
    pub const fn bits(self) -> u32 {
        self.0
    }
}

impl BitOr for AcceptMask {
    type Output = AcceptMask;

    fn bitor(self, rhs: AcceptMask) -> AcceptMask {
        self.union(rhs)
    }
}

impl BitOrAssign for AcceptMask {
    fn bitor_assign(&mut self, rhs: AcceptMask) {
        self.insert(rhs);
    }
}

impl fmt::Debug for AcceptMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("AcceptMask(NONE)");
        }
        f.write_str("AcceptMask(")?;
        let mut first = true;
        for (flag, name) in Self::FLAGS {
            if self.contains(*flag) {
                if !first {
                    f.write_str(" | ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        f.write_str(")")
    }
}

/// One status emission: the reported state plus the advertised accept mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnitStatus {
    /// Reported state.
    pub state: ServiceState,
    /// Advertised accept mask.
    pub accepts: AcceptMask,
}

impl UnitStatus {
    /// Creates a status value.
    pub fn new(state: ServiceState, accepts: AcceptMask) -> Self {
        Self { state, accepts }
    }

    /// The terminal status: stopped, accepting nothing.
    pub fn stopped() -> Self {
        Self::new(ServiceState::Stopped, AcceptMask::NONE)
    }
}

/// One control delivery from the OS: the command plus the OS's snapshot of
/// the unit's current status at delivery time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControlRequest {
    /// The delivered command.
    pub command: Command,
    /// OS-supplied current status snapshot.
    pub status: UnitStatus,
}

impl ControlRequest {
    /// Creates a control request.
    pub fn new(command: Command, status: UnitStatus) -> Self {
        Self { command, status }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_and_contains() {
        let mut mask = AcceptMask::NONE;
        mask |= AcceptMask::STOP;
        mask.insert(AcceptMask::PAUSE_CONTINUE);

        assert_eq!(mask, AcceptMask::STOP | AcceptMask::PAUSE_CONTINUE);
        assert!(mask.contains(AcceptMask::STOP));
        assert!(mask.contains(AcceptMask::PAUSE_CONTINUE));
        assert!(!mask.contains(AcceptMask::SHUTDOWN));
        assert!(!mask.is_empty());
    }

    #[test]
    fn test_flags_are_disjoint() {
        for (i, (a, _)) in AcceptMask::FLAGS.iter().enumerate() {
            for (b, _) in &AcceptMask::FLAGS[i + 1..] {
                assert_eq!(a.bits() & b.bits(), 0, "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn test_debug_lists_flag_names() {
        let mask = AcceptMask::STOP | AcceptMask::PRE_SHUTDOWN;
        assert_eq!(format!("{mask:?}"), "AcceptMask(STOP | PRE_SHUTDOWN)");
        assert_eq!(format!("{:?}", AcceptMask::NONE), "AcceptMask(NONE)");
    }

    #[test]
    fn test_stopped_status_accepts_nothing() {
        let status = UnitStatus::stopped();
        assert_eq!(status.state, ServiceState::Stopped);
        assert!(status.accepts.is_empty());
    }
}
