//! # Install-time unit configuration.
//!
//! [`UnitConfig`] carries everything the registry stores about a unit at
//! install time. Beyond the name/description surface, the fields are opaque
//! platform values (pre-shutdown timeout, failure-action policy blob,
//! delayed autostart, extra launch arguments) passed through to the
//! [`Registry`](crate::Registry) adapter unchanged. The adapter owns their
//! wire encoding, including platform-correct quoting of launch arguments.
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use unitvisor::{StartKind, UnitConfig};
//!
//! let mut cfg = UnitConfig::default();
//! cfg.display_name = "Demo Service".into();
//! cfg.start = StartKind::Automatic;
//! cfg.delayed_autostart = true;
//!
//! assert_eq!(cfg.preshutdown_timeout, Some(Duration::from_millis(2000)));
//! ```

use std::path::PathBuf;
use std::time::Duration;

use crate::service::ServiceIdentity;

/// How the OS launches the unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StartKind {
    /// Launched at boot.
    Automatic,
    /// Launched on demand.
    #[default]
    Manual,
    /// Registered but not launchable.
    Disabled,
}

/// Install-time configuration for a unit registration.
#[derive(Clone, Debug)]
pub struct UnitConfig {
    /// Human-readable unit name shown by OS tooling.
    pub display_name: String,
    /// Longer description shown by OS tooling.
    pub description: String,
    /// Launch policy.
    pub start: StartKind,
    /// Time the OS grants the unit between `PreShutdown` delivery and
    /// forced termination. Opaque pass-through.
    pub preshutdown_timeout: Option<Duration>,
    /// Platform failure-action policy blob. Opaque pass-through.
    pub failure_actions: Option<Vec<u8>>,
    /// Delay the automatic start until after boot-critical units. Opaque
    /// pass-through.
    pub delayed_autostart: bool,
    /// Extra arguments appended to the registered launch command line; the
    /// registry adapter applies platform-correct quoting.
    pub launch_args: Vec<String>,
    /// Registered binary path. `None` defaults to the current executable
    /// at install time.
    pub binary_path: Option<PathBuf>,
}

impl Default for UnitConfig {
    /// Manual start, a 2 s pre-shutdown window, and no platform extras.
    fn default() -> Self {
        Self {
            display_name: String::new(),
            description: String::new(),
            start: StartKind::Manual,
            preshutdown_timeout: Some(Duration::from_millis(2000)),
            failure_actions: None,
            delayed_autostart: false,
            launch_args: Vec::new(),
            binary_path: None,
        }
    }
}

impl UnitConfig {
    /// Default configuration with display name and description taken from
    /// the identity; what the `install` invocation verb registers.
    pub fn for_identity(identity: &ServiceIdentity) -> Self {
        Self {
            display_name: identity.display_name().to_string(),
            description: identity.description().to_string(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = UnitConfig::default();
        assert_eq!(cfg.start, StartKind::Manual);
        assert_eq!(cfg.preshutdown_timeout, Some(Duration::from_millis(2000)));
        assert!(cfg.failure_actions.is_none());
        assert!(!cfg.delayed_autostart);
        assert!(cfg.launch_args.is_empty());
        assert!(cfg.binary_path.is_none());
    }

    #[test]
    fn test_for_identity_copies_display_surface() {
        let identity = ServiceIdentity::new("demo", "Demo Service", "Does demo things");
        let cfg = UnitConfig::for_identity(&identity);
        assert_eq!(cfg.display_name, "Demo Service");
        assert_eq!(cfg.description, "Does demo things");
        assert_eq!(cfg.start, StartKind::Manual);
    }
}
