//! Immutable identity of a managed unit.

/// Name, display name, and description of one managed unit.
///
/// Created at process start and never mutated; every subsystem refers to
/// the unit through this triple.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceIdentity {
    name: String,
    display_name: String,
    description: String,
}

impl ServiceIdentity {
    /// Creates an identity.
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            description: description.into(),
        }
    }

    /// Registered unit name; the key every registry operation uses.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable name shown by OS tooling.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Longer description shown by OS tooling.
    pub fn description(&self) -> &str {
        &self.description
    }
}
