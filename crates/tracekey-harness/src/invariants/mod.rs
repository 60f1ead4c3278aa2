//! Invariant checking for simulation testing.
//!
//! Invariants are properties of the persisted key-schedule state that must
//! hold after every step of any scenario, whatever order senders broadcast,
//! publish and idle in.
//!
//! # Architecture
//!
//! A [`SystemSnapshot`] is a raw read of every store in a
//! [`Scenario`](crate::Scenario), taken without triggering rotation. The
//! registered [`Invariant`] checks run against it.
//!
//! # Usage
//!
//! ```ignore
//! let registry = InvariantRegistry::standard();
//! let snapshot = SystemSnapshot::capture(&scenario);
//! registry.assert_all(&snapshot, "after broadcast");
//! ```

mod checks;
mod snapshot;

pub use checks::{
    CiphertextUnderCurrentSk, InfectedSkBoundToKey, PacketLogWellFormed, RosterAlignment,
    RosterTracksSenders,
};
pub use snapshot::{SenderSnapshot, SystemSnapshot};

/// Invariant check result.
pub type InvariantResult = Result<(), Violation>;

/// Invariant violation with context.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Name of the violated invariant.
    pub invariant: &'static str,
    /// Description of what went wrong.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// An invariant that can be checked against a snapshot.
pub trait Invariant: Send + Sync {
    /// Invariant name for error reporting.
    fn name(&self) -> &'static str;

    /// Check the invariant.
    ///
    /// Returns `Ok(())` if it holds, or a [`Violation`] describing what
    /// went wrong.
    fn check(&self, state: &SystemSnapshot) -> InvariantResult;
}

/// Registry of invariants to check.
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl Default for InvariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// Create a registry with every standard invariant.
    ///
    /// Includes:
    /// - [`RosterAlignment`]: the two roster lists stay parallel
    /// - [`RosterTracksSenders`]: roster SKs follow the senders' chains
    /// - [`InfectedSkBoundToKey`]: infected SKs descend from `H(x ‖ y)`
    /// - [`CiphertextUnderCurrentSk`]: cached ciphertexts decrypt correctly
    /// - [`PacketLogWellFormed`]: whole, unique packet records
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(RosterAlignment);
        registry.add(RosterTracksSenders);
        registry.add(InfectedSkBoundToKey);
        registry.add(CiphertextUnderCurrentSk);
        registry.add(PacketLogWellFormed);
        registry
    }

    /// Add an invariant to the registry.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Check all invariants against the given state.
    ///
    /// Returns `Ok(())` if all invariants hold, or all violations found.
    pub fn check_all(&self, state: &SystemSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(state).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Check all invariants, panicking on any violation.
    ///
    /// Use this in tests where you want immediate failure with context.
    #[allow(clippy::panic)]
    pub fn assert_all(&self, state: &SystemSnapshot, context: &str) {
        if let Err(violations) = self.check_all(state) {
            let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
            panic!("Invariant violation {context}:\n  {}", messages.join("\n  "));
        }
    }

    /// Number of registered invariants.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}
