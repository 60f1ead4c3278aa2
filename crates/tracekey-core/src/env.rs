//! Environment abstraction for deterministic testing.
//!
//! Decouples key-schedule logic from system resources (calendar, wall clock,
//! randomness). Production code uses the local clock and OS entropy;
//! simulation uses a virtual calendar and a seeded RNG.

use chrono::NaiveDate;

/// Abstract environment providing the calendar, the clock and randomness.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// - `random_bytes()` uses cryptographically secure entropy in production
/// - `minutes_since_midnight()` is always below 1440
/// - Methods are infallible except in exceptional circumstances (e.g., OS
///   entropy exhaustion)
pub trait Environment: Clone + Send + Sync + 'static {
    /// Current local calendar date.
    ///
    /// Drives lazy SK rotation: whole days elapsed between the stored
    /// date and this one are applied on the next access.
    fn today(&self) -> NaiveDate;

    /// Minutes elapsed since local midnight, in `[0, 1440)`.
    fn minutes_since_midnight(&self) -> u32;

    /// Fills the provided buffer with random bytes.
    ///
    /// # Invariants
    ///
    /// - Given the same RNG seed, this produces the same sequence of bytes
    /// - Uses cryptographically secure RNG
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random fixed-size array.
    ///
    /// Convenience for IVs, SKs and private scalars.
    fn random_array<const N: usize>(&self) -> [u8; N] {
        let mut bytes = [0u8; N];
        self.random_bytes(&mut bytes);
        bytes
    }
}
