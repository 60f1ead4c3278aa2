//! Chaotic store wrapper for fault injection testing
//!
//! Randomly fails operations to check that every key-schedule operation
//! surfaces storage failures as errors instead of panicking or silently
//! continuing with stale state.

#![allow(clippy::disallowed_types, reason = "Locking simple RNG state")]

use std::sync::{Arc, Mutex};

use super::{Store, StorageError};

/// Store wrapper that randomly injects failures
///
/// Delegates to an underlying store but fails operations with a configured
/// probability. Uses Arc<Mutex<>> for the RNG state, making it Clone and
/// thread-safe.
#[derive(Clone)]
pub struct ChaoticStore<S: Store> {
    inner: S,
    /// Failure rate (0.0 = never fail, 1.0 = always fail)
    failure_rate: f64,
    /// RNG state for deterministic chaos
    rng: Arc<Mutex<ChaoticRng>>,
    /// Number of injected failures
    failures: Arc<Mutex<usize>>,
}

/// Linear congruential generator, reproducible from a seed.
struct ChaoticRng {
    state: u64,
}

impl ChaoticRng {
    /// Next value in [0.0, 1.0)
    fn next(&mut self) -> f64 {
        // Numerical Recipes constants
        const A: u64 = 1_664_525;
        const C: u64 = 1_013_904_223;
        const M: u64 = 1u64 << 32;

        self.state = (A.wrapping_mul(self.state).wrapping_add(C)) % M;
        (self.state as f64) / (M as f64)
    }
}

impl<S: Store> ChaoticStore<S> {
    /// Wrap `inner`, failing each operation with probability `failure_rate`.
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in [0.0, 1.0]
    pub fn with_seed(inner: S, failure_rate: f64, seed: u64) -> Self {
        assert!(
            (0.0..=1.0).contains(&failure_rate),
            "failure_rate must be between 0.0 and 1.0, got {failure_rate}"
        );

        Self {
            inner,
            failure_rate,
            rng: Arc::new(Mutex::new(ChaoticRng { state: seed })),
            failures: Arc::new(Mutex::new(0)),
        }
    }

    /// Underlying store (for checking state after chaos).
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Number of failures injected so far.
    pub fn failure_count(&self) -> usize {
        #[allow(clippy::expect_used)]
        *self.failures.lock().expect("failure counter mutex poisoned")
    }

    fn inject(&self, key: &str) -> Result<(), StorageError> {
        #[allow(clippy::expect_used)]
        let fail = self.rng.lock().expect("ChaoticRng mutex poisoned").next() < self.failure_rate;
        if !fail {
            return Ok(());
        }

        #[allow(clippy::expect_used)]
        let mut failures = self.failures.lock().expect("failure counter mutex poisoned");
        *failures += 1;
        Err(StorageError::Io(format!("chaotic failure injection on {key}")))
    }
}

impl<S: Store> Store for ChaoticStore<S> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        self.inject(key)?;
        self.inner.get(key)
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        self.inject(key)?;
        self.inner.put(key, value)
    }

    fn append(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        self.inject(key)?;
        self.inner.append(key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn zero_rate_never_fails() {
        let store = ChaoticStore::with_seed(MemoryStore::new(), 0.0, 1);
        for i in 0..100u8 {
            store.append("ephids", &[i]).unwrap();
        }
        assert_eq!(store.failure_count(), 0);
        assert_eq!(store.inner().get("ephids").unwrap().map(|v| v.len()), Some(100));
    }

    #[test]
    fn full_rate_always_fails() {
        let store = ChaoticStore::with_seed(MemoryStore::new(), 1.0, 1);

        assert!(matches!(store.put("sk", &[1]), Err(StorageError::Io(_))));
        assert!(matches!(store.get("sk"), Err(StorageError::Io(_))));
        assert_eq!(store.failure_count(), 2);
        assert_eq!(store.inner().get("sk").unwrap(), None);
    }

    #[test]
    fn same_seed_same_failures() {
        let run = |seed| {
            let store = ChaoticStore::with_seed(MemoryStore::new(), 0.5, seed);
            (0..64).map(|_| store.get("sk").is_err()).collect::<Vec<_>>()
        };
        assert_eq!(run(42), run(42));
    }
}
