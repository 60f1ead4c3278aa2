//! Simulated environment: virtual calendar, virtual clock, seeded RNG.

#![allow(clippy::disallowed_types, reason = "Synchronous shared simulation state")]

use std::sync::{Arc, Mutex};

use chrono::{Days, NaiveDate};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use tracekey_core::Environment;

/// Minutes in a day.
const MINUTES_PER_DAY: u32 = 24 * 60;

/// Default first simulated day.
const DEFAULT_START: (i32, u32, u32) = (2024, 1, 1);

/// Deterministic [`Environment`] for simulation.
///
/// Clones share one calendar, clock and RNG, so every actor in a scenario
/// sees the same time and draws from one reproducible random stream. Time
/// only moves when the test moves it.
#[derive(Clone)]
pub struct SimEnv {
    inner: Arc<Mutex<SimState>>,
}

struct SimState {
    today: NaiveDate,
    minute: u32,
    rng: ChaCha20Rng,
}

impl SimEnv {
    /// Environment starting at midnight on the default day, RNG seeded with 0.
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    /// Environment starting at midnight on the default day.
    #[allow(clippy::expect_used)]
    pub fn with_seed(seed: u64) -> Self {
        let (year, month, day) = DEFAULT_START;
        let start = NaiveDate::from_ymd_opt(year, month, day).expect("default start is a valid date");
        Self::starting_on(seed, start)
    }

    /// Environment starting at midnight on `date`.
    pub fn starting_on(seed: u64, date: NaiveDate) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SimState {
                today: date,
                minute: 0,
                rng: ChaCha20Rng::seed_from_u64(seed),
            })),
        }
    }

    /// Move the calendar forward by `days`, keeping the time of day.
    ///
    /// # Panics
    ///
    /// Panics if the date leaves chrono's range.
    #[allow(clippy::expect_used)]
    pub fn advance_days(&self, days: u32) {
        let mut state = self.inner.lock().expect("SimEnv mutex poisoned");
        state.today = state
            .today
            .checked_add_days(Days::new(u64::from(days)))
            .expect("simulated date out of range");
    }

    /// Move the clock forward by `minutes`, rolling over midnight.
    #[allow(clippy::expect_used)]
    pub fn advance_minutes(&self, minutes: u32) {
        let days = {
            let mut state = self.inner.lock().expect("SimEnv mutex poisoned");
            let total = state.minute + minutes;
            state.minute = total % MINUTES_PER_DAY;
            total / MINUTES_PER_DAY
        };
        if days > 0 {
            self.advance_days(days);
        }
    }

    /// Set the time of day.
    ///
    /// # Panics
    ///
    /// Panics if `minute` is not below 1440.
    #[allow(clippy::expect_used)]
    pub fn set_minute(&self, minute: u32) {
        assert!(minute < MINUTES_PER_DAY, "minute must be below {MINUTES_PER_DAY}, got {minute}");
        self.inner.lock().expect("SimEnv mutex poisoned").minute = minute;
    }
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for SimEnv {
    #[allow(clippy::expect_used)]
    fn today(&self) -> NaiveDate {
        self.inner.lock().expect("SimEnv mutex poisoned").today
    }

    #[allow(clippy::expect_used)]
    fn minutes_since_midnight(&self) -> u32 {
        self.inner.lock().expect("SimEnv mutex poisoned").minute
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        self.inner.lock().expect("SimEnv mutex poisoned").rng.fill_bytes(buffer);
    }
}
