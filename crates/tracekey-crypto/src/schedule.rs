//! Broadcast window schedule.

use crate::{cipher::BLOCK_SIZE, error::CryptoError};

/// Minutes in a calendar day.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Default minutes per EphID window (L).
const DEFAULT_WINDOW_MINUTES: u32 = 10;

/// How a day is divided into EphID windows.
///
/// `L` minutes per window, `N = 1440 / L` windows per day. The broadcast
/// secret is exactly `N` cipher blocks long so that its ciphertext yields one
/// EphID per window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    window_minutes: u32,
}

impl Schedule {
    /// Create a schedule with `window_minutes` minutes per EphID.
    ///
    /// # Errors
    ///
    /// - `InvalidWindow`: if the window is zero or does not divide a day
    pub fn new(window_minutes: u32) -> Result<Self, CryptoError> {
        if window_minutes == 0 || MINUTES_PER_DAY % window_minutes != 0 {
            return Err(CryptoError::InvalidWindow { minutes: window_minutes });
        }
        Ok(Self { window_minutes })
    }

    /// Minutes per EphID window (L).
    pub fn window_minutes(&self) -> u32 {
        self.window_minutes
    }

    /// Number of EphIDs per day (N).
    pub fn ephids_per_day(&self) -> usize {
        (MINUTES_PER_DAY / self.window_minutes) as usize
    }

    /// Required broadcast secret length: `N × BLOCK_SIZE`.
    pub fn broadcast_secret_len(&self) -> usize {
        self.ephids_per_day() * BLOCK_SIZE
    }

    /// Length of a daily ciphertext including its IV.
    pub fn daily_ciphertext_len(&self) -> usize {
        BLOCK_SIZE + self.broadcast_secret_len()
    }

    /// Index of the EphID active at `minute` since midnight.
    ///
    /// # Errors
    ///
    /// - `MinuteOutOfRange`: if `minute` is not within the day
    pub fn index_at(&self, minute: u32) -> Result<usize, CryptoError> {
        if minute >= MINUTES_PER_DAY {
            return Err(CryptoError::MinuteOutOfRange { minute });
        }
        Ok((minute / self.window_minutes) as usize)
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self { window_minutes: DEFAULT_WINDOW_MINUTES }
    }
}
