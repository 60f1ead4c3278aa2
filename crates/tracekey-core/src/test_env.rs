//! Fixed environment for unit tests.

use chrono::NaiveDate;

use crate::env::Environment;

/// Frozen calendar and clock; "random" bytes are a constant fill.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FixedEnv {
    today: NaiveDate,
    minute: u32,
    fill: u8,
}

impl FixedEnv {
    pub(crate) fn on(year: i32, month: u32, day: u32) -> Self {
        Self { today: NaiveDate::from_ymd_opt(year, month, day).unwrap(), minute: 0, fill: 0x11 }
    }

    pub(crate) fn at_minute(self, minute: u32) -> Self {
        Self { minute, ..self }
    }

    pub(crate) fn with_random_fill(self, fill: u8) -> Self {
        Self { fill, ..self }
    }
}

impl Environment for FixedEnv {
    fn today(&self) -> NaiveDate {
        self.today
    }

    fn minutes_since_midnight(&self) -> u32 {
        self.minute
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        buffer.fill(self.fill);
    }
}
