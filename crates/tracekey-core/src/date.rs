//! Rotation dates, persisted as `YYYY-MM-DD` text.

use chrono::NaiveDate;

use crate::{error::Error, store::Store};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn encode(date: NaiveDate) -> Vec<u8> {
    date.format(DATE_FORMAT).to_string().into_bytes()
}

pub(crate) fn decode(key: &'static str, bytes: &[u8]) -> Result<NaiveDate, Error> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| Error::CorruptState { key, reason: "date is not UTF-8".to_string() })?;
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
        .map_err(|e| Error::CorruptState { key, reason: format!("unparsable date {text:?}: {e}") })
}

/// Load the date under `key`, stamping `today` on first access.
pub(crate) fn load_or_init<S: Store>(
    store: &S,
    key: &'static str,
    today: NaiveDate,
) -> Result<NaiveDate, Error> {
    let (bytes, _) = store.load_or_init(key, || Ok::<_, Error>(encode(today)))?;
    decode(key, &bytes)
}

/// Whole days from `from` to `to`. A clock that moved backwards counts as 0.
pub(crate) fn elapsed_days(from: NaiveDate, to: NaiveDate) -> u32 {
    let days = (to - from).num_days();
    u32::try_from(days.max(0)).unwrap_or(u32::MAX)
}
