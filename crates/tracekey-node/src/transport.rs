//! In-process report server.

use tracekey_core::{Error, ReportTransport, ReportVerdict, Store, append_unique, store::keys};
use tracing::info;

/// Report transport that evaluates reports locally.
///
/// Confirmed reports are appended (without duplicates) to the server
/// store's `confirmed` list.
#[derive(Debug, Clone)]
pub struct LoopbackTransport<S> {
    store: S,
}

impl<S: Store> LoopbackTransport<S> {
    /// Serve reports into `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The server store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: Store> ReportTransport for LoopbackTransport<S> {
    fn send(&mut self, message: &[u8]) -> Result<Vec<u8>, Error> {
        let verdict = ReportVerdict::evaluate(message);
        if verdict == ReportVerdict::Confirmed {
            let recorded = append_unique(&self.store, keys::CONFIRMED, message)?;
            info!(recorded, "confirmed infected contact");
        }
        Ok(verdict.response().to_vec())
    }
}
