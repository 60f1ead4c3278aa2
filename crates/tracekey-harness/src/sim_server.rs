//! In-process report server for simulation.

use tracekey_core::{Error, Report, ReportTransport, ReportVerdict};
use tracing::debug;

/// Report server that judges messages in-process and keeps a ledger.
#[derive(Debug, Default)]
pub struct SimServer {
    verdicts: Vec<ReportVerdict>,
    confirmed: Vec<Report>,
}

impl SimServer {
    /// Create a server with an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Verdicts in arrival order.
    pub fn verdicts(&self) -> &[ReportVerdict] {
        &self.verdicts
    }

    /// Reports whose signature verified.
    pub fn confirmed(&self) -> &[Report] {
        &self.confirmed
    }

    /// Number of verdicts equal to `verdict`.
    pub fn count(&self, verdict: ReportVerdict) -> usize {
        self.verdicts.iter().filter(|v| **v == verdict).count()
    }
}

impl ReportTransport for SimServer {
    fn send(&mut self, message: &[u8]) -> Result<Vec<u8>, Error> {
        let verdict = ReportVerdict::evaluate(message);
        if verdict == ReportVerdict::Confirmed {
            self.confirmed.push(Report::from_bytes(message)?);
        }
        debug!(?verdict, "judged report");

        self.verdicts.push(verdict);
        Ok(verdict.response().to_vec())
    }
}
