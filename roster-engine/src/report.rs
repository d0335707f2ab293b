//! Run-level outcome aggregation and scoped operation logging.
//!
//! One [`RunReport`] is threaded through every synchronizer and inspected
//! once at the end of the run; the exit code derives from it. There is no
//! module-level "had error" state anywhere.

use chrono::{DateTime, Utc};

use crate::error::PortError;

/// Aggregate outcome of a run: error/warning counters plus timestamps.
#[derive(Debug, Clone)]
pub struct RunReport {
    started_at: DateTime<Utc>,
    errors: u32,
    warnings: u32,
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            errors: 0,
            warnings: 0,
        }
    }

    /// Log an error-level event and count it toward a non-zero exit.
    pub fn error(&mut self, msg: impl AsRef<str>) {
        tracing::error!("{}", msg.as_ref());
        self.errors += 1;
    }

    /// Log a warning-level event; the run still exits 0 unless an error is
    /// also recorded.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        tracing::warn!("{}", msg.as_ref());
        self.warnings += 1;
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings > 0
    }

    pub fn errors(&self) -> u32 {
        self.errors
    }

    pub fn warnings(&self) -> u32 {
        self.warnings
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Run one externally-visible operation with start/success/failure logging.
///
/// Failures are recorded on the report and swallowed: the caller moves on
/// to the next identity/resource. An ambiguous identity lookup is a
/// non-blocking anomaly and counts as a warning; every other port failure
/// counts as an error.
pub fn attempt<T>(
    report: &mut RunReport,
    what: &str,
    f: impl FnOnce() -> Result<T, PortError>,
) -> Option<T> {
    tracing::info!("starting to {what}...");
    match f() {
        Ok(value) => {
            tracing::info!("successfully {what}");
            Some(value)
        }
        Err(err @ PortError::AmbiguousIdentity(_)) => {
            report.warn(format!("failed to {what}: {err}"));
            None
        }
        Err(err) => {
            report.error(format!("failed to {what}: {err}"));
            None
        }
    }
}
