//! Sliding one-deep history of raw snapshots per metric domain.

use crate::rate::{RateCalculator, RateSpec};
use crate::snapshot::{RateSnapshot, RawSnapshot};

/// Holds the most recent raw snapshot for one metric domain and turns each
/// newly polled snapshot into per-second rates against it.
///
/// Each domain (disk, network) gets its own independent instance. There is no
/// internal locking; callers must not run two polls of the same domain
/// concurrently.
#[derive(Debug)]
pub struct SampleHistory {
    spec: RateSpec,
    prior: Option<RawSnapshot>,
}

impl SampleHistory {
    pub fn new(spec: RateSpec) -> Self {
        Self { spec, prior: None }
    }

    /// Feeds the next raw snapshot into the history.
    ///
    /// The first snapshot ever seen is stored and yields `None` — there is
    /// nothing to compare against yet. Every later snapshot is compared to
    /// the stored one, then replaces it.
    pub fn advance(&mut self, calc: &RateCalculator, current: RawSnapshot) -> Option<RateSnapshot> {
        let rates = self
            .prior
            .as_ref()
            .map(|prior| calc.rates(&current, prior, self.spec));
        self.prior = Some(current);
        rates
    }
}
