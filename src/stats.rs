//! The system statistics engine: one facade over the metric source, the rate
//! calculator and the per-domain sample histories.

use crate::error::Result;
use crate::history::SampleHistory;
use crate::rate::{RateCalculator, RateSpec};
use crate::snapshot::{Gauge, RateSnapshot};
use crate::source::MetricSource;

/// Samples raw kernel counters from a [`MetricSource`] and derives per-second
/// I/O rates, keeping one prior snapshot per rate domain.
///
/// Each poll is a synchronous read-compute-store sequence. The engine does no
/// locking of its own; when shared between threads, wrap it in a mutex so at
/// most one poll per domain is in flight.
pub struct SystemStats {
    source: Box<dyn MetricSource>,
    calc: RateCalculator,
    disk_history: SampleHistory,
    net_history: SampleHistory,
}

impl SystemStats {
    /// An engine reading from the platform's native metric source.
    pub fn new() -> Self {
        Self::with_source(crate::source::system_source())
    }

    pub fn with_source(source: Box<dyn MetricSource>) -> Self {
        Self {
            source,
            calc: RateCalculator::new(),
            disk_history: SampleHistory::new(RateSpec::Disk),
            net_history: SampleHistory::new(RateSpec::Network),
        }
    }

    /// Per-second disk I/O rates since the previous call.
    ///
    /// Returns `Ok(None)` on the first call, when there is no prior sample to
    /// compute a delta against.
    pub fn diskstats(&mut self) -> Result<Option<RateSnapshot>> {
        let current = self.source.disk_raw()?;
        Ok(self.disk_history.advance(&self.calc, current))
    }

    /// Per-second network I/O rates since the previous call.
    ///
    /// Returns `Ok(None)` on the first call, independently of the disk
    /// history.
    pub fn netstats(&mut self) -> Result<Option<RateSnapshot>> {
        let current = self.source.net_raw()?;
        Ok(self.net_history.advance(&self.calc, current))
    }

    /// Current memory figures. A gauge: no history, no rate derivation, no
    /// state touched.
    pub fn memory(&self) -> Result<Gauge> {
        self.source.memory_gauge()
    }

    /// Current load averages and process count. A gauge as well.
    pub fn loadavg(&self) -> Result<Gauge> {
        self.source.loadavg_gauge()
    }
}

impl Default for SystemStats {
    fn default() -> Self {
        Self::new()
    }
}
