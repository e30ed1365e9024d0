//! Sources of raw metric data.
//!
//! A [`MetricSource`] produces raw counter snapshots and gauges for the rate
//! engine; it owns all knowledge of where the numbers come from. The Linux
//! implementation reads procfs tables; on every other platform a no-op source
//! returns empty-but-valid output so callers never have to special-case the
//! OS.

mod linux;

pub use linux::LinuxSource;

use mockall::automock;

use crate::error::Result;
use crate::snapshot::{unix_now, Gauge, RawSnapshot};

/// Supplier of raw kernel counters and point-in-time gauges.
#[cfg_attr(test, automock)]
pub trait MetricSource: Send {
    /// Raw cumulative disk I/O counters per retained block device.
    fn disk_raw(&self) -> Result<RawSnapshot>;

    /// Raw cumulative network I/O counters per interface.
    fn net_raw(&self) -> Result<RawSnapshot>;

    /// Current memory figures, passed through with no rate logic.
    fn memory_gauge(&self) -> Result<Gauge>;

    /// Current load averages and process count.
    fn loadavg_gauge(&self) -> Result<Gauge>;
}

/// Source for platforms without a supported kernel counter interface: every
/// reader returns an empty result rather than an error.
#[derive(Debug, Default)]
pub struct UnsupportedSource;

impl MetricSource for UnsupportedSource {
    fn disk_raw(&self) -> Result<RawSnapshot> {
        Ok(RawSnapshot::empty(unix_now()))
    }

    fn net_raw(&self) -> Result<RawSnapshot> {
        Ok(RawSnapshot::empty(unix_now()))
    }

    fn memory_gauge(&self) -> Result<Gauge> {
        Ok(Gauge::new())
    }

    fn loadavg_gauge(&self) -> Result<Gauge> {
        Ok(Gauge::new())
    }
}

/// Picks the metric source for the platform this crate was built for.
pub fn system_source() -> Box<dyn MetricSource> {
    if cfg!(target_os = "linux") {
        Box::new(LinuxSource::new())
    } else {
        Box::new(UnsupportedSource)
    }
}
