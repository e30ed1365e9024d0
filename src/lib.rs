//! Linux Metrics - a Rust library for collecting Linux system metrics
//!
//! This crate samples raw, monotonically-increasing kernel counters from
//! procfs (disk I/O, network I/O) and converts them into per-second rates,
//! handling counter wraparound transparently. Point-in-time gauges (memory,
//! load average) are reported as-is, with no rate derivation.
//!
//! # Features
//!
//! - **Disk rates**: reads/s, writes/s, bytes_read/s, bytes_written/s per
//!   block device, from `/proc/diskstats`
//! - **Network rates**: bytes and packets per second per interface, from
//!   `/proc/net/dev`
//! - **Memory gauge**: `/proc/meminfo` passed through untouched
//! - **Load average gauge**: 1/5/15-minute load and process count from
//!   `/proc/loadavg`
//! - **Wraparound handling**: counter deltas stay correct across a wrap at
//!   the host word size (2^32 - 1 or 2^64 - 1)
//! - **Periodic agent**: a tokio task that polls everything on an interval
//!   and publishes updates over a channel
//!
//! # Examples
//!
//! ```no_run
//! use linux_metrics::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let mut stats = SystemStats::new();
//!
//!     // Rate domains need two samples; the very first poll has no history.
//!     assert!(stats.diskstats()?.is_none());
//!
//!     std::thread::sleep(std::time::Duration::from_secs(1));
//!     if let Some(rates) = stats.diskstats()? {
//!         for (device, io) in &rates {
//!             println!("{device}: {:.0} bytes_read/s", io["bytes_read/s"]);
//!         }
//!     }
//!
//!     // Gauges are available immediately.
//!     println!("load: {}", stats.loadavg()?["1"]);
//!     Ok(())
//! }
//! ```
//!
//! # Unsupported platforms
//!
//! On anything that is not Linux, [`source::system_source`] hands back a
//! no-op source whose readers return empty-but-valid data, so callers get
//! degenerate output instead of errors.
//!
//! # Thread safety
//!
//! The engine itself does no locking: each poll is a synchronous
//! read-compute-store sequence, and at most one poll per domain may be in
//! flight at a time. [`agent::StatsAgent`] wraps the engine in a mutex when
//! it has to be shared with a background task.

pub mod agent;
pub mod counter;
pub mod history;
pub mod rate;
pub mod snapshot;
pub mod source;
pub mod stats;

mod error;

pub use error::{Error, Result};

/// Re-export of the commonly used types.
pub mod prelude {
    pub use crate::agent::{Operation, StatsAgent, StatsService, StatsUpdate};
    pub use crate::counter::CounterWidth;
    pub use crate::snapshot::{Gauge, RateSnapshot, RawSnapshot};
    pub use crate::source::{LinuxSource, MetricSource};
    pub use crate::stats::SystemStats;
    pub use crate::{Error, Result};
}
