//! Data shapes shared between the metric sources and the rate engine.

use std::collections::{BTreeMap, HashMap};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

/// Raw cumulative counters for one device or network interface, keyed by
/// counter name (e.g. `reads`, `sectors_read`, `receive_bytes`).
pub type CounterSet = HashMap<String, u64>;

/// Derived per-second rates, keyed by device or interface name, then by rate
/// name (e.g. `reads/s`, `bytes_read/s`).
pub type RateSnapshot = HashMap<String, HashMap<String, f64>>;

/// A point-in-time reading with no rate derivation (memory, load average).
/// Gauges carry no timestamp so that two reads over unchanged data compare
/// equal.
pub type Gauge = BTreeMap<String, String>;

/// One reading of raw kernel counters across a whole metric domain, tagged
/// with the moment it was taken.
///
/// Produced fresh on every poll by a [`MetricSource`](crate::source::MetricSource)
/// and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawSnapshot {
    /// Sample time in seconds since the Unix epoch.
    pub timestamp: f64,

    /// Counters per device or interface name.
    pub entries: HashMap<String, CounterSet>,
}

impl RawSnapshot {
    pub fn new(timestamp: f64, entries: HashMap<String, CounterSet>) -> Self {
        Self { timestamp, entries }
    }

    /// A snapshot with no entries, as returned on platforms without a usable
    /// kernel counter source.
    pub fn empty(timestamp: f64) -> Self {
        Self { timestamp, entries: HashMap::new() }
    }
}

/// Current wall-clock time as fractional seconds since the Unix epoch.
pub(crate) fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_snapshot_has_timestamp_only() {
        let snap = RawSnapshot::empty(1234.5);
        assert_eq!(snap.timestamp, 1234.5);
        assert!(snap.entries.is_empty());
    }

    #[test]
    fn unix_now_is_positive() {
        assert!(unix_now() > 0.0);
    }
}
