//! Conversion of raw counter snapshots into per-second rates.

use std::collections::HashMap;

use once_cell::sync::OnceCell;

use crate::counter::{self, CounterWidth};
use crate::snapshot::{CounterSet, RateSnapshot, RawSnapshot};

/// Disk sectors are assumed to be 512 bytes, always and everywhere.
const SECTOR_BYTES: u64 = 512;

/// Fixed disk counter-to-rate mapping: raw counter name, emitted rate name,
/// and the multiplier applied to the delta before dividing by the interval.
const DISK_RATES: &[(&str, &str, u64)] = &[
    ("sectors_read", "bytes_read/s", SECTOR_BYTES),
    ("sectors_written", "bytes_written/s", SECTOR_BYTES),
    ("reads", "reads/s", 1),
    ("writes", "writes/s", 1),
];

/// Which counter-to-rate mapping applies to a snapshot pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateSpec {
    /// Curated subset of `/proc/diskstats` counters, with sector counts
    /// scaled to bytes.
    Disk,
    /// Generic `<counter>/s` for every counter present on an interface.
    Network,
}

/// Derives per-second rates from pairs of raw counter snapshots.
///
/// The counter wrap modulus depends on the host word size; it is detected on
/// first use and cached for the lifetime of the calculator.
#[derive(Debug, Default)]
pub struct RateCalculator {
    width: OnceCell<CounterWidth>,
}

impl RateCalculator {
    pub fn new() -> Self {
        Self { width: OnceCell::new() }
    }

    /// A calculator with a fixed counter width instead of the detected one.
    pub fn with_width(width: CounterWidth) -> Self {
        let cell = OnceCell::new();
        cell.set(width).ok();
        Self { width: cell }
    }

    fn wrap_modulus(&self) -> u64 {
        self.width.get_or_init(CounterWidth::detect).wrap_modulus()
    }

    /// Computes per-second rates between two snapshots of one domain.
    ///
    /// `newer.timestamp` must be strictly greater than `older.timestamp`;
    /// this is a caller contract and is not checked here. Devices present in
    /// `newer` but absent from `older` are skipped (no history yet), and
    /// devices that disappeared from `newer` are dropped.
    pub fn rates(&self, newer: &RawSnapshot, older: &RawSnapshot, spec: RateSpec) -> RateSnapshot {
        let time_delta = newer.timestamp - older.timestamp;
        let modulus = self.wrap_modulus();

        let mut rates = RateSnapshot::new();
        for (name, current) in &newer.entries {
            if let Some(prior) = older.entries.get(name) {
                let per_device = match spec {
                    RateSpec::Disk => disk_rates(current, prior, time_delta, modulus),
                    RateSpec::Network => net_rates(current, prior, time_delta, modulus),
                };
                rates.insert(name.clone(), per_device);
            }
        }
        rates
    }
}

fn disk_rates(
    newer: &CounterSet,
    older: &CounterSet,
    time_delta: f64,
    modulus: u64,
) -> HashMap<String, f64> {
    let mut out = HashMap::new();
    for &(counter, rate_name, multiplier) in DISK_RATES {
        if let (Some(&new_val), Some(&old_val)) = (newer.get(counter), older.get(counter)) {
            let delta = counter::subtract(new_val, old_val, modulus);
            // Scale in floating point: a near-modulus sector delta times the
            // sector size would overflow u64.
            out.insert(rate_name.to_string(), delta as f64 * multiplier as f64 / time_delta);
        }
    }
    out
}

fn net_rates(
    newer: &CounterSet,
    older: &CounterSet,
    time_delta: f64,
    modulus: u64,
) -> HashMap<String, f64> {
    let mut out = HashMap::new();
    for (counter, &new_val) in newer {
        if let Some(&old_val) = older.get(counter) {
            let delta = counter::subtract(new_val, old_val, modulus);
            out.insert(format!("{counter}/s"), delta as f64 / time_delta);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn counters(pairs: &[(&str, u64)]) -> CounterSet {
        pairs.iter().map(|&(k, v)| (k.to_string(), v)).collect()
    }

    fn snapshot(timestamp: f64, name: &str, pairs: &[(&str, u64)]) -> RawSnapshot {
        let mut entries = HashMap::new();
        entries.insert(name.to_string(), counters(pairs));
        RawSnapshot::new(timestamp, entries)
    }

    #[test]
    fn disk_rates_scale_sectors_to_bytes() {
        let older = snapshot(
            100.0,
            "sda",
            &[
                ("reads", 10_000),
                ("writes", 5_000),
                ("sectors_written", 40_000),
                ("sectors_read", 200_000),
            ],
        );
        let newer = snapshot(
            102.0,
            "sda",
            &[
                ("reads", 20_000),
                ("writes", 10_000),
                ("sectors_written", 80_000),
                ("sectors_read", 400_000),
            ],
        );

        let calc = RateCalculator::with_width(CounterWidth::U32);
        let rates = calc.rates(&newer, &older, RateSpec::Disk);
        let sda = &rates["sda"];
        assert_eq!(sda["reads/s"], 5_000.0);
        assert_eq!(sda["writes/s"], 2_500.0);
        assert_eq!(sda["bytes_written/s"], 20_000.0 * 512.0);
        assert_eq!(sda["bytes_read/s"], 100_000.0 * 512.0);
    }

    #[test]
    fn net_rates_cover_every_present_counter() {
        let older = snapshot(
            50.0,
            "eth0",
            &[
                ("receive_bytes", 1_000),
                ("receive_packets", 200),
                ("sent_bytes", 2_000),
                ("sent_packets", 400),
            ],
        );
        let newer = snapshot(
            52.0,
            "eth0",
            &[
                ("receive_bytes", 2_000),
                ("receive_packets", 400),
                ("sent_bytes", 4_000),
                ("sent_packets", 800),
            ],
        );

        let calc = RateCalculator::with_width(CounterWidth::U64);
        let rates = calc.rates(&newer, &older, RateSpec::Network);
        let eth0 = &rates["eth0"];
        assert_eq!(eth0["receive_bytes/s"], 500.0);
        assert_eq!(eth0["receive_packets/s"], 100.0);
        assert_eq!(eth0["sent_bytes/s"], 1_000.0);
        assert_eq!(eth0["sent_packets/s"], 200.0);
    }

    #[test]
    fn wrapped_counter_still_yields_a_positive_rate() {
        let older = snapshot(0.0, "eth0", &[("receive_bytes", 4294967295 - 100)]);
        let newer = snapshot(2.0, "eth0", &[("receive_bytes", 123)]);

        let calc = RateCalculator::with_width(CounterWidth::U32);
        let rates = calc.rates(&newer, &older, RateSpec::Network);
        assert_eq!(rates["eth0"]["receive_bytes/s"], 223.0 / 2.0);
    }

    #[test]
    fn huge_sector_deltas_scale_without_overflow() {
        let older = snapshot(0.0, "sda", &[("sectors_read", 0)]);
        let newer = snapshot(2.0, "sda", &[("sectors_read", u64::MAX / 2)]);

        let calc = RateCalculator::with_width(CounterWidth::U64);
        let rates = calc.rates(&newer, &older, RateSpec::Disk);
        let expected = (u64::MAX / 2) as f64 * 512.0 / 2.0;
        assert_eq!(rates["sda"]["bytes_read/s"], expected);
    }

    #[test]
    fn devices_without_history_are_skipped() {
        let older = snapshot(0.0, "sda", &[("reads", 100)]);
        let mut newer = snapshot(1.0, "sda", &[("reads", 200)]);
        newer
            .entries
            .insert("sdb".to_string(), counters(&[("reads", 50)]));

        let calc = RateCalculator::with_width(CounterWidth::U64);
        let rates = calc.rates(&newer, &older, RateSpec::Disk);
        assert!(rates.contains_key("sda"));
        assert!(!rates.contains_key("sdb"));
    }

    #[test]
    fn disappeared_devices_are_dropped() {
        let mut older = snapshot(0.0, "sda", &[("reads", 100)]);
        older
            .entries
            .insert("sdb".to_string(), counters(&[("reads", 10)]));
        let newer = snapshot(1.0, "sda", &[("reads", 200)]);

        let calc = RateCalculator::with_width(CounterWidth::U64);
        let rates = calc.rates(&newer, &older, RateSpec::Disk);
        assert_eq!(rates.len(), 1);
        assert!(rates.contains_key("sda"));
    }

    #[test]
    fn counters_missing_on_either_side_emit_no_rate() {
        let older = snapshot(0.0, "sda", &[("reads", 100)]);
        let newer = snapshot(1.0, "sda", &[("reads", 200), ("writes", 50)]);

        let calc = RateCalculator::with_width(CounterWidth::U64);
        let rates = calc.rates(&newer, &older, RateSpec::Disk);
        let sda = &rates["sda"];
        assert_eq!(sda["reads/s"], 100.0);
        assert!(!sda.contains_key("writes/s"));
        assert!(!sda.contains_key("bytes_read/s"));
    }
}
