//! Procfs-backed metric source.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::error::{Error, Result};
use crate::snapshot::{unix_now, CounterSet, Gauge, RawSnapshot};
use crate::source::MetricSource;

/// Block device name prefixes worth reporting: SCSI/SATA, IDE, virtio, Xen,
/// NVMe and device-mapper disks. Everything else in `/proc/diskstats` (ram,
/// loop, sr, ...) is noise for I/O rate purposes.
const DEVICE_PREFIXES: &[&str] = &["sd", "hd", "vd", "xvd", "nvme", "dm-"];

/// Words that identify the `/proc/net/dev` header block.
const NET_HEADER_WORDS: &[&str] = &["inter", "face", "receive", "transmit", "bytes"];

/// Reads raw counters and gauges from the Linux procfs.
#[derive(Debug, Clone)]
pub struct LinuxSource {
    proc_root: PathBuf,
}

impl Default for LinuxSource {
    fn default() -> Self {
        Self::new()
    }
}

impl LinuxSource {
    pub fn new() -> Self {
        Self::with_root("/proc")
    }

    /// A source rooted somewhere other than `/proc`, for tests and chroots.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { proc_root: root.into() }
    }

    fn read(&self, name: &str) -> Result<String> {
        let path = self.proc_root.join(name);
        debug!(path = %path.display(), "reading procfs table");
        Ok(fs::read_to_string(path)?)
    }
}

impl MetricSource for LinuxSource {
    fn disk_raw(&self) -> Result<RawSnapshot> {
        parse_diskstats(&self.read("diskstats")?, unix_now())
    }

    fn net_raw(&self) -> Result<RawSnapshot> {
        parse_net_dev(&self.read("net/dev")?, unix_now())
    }

    fn memory_gauge(&self) -> Result<Gauge> {
        Ok(parse_meminfo(&self.read("meminfo")?))
    }

    fn loadavg_gauge(&self) -> Result<Gauge> {
        parse_loadavg(&self.read("loadavg")?)
    }
}

fn parse_counter(field: &str, table: &str) -> Result<u64> {
    field
        .parse()
        .map_err(|_| Error::invalid_data(format!("bad counter value {field:?} in {table}")))
}

/// Parses `/proc/diskstats`. Line tokens are
/// `major minor name reads reads_merged sectors_read time_reading writes
/// writes_merged sectors_written time_writing ...`; only the four counters the
/// rate engine uses are kept, and only for recognised disk devices.
fn parse_diskstats(content: &str, timestamp: f64) -> Result<RawSnapshot> {
    let mut entries = HashMap::new();
    for line in content.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 10 {
            continue;
        }
        let name = fields[2];
        if !DEVICE_PREFIXES.iter().any(|p| name.starts_with(p)) {
            continue;
        }
        let mut counters = CounterSet::new();
        counters.insert("reads".to_string(), parse_counter(fields[3], "diskstats")?);
        counters.insert("sectors_read".to_string(), parse_counter(fields[5], "diskstats")?);
        counters.insert("writes".to_string(), parse_counter(fields[7], "diskstats")?);
        counters.insert("sectors_written".to_string(), parse_counter(fields[9], "diskstats")?);
        entries.insert(name.to_string(), counters);
    }
    Ok(RawSnapshot::new(timestamp, entries))
}

/// Parses `/proc/net/dev`. Header lines are recognised by keyword; data lines
/// are `name: rx_bytes rx_packets ... tx_bytes tx_packets ...` where the
/// colon may or may not be followed by a space.
fn parse_net_dev(content: &str, timestamp: f64) -> Result<RawSnapshot> {
    let mut entries = HashMap::new();
    for line in content.lines() {
        let lower = line.to_lowercase();
        if NET_HEADER_WORDS.iter().any(|w| lower.contains(w)) {
            continue;
        }
        let Some((name, rest)) = line.split_once(':') else {
            continue;
        };
        let fields: Vec<&str> = rest.split_whitespace().collect();
        if fields.len() < 10 {
            continue;
        }
        let mut counters = CounterSet::new();
        counters.insert("receive_bytes".to_string(), parse_counter(fields[0], "net/dev")?);
        counters.insert("receive_packets".to_string(), parse_counter(fields[1], "net/dev")?);
        counters.insert("sent_bytes".to_string(), parse_counter(fields[8], "net/dev")?);
        counters.insert("sent_packets".to_string(), parse_counter(fields[9], "net/dev")?);
        entries.insert(name.trim().to_string(), counters);
    }
    Ok(RawSnapshot::new(timestamp, entries))
}

/// Parses `/proc/meminfo` into a pass-through gauge. Values keep their unit
/// suffix with internal whitespace collapsed (`"250692 kB"` -> `"250692kB"`).
fn parse_meminfo(content: &str) -> Gauge {
    let mut gauge = Gauge::new();
    for line in content.lines() {
        if let Some((key, value)) = line.split_once(':') {
            gauge.insert(key.trim().to_string(), value.split_whitespace().collect());
        }
    }
    gauge
}

/// Parses `/proc/loadavg`: three load averages keyed `1`, `5` and `10`, plus
/// `processes` taken from the trailing segment of the `running/total` field,
/// i.e. the total number of kernel scheduling entities.
fn parse_loadavg(content: &str) -> Result<Gauge> {
    let line = content
        .lines()
        .find(|l| !l.trim().is_empty())
        .ok_or_else(|| Error::invalid_data("empty loadavg"))?;
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 4 {
        return Err(Error::invalid_data(format!("short loadavg line {line:?}")));
    }

    let mut gauge = Gauge::new();
    gauge.insert("1".to_string(), fields[0].to_string());
    gauge.insert("5".to_string(), fields[1].to_string());
    gauge.insert("10".to_string(), fields[2].to_string());
    let total = fields[3].rsplit('/').next().unwrap_or(fields[3]);
    gauge.insert("processes".to_string(), total.to_string());
    Ok(gauge)
}
