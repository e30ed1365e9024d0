//! Messaging adapter over the statistics engine.
//!
//! [`StatsService`] registers the four named operations (`diskstats`,
//! `memory`, `loadavg`, `netstats`) against the engine and answers them as
//! JSON values, ready for whatever transport the host embeds this crate in.
//! [`StatsAgent`] adds the periodic side: a background task that polls all
//! four operations on a fixed interval and publishes the results over a
//! channel.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::source::MetricSource;
use crate::stats::SystemStats;

/// The operations exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Diskstats,
    Memory,
    Loadavg,
    Netstats,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Diskstats,
        Operation::Memory,
        Operation::Loadavg,
        Operation::Netstats,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Diskstats => "diskstats",
            Operation::Memory => "memory",
            Operation::Loadavg => "loadavg",
            Operation::Netstats => "netstats",
        }
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "diskstats" => Ok(Operation::Diskstats),
            "memory" => Ok(Operation::Memory),
            "loadavg" => Ok(Operation::Loadavg),
            "netstats" => Ok(Operation::Netstats),
            other => Err(Error::unknown_operation(other)),
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One published round of all four operations.
#[derive(Debug, Clone, Serialize)]
pub struct StatsUpdate {
    /// JSON null on the first cycle, before any disk rate exists.
    pub diskstats: Value,
    pub memory: Value,
    pub loadavg: Value,
    /// JSON null on the first cycle, before any network rate exists.
    pub netstats: Value,
}

/// Name-addressable facade over [`SystemStats`], answering in JSON.
pub struct StatsService {
    stats: SystemStats,
}

impl StatsService {
    pub fn new(stats: SystemStats) -> Self {
        Self { stats }
    }

    /// Runs one named operation. Rate operations answer JSON null until they
    /// have two samples to compare.
    pub fn dispatch(&mut self, op: Operation) -> Result<Value> {
        let value = match op {
            Operation::Diskstats => to_value(self.stats.diskstats()?),
            Operation::Memory => to_value(self.stats.memory()?),
            Operation::Loadavg => to_value(self.stats.loadavg()?),
            Operation::Netstats => to_value(self.stats.netstats()?),
        }?;
        debug!(%op, "operation dispatched");
        Ok(value)
    }

    /// Runs all four operations as one update.
    fn collect(&mut self) -> Result<StatsUpdate> {
        Ok(StatsUpdate {
            diskstats: self.dispatch(Operation::Diskstats)?,
            memory: self.dispatch(Operation::Memory)?,
            loadavg: self.dispatch(Operation::Loadavg)?,
            netstats: self.dispatch(Operation::Netstats)?,
        })
    }
}

fn to_value<T: Serialize>(value: T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| Error::invalid_data(e.to_string()))
}

/// Background publisher of [`StatsUpdate`]s on a fixed interval.
///
/// The service is shared behind a mutex so on-demand [`StatsService::dispatch`]
/// calls and the periodic task serialize their polls, keeping the at-most-one
/// in-flight-poll-per-domain contract of the engine.
pub struct StatsAgent {
    service: Arc<Mutex<StatsService>>,
    updates: mpsc::Receiver<StatsUpdate>,
    task: JoinHandle<()>,
}

impl StatsAgent {
    /// Spawns the polling task. Must be called inside a tokio runtime.
    pub fn spawn(source: Box<dyn MetricSource>, interval: Duration) -> Self {
        let service = Arc::new(Mutex::new(StatsService::new(SystemStats::with_source(source))));
        let (tx, rx) = mpsc::channel(16);

        let worker = Arc::clone(&service);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let update = match worker.lock().collect() {
                    Ok(update) => update,
                    Err(e) => {
                        // A failed read skips this cycle; the next tick
                        // retries from fresh data.
                        warn!(error = %e, "stats poll failed, skipping cycle");
                        continue;
                    }
                };
                if tx.send(update).await.is_err() {
                    break;
                }
            }
        });

        Self { service, updates: rx, task }
    }

    /// Waits for the next published update. Returns `None` once the agent has
    /// stopped.
    pub async fn next_update(&mut self) -> Option<StatsUpdate> {
        self.updates.recv().await
    }

    /// Handle for answering named operations on demand, between ticks.
    pub fn service(&self) -> Arc<Mutex<StatsService>> {
        Arc::clone(&self.service)
    }

    /// Stops the polling task.
    pub fn stop(self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{Gauge, RawSnapshot};
    use crate::source::{MockMetricSource, UnsupportedSource};
    use std::collections::HashMap;

    #[test]
    fn operation_names_round_trip() {
        for op in Operation::ALL {
            assert_eq!(op.as_str().parse::<Operation>().unwrap(), op);
        }
    }

    #[test]
    fn unknown_operation_name_is_rejected() {
        let err = "cpustats".parse::<Operation>().unwrap_err();
        assert!(matches!(err, Error::UnknownOperation(ref name) if name == "cpustats"));
    }

    #[test]
    fn rate_operations_answer_null_until_history_exists() {
        let mut source = MockMetricSource::new();
        let mut timestamps = vec![2.0, 0.0];
        source.expect_disk_raw().times(2).returning(move || {
            let t = timestamps.pop().unwrap();
            let counters = HashMap::from([("reads".to_string(), (t * 100.0) as u64)]);
            Ok(RawSnapshot::new(t, HashMap::from([("sda".to_string(), counters)])))
        });

        let mut service = StatsService::new(SystemStats::with_source(Box::new(source)));
        assert_eq!(service.dispatch(Operation::Diskstats).unwrap(), Value::Null);

        let second = service.dispatch(Operation::Diskstats).unwrap();
        assert_eq!(second["sda"]["reads/s"], 100.0);
    }

    #[test]
    fn gauge_operations_answer_objects() {
        let mut source = MockMetricSource::new();
        source
            .expect_memory_gauge()
            .returning(|| Ok(Gauge::from([("MemTotal".to_string(), "1024kB".to_string())])));
        source
            .expect_loadavg_gauge()
            .returning(|| Ok(Gauge::from([("processes".to_string(), "185".to_string())])));

        let mut service = StatsService::new(SystemStats::with_source(Box::new(source)));
        assert_eq!(service.dispatch(Operation::Memory).unwrap()["MemTotal"], "1024kB");
        assert_eq!(service.dispatch(Operation::Loadavg).unwrap()["processes"], "185");
    }

    #[tokio::test]
    async fn agent_publishes_periodic_updates() {
        let mut agent = StatsAgent::spawn(Box::new(UnsupportedSource), Duration::from_millis(5));

        let first = agent.next_update().await.unwrap();
        assert_eq!(first.diskstats, Value::Null);
        assert_eq!(first.netstats, Value::Null);
        assert_eq!(first.memory, serde_json::json!({}));

        // From the second cycle on, rate domains have history; the
        // unsupported source has no devices, so the rates are empty objects
        // rather than null.
        let second = agent.next_update().await.unwrap();
        assert_eq!(second.diskstats, serde_json::json!({}));
        assert_eq!(second.netstats, serde_json::json!({}));

        agent.stop();
    }

    #[tokio::test]
    async fn agent_skips_cycles_when_a_read_fails() {
        let mut source = MockMetricSource::new();
        let mut failed_once = false;
        source.expect_disk_raw().returning(move || {
            if !failed_once {
                failed_once = true;
                Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into())
            } else {
                Ok(RawSnapshot::empty(crate::snapshot::unix_now()))
            }
        });
        source.expect_net_raw().returning(|| Ok(RawSnapshot::empty(crate::snapshot::unix_now())));
        source.expect_memory_gauge().returning(|| Ok(Gauge::new()));
        source.expect_loadavg_gauge().returning(|| Ok(Gauge::new()));

        let mut agent = StatsAgent::spawn(Box::new(source), Duration::from_millis(5));

        // The first cycle fails on diskstats and publishes nothing; the next
        // successful cycle is the first update we see, and its disk history
        // only started on that cycle.
        let update = agent.next_update().await.unwrap();
        assert_eq!(update.diskstats, Value::Null);

        agent.stop();
    }
}
