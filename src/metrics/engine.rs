//! Per-container telemetry history and the background poller that feeds it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::debug;

use super::ring::RingBuffer;
use super::sample::{MetricsSample, RateSample};
use crate::backend::SharedBackend;
use crate::error::{BackendError, DashboardError};
use crate::event::{AppEvent, EventSender};

/// Latest computed values, shown in panel captions.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CurrentValues {
    pub cpu_percent: f64,
    pub mem_usage: u64,
    pub mem_limit: u64,
    pub mem_percent: f64,
    pub rates: RateSample,
}

/// Copy of the engine's state, taken under the lock and rendered without it.
#[derive(Clone, Debug, Default)]
pub struct MetricsSnapshot {
    pub cpu: Vec<f64>,
    pub mem: Vec<f64>,
    pub net_rx: Vec<f64>,
    pub net_tx: Vec<f64>,
    pub disk_read: Vec<f64>,
    pub disk_write: Vec<f64>,
    pub current: CurrentValues,
    pub last_raw: Option<serde_json::Value>,
    pub ticks: u64,
}

/// History of one container's telemetry.
///
/// On the first sample there is nothing to difference against, so CPU and
/// the four rate series get no entry and the current CPU reads 0. Memory
/// percent is absolute and is recorded from the first sample on.
#[derive(Debug)]
pub struct MetricsEngine {
    previous: Option<MetricsSample>,
    last_raw: Option<serde_json::Value>,
    cpu: RingBuffer<f64>,
    mem: RingBuffer<f64>,
    net_rx: RingBuffer<f64>,
    net_tx: RingBuffer<f64>,
    disk_read: RingBuffer<f64>,
    disk_write: RingBuffer<f64>,
    current: CurrentValues,
    ticks: u64,
}

impl MetricsEngine {
    pub fn new(capacity: usize) -> Self {
        Self {
            previous: None,
            last_raw: None,
            cpu: RingBuffer::new(capacity),
            mem: RingBuffer::new(capacity),
            net_rx: RingBuffer::new(capacity),
            net_tx: RingBuffer::new(capacity),
            disk_read: RingBuffer::new(capacity),
            disk_write: RingBuffer::new(capacity),
            current: CurrentValues::default(),
            ticks: 0,
        }
    }

    /// Parse and record one raw stats document.
    pub fn ingest(&mut self, raw: serde_json::Value) -> Result<(), DashboardError> {
        let Some(sample) = MetricsSample::from_stats(&raw) else {
            return Err(DashboardError::Stream {
                source: BackendError::Malformed("stats document: no cpu_stats".into()),
            });
        };
        self.record(sample);
        self.last_raw = Some(raw);
        Ok(())
    }

    pub fn record(&mut self, sample: MetricsSample) {
        self.ticks += 1;

        let mem_percent = sample.mem_percent();
        self.mem.push(mem_percent);
        self.current.mem_usage = sample.mem_usage;
        self.current.mem_limit = sample.mem_limit;
        self.current.mem_percent = mem_percent;

        match self.previous {
            None => {
                self.current.cpu_percent = 0.0;
                self.current.rates = RateSample::default();
            }
            Some(prev) => {
                let cpu = sample.cpu_percent_since(&prev);
                let rates = sample.rates_since(&prev);
                self.cpu.push(cpu);
                self.net_rx.push(rates.net_rx);
                self.net_tx.push(rates.net_tx);
                self.disk_read.push(rates.disk_read);
                self.disk_write.push(rates.disk_write);
                self.current.cpu_percent = cpu;
                self.current.rates = rates;
            }
        }
        self.previous = Some(sample);
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cpu: self.cpu.to_vec(),
            mem: self.mem.to_vec(),
            net_rx: self.net_rx.to_vec(),
            net_tx: self.net_tx.to_vec(),
            disk_read: self.disk_read.to_vec(),
            disk_write: self.disk_write.to_vec(),
            current: self.current,
            last_raw: self.last_raw.clone(),
            ticks: self.ticks,
        }
    }
}

pub type SharedEngine = Arc<Mutex<MetricsEngine>>;

/// Cancels the poll loop when killed or dropped.
pub struct PollerHandle {
    stop: Arc<AtomicBool>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl PollerHandle {
    pub fn cancel(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Poll `id`'s stats every `interval`, feeding `engine`. A failed tick is
/// skipped and the previous display stays.
pub fn spawn_poller(
    handle: &tokio::runtime::Handle,
    backend: SharedBackend,
    id: String,
    engine: SharedEngine,
    interval: Duration,
    generation: u64,
    tx: EventSender,
) -> PollerHandle {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);

    let task = handle.spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if flag.load(Ordering::Relaxed) {
                break;
            }
            let raw = match backend.stats(&id).await {
                Ok(raw) => raw,
                Err(e) => {
                    debug!(container = %id, error = %e, "stats tick skipped");
                    continue;
                }
            };
            if flag.load(Ordering::Relaxed) {
                break;
            }
            let recorded = match engine.lock() {
                Ok(mut engine) => engine.ingest(raw),
                Err(_) => break,
            };
            if let Err(e) = recorded {
                debug!(container = %id, error = %e, "stats tick skipped");
                continue;
            }
            if tx.send(AppEvent::MetricsUpdated { generation }).is_err() {
                break;
            }
        }
        debug!(container = %id, "metrics poller stopped");
    });

    PollerHandle {
        stop,
        task: Some(task),
    }
}
