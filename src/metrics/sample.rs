use serde_json::Value;

/// Cumulative counters read from one stats snapshot.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MetricsSample {
    pub cpu_total: u64,
    pub system_cpu: u64,
    pub online_cpus: u64,
    pub mem_usage: u64,
    pub mem_limit: u64,
    pub net_rx: u64,
    pub net_tx: u64,
    pub disk_read: u64,
    pub disk_write: u64,
}

/// Per-tick deltas of the byte counters, clamped at zero.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RateSample {
    pub net_rx: f64,
    pub net_tx: f64,
    pub disk_read: f64,
    pub disk_write: f64,
}

fn u64_at(v: &Value, path: &[&str]) -> Option<u64> {
    let mut cur = v;
    for key in path {
        cur = cur.get(key)?;
    }
    cur.as_u64()
}

impl MetricsSample {
    /// Read counters from an engine stats document. Returns `None` when the
    /// document has no CPU section at all.
    pub fn from_stats(raw: &Value) -> Option<Self> {
        let cpu_stats = raw.get("cpu_stats")?;
        let cpu_total = u64_at(cpu_stats, &["cpu_usage", "total_usage"]).unwrap_or(0);
        let system_cpu = u64_at(cpu_stats, &["system_cpu_usage"]).unwrap_or(0);
        let online_cpus = u64_at(cpu_stats, &["online_cpus"])
            .filter(|n| *n > 0)
            .or_else(|| {
                cpu_stats
                    .get("cpu_usage")
                    .and_then(|u| u.get("percpu_usage"))
                    .and_then(Value::as_array)
                    .map(|a| a.len() as u64)
                    .filter(|n| *n > 0)
            })
            .unwrap_or(1);

        let mem = raw.get("memory_stats");
        let usage = mem.and_then(|m| u64_at(m, &["usage"])).unwrap_or(0);
        // page cache is not working-set memory; v1 and v2 cgroups name it differently
        let cache = mem
            .and_then(|m| {
                u64_at(m, &["stats", "total_inactive_file"])
                    .or_else(|| u64_at(m, &["stats", "inactive_file"]))
            })
            .unwrap_or(0);
        let mem_usage = if cache < usage { usage - cache } else { usage };
        let mem_limit = mem.and_then(|m| u64_at(m, &["limit"])).unwrap_or(0);

        let (mut net_rx, mut net_tx) = (0, 0);
        if let Some(nets) = raw.get("networks").and_then(Value::as_object) {
            for iface in nets.values() {
                net_rx += u64_at(iface, &["rx_bytes"]).unwrap_or(0);
                net_tx += u64_at(iface, &["tx_bytes"]).unwrap_or(0);
            }
        }

        let (mut disk_read, mut disk_write) = (0, 0);
        if let Some(entries) = raw
            .get("blkio_stats")
            .and_then(|b| b.get("io_service_bytes_recursive"))
            .and_then(Value::as_array)
        {
            for e in entries {
                let value = u64_at(e, &["value"]).unwrap_or(0);
                match e.get("op").and_then(Value::as_str).map(str::to_lowercase).as_deref() {
                    Some("read") => disk_read += value,
                    Some("write") => disk_write += value,
                    _ => {}
                }
            }
        }

        Some(Self {
            cpu_total,
            system_cpu,
            online_cpus,
            mem_usage,
            mem_limit,
            net_rx,
            net_tx,
            disk_read,
            disk_write,
        })
    }

    pub fn mem_percent(&self) -> f64 {
        if self.mem_limit == 0 {
            0.0
        } else {
            self.mem_usage as f64 / self.mem_limit as f64 * 100.0
        }
    }

    /// CPU percent over the interval since `prev`. Counter resets give 0.
    pub fn cpu_percent_since(&self, prev: &MetricsSample) -> f64 {
        let cpu_delta = self.cpu_total.saturating_sub(prev.cpu_total) as f64;
        let system_delta = self.system_cpu.saturating_sub(prev.system_cpu) as f64;
        if system_delta > 0.0 && cpu_delta > 0.0 {
            cpu_delta / system_delta * self.online_cpus as f64 * 100.0
        } else {
            0.0
        }
    }

    pub fn rates_since(&self, prev: &MetricsSample) -> RateSample {
        RateSample {
            net_rx: self.net_rx.saturating_sub(prev.net_rx) as f64,
            net_tx: self.net_tx.saturating_sub(prev.net_tx) as f64,
            disk_read: self.disk_read.saturating_sub(prev.disk_read) as f64,
            disk_write: self.disk_write.saturating_sub(prev.disk_write) as f64,
        }
    }
}
