use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossterm::event::KeyCode;
use tracing::debug;

use super::KeyOutcome;
use crate::backend::SharedBackend;
use crate::event::EventSender;
use crate::metrics::{MetricsEngine, MetricsSnapshot, PollerHandle, SharedEngine, spawn_poller};

/// Live graphs for one container, fed by a background poller.
pub struct MetricsInspector {
    engine: SharedEngine,
    poller: Option<PollerHandle>,
    id: String,
    pub show_json: bool,
}

pub struct PollerSettings {
    pub interval: Duration,
    pub history: usize,
    pub generation: u64,
}

impl MetricsInspector {
    pub fn open(
        runtime: &tokio::runtime::Handle,
        backend: SharedBackend,
        id: &str,
        settings: PollerSettings,
        tx: EventSender,
    ) -> Self {
        let engine = Arc::new(Mutex::new(MetricsEngine::new(settings.history)));
        let poller = spawn_poller(
            runtime,
            backend,
            id.to_string(),
            Arc::clone(&engine),
            settings.interval,
            settings.generation,
            tx,
        );
        debug!(container = %id, interval_ms = settings.interval.as_millis() as u64, "metrics poller started");
        Self {
            engine,
            poller: Some(poller),
            id: id.to_string(),
            show_json: false,
        }
    }

    /// An inspector over an engine nothing polls.
    pub fn detached(id: &str, engine: SharedEngine) -> Self {
        Self {
            engine,
            poller: None,
            id: id.to_string(),
            show_json: false,
        }
    }

    /// Copy the histories out so rendering never holds the lock.
    pub fn snapshot(&self) -> MetricsSnapshot {
        match self.engine.lock() {
            Ok(engine) => engine.snapshot(),
            Err(poisoned) => poisoned.into_inner().snapshot(),
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) -> KeyOutcome {
        match code {
            KeyCode::Esc | KeyCode::Char('q') => KeyOutcome::Close,
            KeyCode::Char('t') => {
                self.show_json = !self.show_json;
                KeyOutcome::Consumed
            }
            _ => KeyOutcome::Ignored,
        }
    }

    pub fn close(&mut self) {
        if let Some(mut poller) = self.poller.take() {
            poller.cancel();
            debug!(container = %self.id, "metrics poller cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricsSample;

    #[test]
    fn snapshot_reflects_engine_and_toggle() {
        let engine = Arc::new(Mutex::new(MetricsEngine::new(10)));
        engine.lock().unwrap().record(MetricsSample {
            mem_usage: 50,
            mem_limit: 100,
            ..Default::default()
        });
        let mut inspector = MetricsInspector::detached("abc", Arc::clone(&engine));
        assert_eq!(inspector.snapshot().mem, vec![50.0]);
        assert_eq!(inspector.handle_key(KeyCode::Char('t')), KeyOutcome::Consumed);
        assert!(inspector.show_json);
        assert_eq!(inspector.handle_key(KeyCode::Esc), KeyOutcome::Close);
    }
}
