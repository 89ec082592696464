//! The adapter boundary. The state engine only sees this trait; the
//! bollard-backed implementation lives in `docker`, with the few swarm
//! operations the API client lacks shelled out through `swarm`.

mod docker;
pub mod format;
mod swarm;

use std::process::Child;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::future::BoxFuture;
use tokio::sync::mpsc;

use crate::error::BackendResult;
use crate::model::{MutationCommand, Resource, ResourceKind};

pub use docker::DockerBackend;
pub use swarm::is_docker_cli_available;

/// Parameters of a log tail request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogOptions {
    pub timestamps: bool,
    pub tail: u32,
}

/// Everything the dashboard needs from the container engine.
pub trait Backend: Send + Sync {
    fn list(&self, kind: ResourceKind) -> BoxFuture<'_, BackendResult<Vec<Resource>>>;

    fn mutate<'a>(
        &'a self,
        kind: ResourceKind,
        id: &'a str,
        command: MutationCommand,
    ) -> BoxFuture<'a, BackendResult<()>>;

    /// One raw stats snapshot, cumulative counters included.
    fn stats<'a>(&'a self, id: &'a str) -> BoxFuture<'a, BackendResult<serde_json::Value>>;

    fn describe<'a>(&'a self, kind: ResourceKind, id: &'a str) -> BoxFuture<'a, BackendResult<String>>;

    /// `KEY=value` entries of a container's configured environment.
    fn env<'a>(&'a self, id: &'a str) -> BoxFuture<'a, BackendResult<Vec<String>>>;

    /// Start tailing logs. The returned handle owns the background reader.
    fn stream_logs(
        &self,
        kind: ResourceKind,
        id: &str,
        options: LogOptions,
        handle: &tokio::runtime::Handle,
    ) -> LogStreamHandle;
}

pub type SharedBackend = Arc<dyn Backend>;

/// A follower process shared between its reader thread and the handle.
pub type SharedChild = Arc<Mutex<Option<Child>>>;

/// Receiving end of a log tail plus a kill switch for its reader.
pub struct LogStreamHandle {
    pub receiver: mpsc::UnboundedReceiver<String>,
    kill_flag: Arc<AtomicBool>,
    task: Option<tokio::task::JoinHandle<()>>,
    child: Option<SharedChild>,
}

impl LogStreamHandle {
    pub fn new(
        receiver: mpsc::UnboundedReceiver<String>,
        kill_flag: Arc<AtomicBool>,
        task: Option<tokio::task::JoinHandle<()>>,
    ) -> Self {
        Self {
            receiver,
            kill_flag,
            task,
            child: None,
        }
    }

    /// Tie an external follower process to this handle; `kill` terminates it
    /// so a reader blocked on a quiet pipe wakes up.
    pub fn with_child(mut self, child: SharedChild) -> Self {
        self.child = Some(child);
        self
    }

    /// A handle with no reader behind it; `send` on the returned sender feeds it.
    pub fn detached() -> (mpsc::UnboundedSender<String>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self::new(rx, Arc::new(AtomicBool::new(false)), None))
    }

    pub fn kill(&mut self) {
        self.kill_flag.store(true, Ordering::Relaxed);
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if let Some(child) = self.child.take() {
            swarm::terminate(&child);
        }
        self.receiver.close();
    }

    #[cfg(test)]
    fn child_slot(&self) -> Option<SharedChild> {
        self.child.clone()
    }
}

impl Drop for LogStreamHandle {
    fn drop(&mut self) {
        self.kill();
    }
}
