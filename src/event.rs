//! Messages from background tasks to the render loop. Workers never touch
//! render-owned state; they send one of these and the loop applies it.

use crate::actions::ActionRun;
use crate::error::BackendResult;
use crate::model::Resource;
use crate::scheduler::FetchTicket;

#[derive(Debug)]
pub enum AppEvent {
    Fetched {
        ticket: FetchTicket,
        result: BackendResult<Vec<Resource>>,
    },
    ActionFinished(ActionRun),
    /// Text for the inspector opened with `generation`.
    Described {
        generation: u64,
        result: BackendResult<String>,
    },
    /// A metrics poller pushed a sample; only a redraw is needed.
    MetricsUpdated { generation: u64 },
}

pub type EventSender = tokio::sync::mpsc::UnboundedSender<AppEvent>;
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<AppEvent>;

pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}
