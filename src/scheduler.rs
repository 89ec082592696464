//! Refresh timing and staleness checks for table fetches.
//!
//! The front page has an identity (`Page` plus an epoch bumped on every
//! navigation). A fetch carries the identity it was dispatched for and is
//! checked against the current one when its result arrives, so no
//! cancellation is needed to keep stale rows off screen.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::backend::SharedBackend;
use crate::event::{AppEvent, EventSender};
use crate::model::{Page, ResourceKind};

/// Identity of the page a fetch was dispatched for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchTicket {
    pub kind: ResourceKind,
    pub epoch: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyDecision {
    Apply,
    /// The scheduler was paused while the fetch was out.
    DiscardPaused,
    /// The front page changed since dispatch.
    DiscardStale,
}

#[derive(Debug)]
pub struct RefreshScheduler {
    interval: Duration,
    last_tick: Instant,
    paused: bool,
    epoch: u64,
    refresh_requested: bool,
}

impl RefreshScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_tick: Instant::now(),
            paused: false,
            epoch: 0,
            refresh_requested: true,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// The front page changed: invalidate outstanding fetches and refresh now.
    pub fn page_changed(&mut self) {
        self.epoch += 1;
        self.refresh_requested = true;
    }

    /// Ask for an out-of-band refresh on the next loop iteration.
    pub fn request_refresh(&mut self) {
        self.refresh_requested = true;
    }

    /// Stop the timer. Fetches already out were dispatched for the page as
    /// it was before the pause and come back stale.
    pub fn pause(&mut self) {
        debug!("refresh scheduler paused");
        self.paused = true;
        self.epoch += 1;
    }

    pub fn resume(&mut self) {
        debug!("refresh scheduler resumed");
        self.paused = false;
        self.last_tick = Instant::now();
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// True when a refresh should be dispatched now: either requested or
    /// the period elapsed. Consumes the request and restarts the period.
    pub fn poll_due(&mut self, now: Instant) -> bool {
        if self.paused {
            return false;
        }
        if self.refresh_requested || now.duration_since(self.last_tick) >= self.interval {
            self.refresh_requested = false;
            self.last_tick = now;
            return true;
        }
        false
    }

    /// Time left until the next periodic refresh.
    pub fn until_next(&self, now: Instant) -> Duration {
        self.interval
            .saturating_sub(now.duration_since(self.last_tick))
    }

    pub fn ticket(&self, kind: ResourceKind) -> FetchTicket {
        FetchTicket {
            kind,
            epoch: self.epoch,
        }
    }

    /// Decide what to do with a fetch result given the page now in front.
    pub fn should_apply(&self, ticket: &FetchTicket, front: Page) -> ApplyDecision {
        if self.paused {
            return ApplyDecision::DiscardPaused;
        }
        if front != Page::View(ticket.kind) || ticket.epoch != self.epoch {
            return ApplyDecision::DiscardStale;
        }
        ApplyDecision::Apply
    }
}

/// Run one listing off the render thread and post the result back.
pub fn spawn_fetch(
    handle: &tokio::runtime::Handle,
    backend: SharedBackend,
    ticket: FetchTicket,
    tx: EventSender,
) {
    debug!(kind = %ticket.kind, epoch = ticket.epoch, "fetch dispatched");
    handle.spawn(async move {
        let result = backend.list(ticket.kind).await;
        // receiver gone means the loop is shutting down
        let _ = tx.send(AppEvent::Fetched { ticket, result });
    });
}
