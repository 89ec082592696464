use std::time::Instant;

use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, warn};

use crate::actions::{self, Completion};
use crate::error::DashboardError;
use crate::event::AppEvent;
use crate::inspector::InspectorBody;
use crate::model::{FlashKind, Page};
use crate::scheduler::{self, ApplyDecision};

use super::App;

/// Events applied per loop iteration, so a burst cannot starve input.
const MAX_EVENTS_PER_TICK: usize = 64;

impl App {
    /// Dispatch a table fetch if one is due and the front page is a view.
    /// A fetch already in flight for that view suppresses the new one.
    pub fn process_tick(&mut self, now: Instant) -> bool {
        if !self.scheduler.poll_due(now) {
            return false;
        }
        let Page::View(kind) = self.front_page() else {
            return false;
        };
        if !self.view_mut(kind).begin_fetch() {
            debug!(kind = %kind, "fetch already in flight, suppressed");
            return false;
        }
        let ticket = self.scheduler.ticket(kind);
        scheduler::spawn_fetch(&self.runtime, self.backend.clone(), ticket, self.tx.clone());
        true
    }

    /// Apply whatever background tasks have posted.
    pub fn drain_events(&mut self) -> bool {
        let mut needs_render = false;
        for _ in 0..MAX_EVENTS_PER_TICK {
            match self.rx.try_recv() {
                Ok(event) => {
                    if self.apply_event(event) {
                        needs_render = true;
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        needs_render
    }

    pub fn apply_event(&mut self, event: AppEvent) -> bool {
        match event {
            AppEvent::Fetched { ticket, result } => {
                let front = self.front_page();
                match self.scheduler.should_apply(&ticket, front) {
                    ApplyDecision::Apply => {
                        let (view, scopes) = self.active_view_and_scope();
                        match result {
                            Ok(snapshot) => {
                                debug!(kind = %ticket.kind, items = snapshot.len(), "fetch applied");
                                view.update(snapshot, scopes.current());
                            }
                            Err(source) => {
                                let err = DashboardError::Fetch {
                                    kind: ticket.kind,
                                    source,
                                };
                                warn!(error = %err, "fetch failed");
                                view.fail_fetch(err.to_string());
                            }
                        }
                        true
                    }
                    decision => {
                        self.view_mut(ticket.kind).abandon_fetch();
                        debug!(kind = %ticket.kind, epoch = ticket.epoch, ?decision, "fetch result discarded");
                        // a fetch for the current page may have been suppressed behind this one
                        if decision == ApplyDecision::DiscardStale && front == Page::View(ticket.kind) {
                            self.scheduler.request_refresh();
                        }
                        false
                    }
                }
            }
            AppEvent::ActionFinished(run) => {
                let completion = actions::complete(self.view_mut(run.kind), &run);
                match completion {
                    Completion::Success(message) => self.set_flash(FlashKind::Success, message),
                    Completion::Partial(summary) => {
                        self.set_flash(FlashKind::Error, summary.headline());
                        self.result_modal = Some(summary);
                    }
                }
                self.scheduler.request_refresh();
                true
            }
            AppEvent::Described { generation, result } => {
                let Some(inspector) = self.inspector.as_mut() else {
                    return false;
                };
                if inspector.generation != generation {
                    debug!(generation, "late describe result dropped");
                    return false;
                }
                let InspectorBody::Text(text) = &mut inspector.body else {
                    return false;
                };
                match result {
                    Ok(content) => text.set_content(&content),
                    Err(e) => {
                        warn!(error = %e, "describe failed");
                        text.set_content(&format!("error: {}", e));
                    }
                }
                true
            }
            AppEvent::MetricsUpdated { generation } => self
                .inspector
                .as_ref()
                .is_some_and(|i| i.generation == generation),
        }
    }

    /// Drain the open inspector's stream, if any.
    pub fn poll_inspector(&mut self) -> bool {
        self.inspector.as_mut().is_some_and(|i| i.poll())
    }
}
