//! Full-screen detail pages opened from a resource row.
//!
//! While an inspector is in front the table view's page is not, so its
//! periodic fetch results are discarded; closing the inspector brings the
//! view back and requests a refresh. Each opened inspector gets a fresh
//! generation number and late background results for an older one are
//! dropped.

mod log;
mod metrics;
mod text;

use crossterm::event::KeyCode;
use tracing::info;

use crate::model::ResourceKind;
use crate::scope::ScopeStack;

pub use log::{LogBuffer, LogInspector, LogSource, STREAM_ENDED};
pub use metrics::{MetricsInspector, PollerSettings};
pub use text::TextInspector;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyOutcome {
    Consumed,
    Close,
    Ignored,
}

/// Incremental `/` search input shared by the text and log inspectors.
#[derive(Clone, Debug, Default)]
pub struct SearchPrompt {
    pub active: bool,
    pub query: String,
}

impl SearchPrompt {
    pub fn open(&mut self) {
        self.active = true;
        self.query.clear();
    }

    /// Returns true when the query changed.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Enter => {
                self.active = false;
                true
            }
            KeyCode::Esc => {
                self.active = false;
                self.query.clear();
                true
            }
            KeyCode::Backspace => self.query.pop().is_some(),
            KeyCode::Char(c) => {
                self.query.push(c);
                true
            }
            _ => false,
        }
    }

    pub fn matches(&self, line: &str) -> bool {
        !self.query.is_empty() && line.to_lowercase().contains(&self.query.to_lowercase())
    }
}

pub enum InspectorBody {
    Text(TextInspector),
    Log(LogInspector),
    Metrics(MetricsInspector),
}

/// An inspector plus what it is looking at.
pub struct Inspector {
    pub generation: u64,
    pub kind: ResourceKind,
    pub id: String,
    pub name: String,
    /// "describe", "env", "logs", "metrics" or "help".
    pub action: &'static str,
    pub body: InspectorBody,
}

impl Inspector {
    pub fn new(
        generation: u64,
        kind: ResourceKind,
        id: &str,
        name: &str,
        action: &'static str,
        body: InspectorBody,
    ) -> Self {
        info!(kind = %kind, id = %id, action, generation, "inspector opened");
        Self {
            generation,
            kind,
            id: id.to_string(),
            name: name.to_string(),
            action,
            body,
        }
    }

    /// `compose(shop) > containers(web) > logs`
    pub fn title(&self, scopes: &ScopeStack) -> String {
        let mut parts = scopes.breadcrumbs();
        if self.name.is_empty() {
            parts.push(self.kind.title().to_string());
        } else {
            parts.push(format!("{}({})", self.kind.title(), self.name));
        }
        parts.push(self.action.to_string());
        parts.join(" > ")
    }

    pub fn handle_key(&mut self, code: KeyCode, page: usize) -> KeyOutcome {
        match &mut self.body {
            InspectorBody::Text(t) => t.handle_key(code, page),
            InspectorBody::Log(l) => l.handle_key(code, page),
            InspectorBody::Metrics(m) => m.handle_key(code),
        }
    }

    /// Pull buffered stream output. True when a redraw is needed.
    pub fn poll(&mut self) -> bool {
        match &mut self.body {
            InspectorBody::Log(l) => l.poll(),
            _ => false,
        }
    }

    /// Stop whatever background work the inspector owns.
    pub fn close(&mut self) {
        match &mut self.body {
            InspectorBody::Log(l) => l.close(),
            InspectorBody::Metrics(m) => m.close(),
            InspectorBody::Text(_) => {}
        }
        info!(kind = %self.kind, id = %self.id, action = self.action, "inspector closed");
    }
}
