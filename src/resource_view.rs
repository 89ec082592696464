//! Per-kind table state: the last snapshot, and the filtered, sorted rows
//! derived from it, plus selection and optimistic per-row labels.
//!
//! Row derivation happens in [`ResourceView::update`]: scope relation, then
//! case-insensitive user filter, then a stable typed sort on one column.
//! Selection and pending labels are keyed by ID and never touched by it.

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::debug;

use crate::compare::SortKey;
use crate::model::{Resource, ResourceKind};
use crate::scope::{Scope, ScopeStack, relation};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchState {
    Idle,
    Fetching,
}

#[derive(Debug)]
pub struct ResourceView {
    kind: ResourceKind,
    snapshot: Vec<Resource>,
    rows: Vec<Resource>,
    user_filter: String,
    sort_column: usize,
    sort_ascending: bool,
    selected_ids: HashSet<String>,
    pending_by_id: HashMap<String, String>,
    cursor: usize,
    fetch_state: FetchState,
    last_error: Option<String>,
}

impl ResourceView {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            snapshot: Vec::new(),
            rows: Vec::new(),
            user_filter: String::new(),
            sort_column: 0,
            sort_ascending: true,
            selected_ids: HashSet::new(),
            pending_by_id: HashMap::new(),
            cursor: 0,
            fetch_state: FetchState::Idle,
            last_error: None,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn headers(&self) -> &'static [&'static str] {
        self.kind.headers()
    }

    pub fn rows(&self) -> &[Resource] {
        &self.rows
    }

    pub fn user_filter(&self) -> &str {
        &self.user_filter
    }

    pub fn sort_column(&self) -> usize {
        self.sort_column
    }

    pub fn sort_ascending(&self) -> bool {
        self.sort_ascending
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    // --- Fetch lifecycle ---

    pub fn fetch_state(&self) -> FetchState {
        self.fetch_state
    }

    /// Mark a fetch as dispatched. Returns false if one is already in
    /// flight; the caller drops the request rather than queueing it.
    pub fn begin_fetch(&mut self) -> bool {
        if self.fetch_state == FetchState::Fetching {
            debug!(kind = %self.kind, "fetch suppressed, one already in flight");
            return false;
        }
        self.fetch_state = FetchState::Fetching;
        true
    }

    /// The in-flight fetch finished but its result will not be applied.
    pub fn abandon_fetch(&mut self) {
        self.fetch_state = FetchState::Idle;
    }

    /// Record a failed fetch. Previously rendered rows stay.
    pub fn fail_fetch(&mut self, message: impl Into<String>) {
        self.fetch_state = FetchState::Idle;
        self.last_error = Some(message.into());
    }

    /// Apply a fresh snapshot: scope relation, filter, stable sort.
    pub fn update(&mut self, snapshot: Vec<Resource>, scope: Option<&Scope>) {
        self.fetch_state = FetchState::Idle;
        self.last_error = None;
        self.snapshot = snapshot;
        self.reapply(scope);
    }

    /// Re-derive rows from the last snapshot without fetching.
    pub fn reapply(&mut self, scope: Option<&Scope>) {
        let highlighted = self.highlighted().map(|r| r.id().to_string());

        let column_count = self.headers().len();
        if self.sort_column >= column_count {
            self.sort_column = 0;
        }
        let needle = self.user_filter.to_lowercase();

        let mut keyed: Vec<(SortKey, Resource)> = self
            .snapshot
            .iter()
            .filter(|r| relation(scope, r))
            .filter_map(|r| {
                let cells = r.cells();
                if !needle.is_empty()
                    && !cells.iter().any(|c| c.to_lowercase().contains(&needle))
                {
                    return None;
                }
                let key = cells
                    .get(self.sort_column)
                    .map(|c| SortKey::parse(c))
                    .unwrap_or_else(|| SortKey::Text(String::new()));
                Some((key, r.clone()))
            })
            .collect();

        // slice::sort_by is stable; flipping the comparator keeps equal keys
        // in snapshot order for both directions
        if self.sort_ascending {
            keyed.sort_by(|a, b| a.0.cmp(&b.0));
        } else {
            keyed.sort_by(|a, b| b.0.cmp(&a.0));
        }
        self.rows = keyed.into_iter().map(|(_, r)| r).collect();

        self.cursor = highlighted
            .and_then(|id| self.rows.iter().position(|r| r.id() == id))
            .unwrap_or(self.cursor)
            .min(self.rows.len().saturating_sub(1));
    }

    // --- Filter & sort ---

    pub fn set_filter(&mut self, filter: impl Into<String>, scope: Option<&Scope>) {
        self.user_filter = filter.into();
        self.reapply(scope);
    }

    pub fn cycle_sort_column(&mut self, forward: bool, scope: Option<&Scope>) {
        let n = self.headers().len();
        self.sort_column = if forward {
            (self.sort_column + 1) % n
        } else {
            (self.sort_column + n - 1) % n
        };
        self.reapply(scope);
    }

    pub fn toggle_sort_order(&mut self, scope: Option<&Scope>) {
        self.sort_ascending = !self.sort_ascending;
        self.reapply(scope);
    }

    // --- Cursor ---

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn highlighted(&self) -> Option<&Resource> {
        self.rows.get(self.cursor)
    }

    pub fn move_cursor(&mut self, delta: isize) {
        if self.rows.is_empty() {
            self.cursor = 0;
            return;
        }
        let max = self.rows.len() - 1;
        self.cursor = self.cursor.saturating_add_signed(delta).min(max);
    }

    pub fn cursor_top(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_bottom(&mut self) {
        self.cursor = self.rows.len().saturating_sub(1);
    }

    // --- Selection ---

    pub fn toggle_selection(&mut self) {
        let Some(id) = self.highlighted().map(|r| r.id().to_string()) else {
            return;
        };
        if !self.selected_ids.remove(&id) {
            self.selected_ids.insert(id);
        }
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected_ids.contains(id)
    }

    pub fn selected_ids(&self) -> &HashSet<String> {
        &self.selected_ids
    }

    pub fn clear_selection(&mut self) {
        self.selected_ids.clear();
    }

    /// IDs an action applies to: the selection if any, else the highlighted
    /// row. Visible selected rows come first in display order, then any
    /// selected IDs hidden by the filter.
    pub fn targets(&self) -> Vec<String> {
        if self.selected_ids.is_empty() {
            return self
                .highlighted()
                .map(|r| vec![r.id().to_string()])
                .unwrap_or_default();
        }
        let mut ordered: Vec<String> = self
            .rows
            .iter()
            .map(|r| r.id())
            .filter(|id| self.selected_ids.contains(*id))
            .map(str::to_string)
            .collect();
        let hidden: BTreeSet<&String> = self
            .selected_ids
            .iter()
            .filter(|id| !ordered.contains(*id))
            .collect();
        ordered.extend(hidden.into_iter().cloned());
        ordered
    }

    /// Look up a row by ID, falling back to the unfiltered snapshot.
    pub fn find(&self, id: &str) -> Option<&Resource> {
        self.rows
            .iter()
            .chain(self.snapshot.iter())
            .find(|r| r.id() == id)
    }

    // --- Optimistic labels ---

    pub fn set_pending(&mut self, id: impl Into<String>, label: impl Into<String>) {
        self.pending_by_id.insert(id.into(), label.into());
    }

    pub fn clear_pending(&mut self, id: &str) {
        self.pending_by_id.remove(id);
    }

    pub fn pending_label(&self, id: &str) -> Option<&str> {
        self.pending_by_id.get(id).map(String::as_str)
    }

    pub fn pending_count(&self) -> usize {
        self.pending_by_id.len()
    }

    /// Column that shows the pending label instead of the backend value.
    pub fn status_column(&self) -> Option<usize> {
        match self.kind {
            ResourceKind::Containers => Some(3),
            ResourceKind::Services => Some(4),
            ResourceKind::Nodes => Some(2),
            ResourceKind::Compose => Some(2),
            _ => None,
        }
    }

    /// Cells as displayed, pending label substituted into the status column.
    pub fn display_cells(&self, resource: &Resource) -> Vec<String> {
        let mut cells = resource.cells();
        if let Some(label) = self.pending_label(resource.id()) {
            match self.status_column() {
                Some(col) if col < cells.len() => cells[col] = format!("{}...", label),
                _ => {
                    if let Some(last) = cells.last_mut() {
                        *last = format!("{}...", label);
                    }
                }
            }
        }
        cells
    }

    /// `origin(label) > ... > kind[count]`
    pub fn title(&self, scopes: &ScopeStack) -> String {
        let mut parts = scopes.breadcrumbs();
        parts.push(format!("{}[{}]", self.kind, self.rows.len()));
        parts.join(" > ")
    }
}
