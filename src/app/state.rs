use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::actions::{self, ActionRequest, PendingConfirmation, ResultSummary};
use crate::backend::SharedBackend;
use crate::config::Config;
use crate::event::{self, EventReceiver, EventSender};
use crate::inspector::Inspector;
use crate::model::{FlashKind, Page, ResourceKind};
use crate::resource_view::ResourceView;
use crate::scheduler::RefreshScheduler;
use crate::scope::{self, DrillDown, ScopeStack};

/// Pending, success and error flashes hold the status line this long.
pub const FLASH_LOCK: Duration = Duration::from_secs(3);
/// Any flash disappears after this.
pub const FLASH_TTL: Duration = Duration::from_secs(6);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Flash {
    pub kind: FlashKind,
    pub text: String,
    pub set_at: Instant,
}

impl Flash {
    pub fn is_locked(&self, now: Instant) -> bool {
        self.kind != FlashKind::Info && now.duration_since(self.set_at) < FLASH_LOCK
    }
}

/// Line-editing modes that capture keystrokes before the view does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Filter,
    Command(String),
    Scale { id: String, input: String },
    Create { kind: ResourceKind, input: String },
}

/// All render-owned state. Only the loop thread touches it; background
/// tasks talk to it through `AppEvent`s.
pub struct App {
    pub config: Config,
    pub backend: SharedBackend,
    pub runtime: tokio::runtime::Handle,
    pub tx: EventSender,
    pub(super) rx: EventReceiver,
    views: Vec<ResourceView>,
    pub active_kind: ResourceKind,
    pub scopes: ScopeStack,
    pub scheduler: RefreshScheduler,
    pub inspector: Option<Inspector>,
    next_generation: u64,
    pub flash: Option<Flash>,
    pub result_modal: Option<ResultSummary>,
    pub pending_confirmation: Option<PendingConfirmation>,
    pub mode: InputMode,
}

impl App {
    pub fn new(config: Config, backend: SharedBackend, runtime: tokio::runtime::Handle) -> Self {
        let (tx, rx) = event::channel();
        let views = ResourceKind::ALL.iter().map(|k| ResourceView::new(*k)).collect();
        let scheduler = RefreshScheduler::new(config.refresh_interval);
        let active_kind = config.start_view;
        Self {
            config,
            backend,
            runtime,
            tx,
            rx,
            views,
            active_kind,
            scopes: ScopeStack::new(),
            scheduler,
            inspector: None,
            next_generation: 0,
            flash: None,
            result_modal: None,
            pending_confirmation: None,
            mode: InputMode::Normal,
        }
    }

    pub fn view(&self, kind: ResourceKind) -> &ResourceView {
        &self.views[kind as usize]
    }

    pub fn view_mut(&mut self, kind: ResourceKind) -> &mut ResourceView {
        &mut self.views[kind as usize]
    }

    pub fn active_view(&self) -> &ResourceView {
        self.view(self.active_kind)
    }

    /// Split borrow: the active view plus the scope it is filtered by.
    pub fn active_view_and_scope(&mut self) -> (&mut ResourceView, &ScopeStack) {
        (&mut self.views[self.active_kind as usize], &self.scopes)
    }

    pub fn front_page(&self) -> Page {
        if self.inspector.is_some() {
            Page::Inspector
        } else {
            Page::View(self.active_kind)
        }
    }

    pub fn set_flash(&mut self, kind: FlashKind, text: impl Into<String>) {
        let now = Instant::now();
        if kind == FlashKind::Info && self.flash.as_ref().is_some_and(|f| f.is_locked(now)) {
            return;
        }
        self.flash = Some(Flash {
            kind,
            text: text.into(),
            set_at: now,
        });
    }

    pub fn expire_flash(&mut self, now: Instant) -> bool {
        if self
            .flash
            .as_ref()
            .is_some_and(|f| now.duration_since(f.set_at) >= FLASH_TTL)
        {
            self.flash = None;
            return true;
        }
        false
    }

    fn reapply_active(&mut self) {
        let (view, scopes) = self.active_view_and_scope();
        view.reapply(scopes.current());
    }

    /// `:kind` jump: a root view with no scope.
    pub fn switch_root(&mut self, kind: ResourceKind) {
        self.close_inspector();
        self.scopes.clear();
        self.active_kind = kind;
        self.reapply_active();
        self.scheduler.page_changed();
        info!(kind = %kind, "switched view");
    }

    /// Enter the highlighted row's child view. Returns false when the row
    /// has nowhere to drill into.
    pub fn drill_down(&mut self) -> bool {
        let Some(resource) = self.active_view().highlighted() else {
            return false;
        };
        let Some(target) = scope::drill_down(resource) else {
            return false;
        };
        let origin_kind = resource.kind();
        self.enter_scope(origin_kind, target);
        true
    }

    /// Open the volumes or networks the highlighted container uses.
    pub fn drill_into(&mut self, target: ResourceKind) -> bool {
        let Some(resource) = self.active_view().highlighted() else {
            return false;
        };
        let Some(drill) = scope::drill_into(resource, target) else {
            return false;
        };
        let origin_kind = resource.kind();
        self.enter_scope(origin_kind, drill);
        true
    }

    fn enter_scope(&mut self, origin_kind: ResourceKind, drill: DrillDown) {
        self.scopes.push_related(
            origin_kind,
            drill.value,
            drill.label,
            self.active_kind,
            drill.related,
        );
        self.active_kind = drill.target;
        self.reapply_active();
        self.scheduler.page_changed();
        debug!(depth = self.scopes.depth(), view = %self.active_kind, "drilled down");
    }

    /// Back out of the current scope into the view it was entered from.
    pub fn pop_scope(&mut self) -> bool {
        let Some(popped) = self.scopes.pop() else {
            return false;
        };
        self.active_kind = popped.origin_view;
        self.reapply_active();
        self.scheduler.page_changed();
        debug!(depth = self.scopes.depth(), view = %self.active_kind, "scope popped");
        true
    }

    /// Esc on a table: clear the filter, else the selection, else pop.
    pub fn escape(&mut self) -> bool {
        let (view, scopes) = self.active_view_and_scope();
        if !view.user_filter().is_empty() {
            view.set_filter("", scopes.current());
            return true;
        }
        if !view.selected_ids().is_empty() {
            view.clear_selection();
            return true;
        }
        self.pop_scope()
    }

    pub fn next_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    pub fn open_inspector(&mut self, inspector: Inspector) {
        self.close_inspector();
        self.inspector = Some(inspector);
        self.scheduler.page_changed();
    }

    pub fn close_inspector(&mut self) {
        if let Some(mut inspector) = self.inspector.take() {
            inspector.close();
            self.scheduler.page_changed();
        }
    }

    /// Mark targets pending, show feedback and start the run off-thread.
    pub fn dispatch_action(&mut self, request: ActionRequest) {
        if request.targets.is_empty() {
            return;
        }
        let view = self.view_mut(request.kind);
        actions::begin(view, &request);
        let what = if request.targets.len() == 1 {
            request.kind.noun().to_string()
        } else {
            format!("{} {}", request.targets.len(), request.kind.title())
        };
        self.set_flash(FlashKind::Pending, format!("{} {}...", request.label, what));
        actions::spawn(
            &self.runtime,
            self.backend.clone(),
            request,
            self.tx.clone(),
        );
    }

    /// Destructive requests wait for `y`; the rest run now.
    pub fn request_action(&mut self, request: ActionRequest) {
        let destructive = request
            .targets
            .iter()
            .any(|t| t.command.is_destructive());
        if destructive {
            let confirmation = PendingConfirmation::new(request, self.config.confirm_timeout);
            self.pending_confirmation = Some(confirmation);
        } else {
            self.dispatch_action(request);
        }
    }

    pub fn expire_confirmation(&mut self, now: Instant) -> bool {
        if self
            .pending_confirmation
            .as_ref()
            .is_some_and(|p| p.is_expired(now))
        {
            self.pending_confirmation = None;
            self.set_flash(FlashKind::Info, "confirmation timed out");
            return true;
        }
        false
    }
}
