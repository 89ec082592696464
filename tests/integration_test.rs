//! End-to-end behavior of the state engine against a scripted in-memory
//! backend: bulk actions, refresh staleness, scope navigation and the
//! metrics pipeline.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use futures_util::future::BoxFuture;
use serde_json::json;
use tokio::sync::Semaphore;

use dockscope::actions::{self, ActionRequest, Completion, Outcome};
use dockscope::app::{App, InputMode, InputResult, handle_key};
use dockscope::backend::{Backend, LogOptions, LogStreamHandle, SharedBackend};
use dockscope::config::Config;
use dockscope::error::{BackendError, BackendResult};
use dockscope::event::AppEvent;
use dockscope::metrics::{MetricsEngine, RingBuffer};
use dockscope::model::{
    ComposeProject, Container, MutationCommand, Network, Page, Resource, ResourceKind, Volume,
};
use dockscope::inspector::InspectorBody;
use dockscope::resource_view::{FetchState, ResourceView};

#[derive(Default)]
struct FakeBackend {
    lists: Mutex<HashMap<ResourceKind, Vec<Resource>>>,
    failing: HashSet<String>,
    calls: Mutex<Vec<(String, MutationCommand)>>,
    /// When set, listings snapshot their data then wait for a permit.
    gate: Option<Arc<Semaphore>>,
    list_calls: AtomicUsize,
}

impl FakeBackend {
    fn failing(ids: &[&str]) -> Self {
        Self {
            failing: ids.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn gated() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let backend = Self {
            gate: Some(Arc::clone(&gate)),
            ..Default::default()
        };
        (backend, gate)
    }

    fn set_list(&self, kind: ResourceKind, items: Vec<Resource>) {
        self.lists.lock().unwrap().insert(kind, items);
    }

    fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Block until `n` listings have taken their snapshot.
    fn wait_for_list_calls(&self, n: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while self.list_calls() < n {
            assert!(Instant::now() < deadline, "listing {} never started", n);
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    fn calls(&self) -> Vec<(String, MutationCommand)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Backend for FakeBackend {
    fn list(&self, kind: ResourceKind) -> BoxFuture<'_, BackendResult<Vec<Resource>>> {
        Box::pin(async move {
            let items = self.lists.lock().unwrap().get(&kind).cloned().unwrap_or_default();
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                let _permit = gate.acquire().await;
            }
            Ok(items)
        })
    }

    fn mutate<'a>(
        &'a self,
        _kind: ResourceKind,
        id: &'a str,
        command: MutationCommand,
    ) -> BoxFuture<'a, BackendResult<()>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push((id.to_string(), command));
            if self.failing.contains(id) {
                Err(BackendError::NotFound(format!("container {}", id)))
            } else {
                Ok(())
            }
        })
    }

    fn stats<'a>(&'a self, _id: &'a str) -> BoxFuture<'a, BackendResult<serde_json::Value>> {
        Box::pin(async move { Ok(json!({})) })
    }

    fn describe<'a>(&'a self, kind: ResourceKind, id: &'a str) -> BoxFuture<'a, BackendResult<String>> {
        Box::pin(async move { Ok(format!("{} {}", kind.noun(), id)) })
    }

    fn env<'a>(&'a self, id: &'a str) -> BoxFuture<'a, BackendResult<Vec<String>>> {
        Box::pin(async move { Ok(vec![format!("HOSTNAME={}", id), "PATH=/usr/bin".to_string()]) })
    }

    fn stream_logs(
        &self,
        _kind: ResourceKind,
        _id: &str,
        _options: LogOptions,
        _handle: &tokio::runtime::Handle,
    ) -> LogStreamHandle {
        let (tx, handle) = LogStreamHandle::detached();
        let _ = tx.send("hello".to_string());
        handle
    }
}

fn container(id: &str, project: &str, status: &str) -> Resource {
    Resource::Container(Container {
        id: id.to_string(),
        name: format!("{}-name", id),
        project: project.to_string(),
        status: status.to_string(),
        state: "running".to_string(),
        ..Default::default()
    })
}

fn project(name: &str) -> Resource {
    Resource::Compose(ComposeProject {
        name: name.to_string(),
        ..Default::default()
    })
}

fn volume(name: &str) -> Resource {
    Resource::Volume(Volume {
        name: name.to_string(),
        ..Default::default()
    })
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn app_with(backend: FakeBackend, start: ResourceKind, rt: &tokio::runtime::Runtime) -> App {
    app_sharing(Arc::new(backend), start, rt)
}

fn app_sharing(backend: Arc<FakeBackend>, start: ResourceKind, rt: &tokio::runtime::Runtime) -> App {
    let config = Config {
        start_view: start,
        ..Config::default()
    };
    let backend: SharedBackend = backend;
    App::new(config, backend, rt.handle().clone())
}

/// Drain events until `kind` has no fetch in flight.
fn settle(app: &mut App, kind: ResourceKind) {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        app.drain_events();
        if app.view(kind).fetch_state() == FetchState::Idle {
            return;
        }
        assert!(Instant::now() < deadline, "{} fetch never finished", kind);
        std::thread::sleep(Duration::from_millis(2));
    }
}

fn row_ids(app: &App, kind: ResourceKind) -> Vec<String> {
    app.view(kind).rows().iter().map(|r| r.id().to_string()).collect()
}

/// Deliver a fetch result as if it came back for the current page.
fn deliver(app: &mut App, kind: ResourceKind, items: Vec<Resource>) -> bool {
    let ticket = app.scheduler.ticket(kind);
    app.apply_event(AppEvent::Fetched {
        ticket,
        result: Ok(items),
    })
}

#[tokio::test]
async fn partial_failure_reports_in_order_and_keeps_selection() {
    let backend = FakeBackend::failing(&["B"]);
    let mut view = ResourceView::new(ResourceKind::Containers);
    view.update(
        vec![container("A", "", "Up"), container("B", "", "Up"), container("C", "", "Up")],
        None,
    );
    for _ in 0..3 {
        view.toggle_selection();
        view.move_cursor(1);
    }

    let request = ActionRequest::uniform(ResourceKind::Containers, MutationCommand::Stop, view.targets());
    actions::begin(&mut view, &request);
    assert_eq!(view.pending_count(), 3);

    let run = actions::run_sequential(&backend, request).await;
    let order: Vec<&str> = run.target_ids().collect();
    assert_eq!(order, vec!["A", "B", "C"]);
    assert_eq!(run.outcome("A"), Some(&Outcome::Ok));
    assert!(matches!(run.outcome("B"), Some(Outcome::Err(_))));
    assert_eq!(run.outcome("C"), Some(&Outcome::Ok));

    match actions::complete(&mut view, &run) {
        Completion::Partial(summary) => {
            assert_eq!((summary.succeeded, summary.total), (2, 3));
            assert_eq!(summary.failures.len(), 1);
            assert_eq!(summary.failures[0].0, "B");
        }
        other => panic!("expected partial completion, got {:?}", other),
    }
    assert_eq!(view.pending_count(), 0);
    assert_eq!(view.selected_ids().len(), 3);

    let calls: Vec<String> = backend.calls().into_iter().map(|(id, _)| id).collect();
    assert_eq!(calls, vec!["A", "B", "C"]);
}

#[tokio::test]
async fn full_success_clears_selection() {
    let backend = FakeBackend::default();
    let mut view = ResourceView::new(ResourceKind::Containers);
    view.update(vec![container("A", "", "Up"), container("B", "", "Up")], None);
    view.toggle_selection();

    let request = ActionRequest::uniform(ResourceKind::Containers, MutationCommand::Restart, view.targets());
    actions::begin(&mut view, &request);
    let run = actions::run_sequential(&backend, request).await;
    assert!(matches!(actions::complete(&mut view, &run), Completion::Success(_)));
    assert!(view.selected_ids().is_empty());
}

#[test]
fn stale_fetch_is_discarded_after_navigation() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut app = app_with(FakeBackend::default(), ResourceKind::Containers, &rt);

    let old_ticket = app.scheduler.ticket(ResourceKind::Containers);
    app.switch_root(ResourceKind::Images);
    assert_eq!(app.front_page(), Page::View(ResourceKind::Images));

    let applied = app.apply_event(AppEvent::Fetched {
        ticket: old_ticket,
        result: Ok(vec![container("A", "", "Up")]),
    });
    assert!(!applied);
    assert!(app.view(ResourceKind::Containers).rows().is_empty());

    // coming back with a stale epoch is still stale
    app.switch_root(ResourceKind::Containers);
    let applied = app.apply_event(AppEvent::Fetched {
        ticket: old_ticket,
        result: Ok(vec![container("A", "", "Up")]),
    });
    assert!(!applied);
    assert!(app.view(ResourceKind::Containers).rows().is_empty());

    assert!(deliver(&mut app, ResourceKind::Containers, vec![container("A", "", "Up")]));
    assert_eq!(app.view(ResourceKind::Containers).rows().len(), 1);
}

#[test]
fn fetch_while_paused_is_dropped() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut app = app_with(FakeBackend::default(), ResourceKind::Volumes, &rt);
    let ticket = app.scheduler.ticket(ResourceKind::Volumes);
    app.scheduler.pause();
    assert!(!app.apply_event(AppEvent::Fetched {
        ticket,
        result: Ok(vec![volume("data")]),
    }));
    app.scheduler.resume();
    assert!(app.view(ResourceKind::Volumes).rows().is_empty());
}

#[test]
fn fetch_out_across_a_pause_is_dropped_and_refetched() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (backend, gate) = FakeBackend::gated();
    let backend = Arc::new(backend);
    backend.set_list(ResourceKind::Volumes, vec![volume("before-shell")]);
    let mut app = app_sharing(Arc::clone(&backend), ResourceKind::Volumes, &rt);

    assert!(app.process_tick(Instant::now()));
    backend.wait_for_list_calls(1);

    // an external program takes the terminal while the fetch is out
    app.scheduler.pause();
    backend.set_list(ResourceKind::Volumes, vec![volume("after-shell")]);
    gate.add_permits(1);
    app.scheduler.resume();
    app.scheduler.request_refresh();

    // the old fetch still counts as in flight, so this refresh is held back
    assert!(!app.process_tick(Instant::now()));
    settle(&mut app, ResourceKind::Volumes);
    assert!(row_ids(&app, ResourceKind::Volumes).is_empty());

    // discarding it asked for a new fetch
    assert!(app.process_tick(Instant::now()));
    settle(&mut app, ResourceKind::Volumes);
    assert_eq!(row_ids(&app, ResourceKind::Volumes), vec!["after-shell"]);
    assert_eq!(backend.list_calls(), 2);
}

#[test]
fn refresh_is_suppressed_while_fetch_in_flight() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (backend, gate) = FakeBackend::gated();
    let backend = Arc::new(backend);
    backend.set_list(ResourceKind::Volumes, vec![volume("data")]);
    let mut app = app_sharing(Arc::clone(&backend), ResourceKind::Volumes, &rt);

    assert!(app.process_tick(Instant::now()));
    app.scheduler.request_refresh();
    assert!(!app.process_tick(Instant::now()));
    assert_eq!(app.view(ResourceKind::Volumes).fetch_state(), FetchState::Fetching);

    gate.add_permits(1);
    settle(&mut app, ResourceKind::Volumes);
    assert_eq!(row_ids(&app, ResourceKind::Volumes), vec!["data"]);
    assert_eq!(backend.list_calls(), 1);

    // periodic refresh picks up again once idle
    assert!(app.process_tick(Instant::now() + Duration::from_secs(3)));
}

#[test]
fn navigating_away_and_back_refetches_after_stale_result() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (backend, gate) = FakeBackend::gated();
    let backend = Arc::new(backend);
    backend.set_list(ResourceKind::Containers, vec![container("old", "", "Up")]);
    let mut app = app_sharing(Arc::clone(&backend), ResourceKind::Containers, &rt);

    assert!(app.process_tick(Instant::now()));
    backend.wait_for_list_calls(1);
    app.switch_root(ResourceKind::Images);
    app.switch_root(ResourceKind::Containers);
    backend.set_list(ResourceKind::Containers, vec![container("new", "", "Up")]);

    assert!(!app.process_tick(Instant::now()));
    gate.add_permits(1);
    settle(&mut app, ResourceKind::Containers);
    assert!(row_ids(&app, ResourceKind::Containers).is_empty());

    assert!(app.process_tick(Instant::now()));
    settle(&mut app, ResourceKind::Containers);
    assert_eq!(row_ids(&app, ResourceKind::Containers), vec!["new"]);
}

#[test]
fn fetch_error_keeps_previous_rows() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut app = app_with(FakeBackend::default(), ResourceKind::Volumes, &rt);
    deliver(&mut app, ResourceKind::Volumes, vec![volume("data")]);

    let ticket = app.scheduler.ticket(ResourceKind::Volumes);
    app.apply_event(AppEvent::Fetched {
        ticket,
        result: Err(BackendError::NotFound("daemon".into())),
    });
    let view = app.view(ResourceKind::Volumes);
    assert_eq!(view.rows().len(), 1);
    assert!(view.last_error().is_some_and(|e| e.contains("volumes")));
}

#[test]
fn drill_into_project_then_escape_back_to_root() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut app = app_with(FakeBackend::default(), ResourceKind::Compose, &rt);
    deliver(&mut app, ResourceKind::Compose, vec![project("shop")]);

    assert_eq!(handle_key(&mut app, key(KeyCode::Enter)), Some(InputResult::Consumed));
    assert_eq!(app.active_kind, ResourceKind::Containers);
    assert_eq!(app.scopes.depth(), 1);

    deliver(
        &mut app,
        ResourceKind::Containers,
        vec![
            container("web", "shop", "Up"),
            container("blog", "blog", "Up"),
            container("db", "shop", "Up"),
        ],
    );
    let ids: Vec<&str> = app.active_view().rows().iter().map(|r| r.id()).collect();
    assert_eq!(ids.len(), 2);
    assert!(!ids.contains(&"blog"));
    assert_eq!(
        app.active_view().title(&app.scopes),
        "compose(shop) > containers[2]"
    );

    handle_key(&mut app, key(KeyCode::Esc));
    assert!(app.scopes.is_empty());
    assert_eq!(app.active_kind, ResourceKind::Compose);
}

#[test]
fn escape_clears_filter_then_selection_then_scope() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut app = app_with(FakeBackend::default(), ResourceKind::Compose, &rt);
    deliver(&mut app, ResourceKind::Compose, vec![project("shop")]);
    handle_key(&mut app, key(KeyCode::Enter));
    deliver(&mut app, ResourceKind::Containers, vec![container("web", "shop", "Up")]);

    handle_key(&mut app, key(KeyCode::Char(' ')));
    handle_key(&mut app, key(KeyCode::Char('/')));
    handle_key(&mut app, key(KeyCode::Char('w')));
    handle_key(&mut app, key(KeyCode::Enter));
    assert_eq!(app.mode, InputMode::Normal);
    assert_eq!(app.active_view().user_filter(), "w");

    handle_key(&mut app, key(KeyCode::Esc));
    assert_eq!(app.active_view().user_filter(), "");
    assert_eq!(app.active_view().selected_ids().len(), 1);

    handle_key(&mut app, key(KeyCode::Esc));
    assert!(app.active_view().selected_ids().is_empty());
    assert_eq!(app.scopes.depth(), 1);

    handle_key(&mut app, key(KeyCode::Esc));
    assert!(app.scopes.is_empty());
}

#[test]
fn filter_keeps_only_matching_single_cell_rows() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut app = app_with(FakeBackend::default(), ResourceKind::Volumes, &rt);
    deliver(&mut app, ResourceKind::Volumes, vec![volume("b"), volume("a"), volume("c")]);

    handle_key(&mut app, key(KeyCode::Char('/')));
    handle_key(&mut app, key(KeyCode::Char('A')));
    let names: Vec<&str> = app.active_view().rows().iter().map(|r| r.id()).collect();
    assert_eq!(names, vec!["a"]);

    // a refresh keeps the filter applied
    deliver(&mut app, ResourceKind::Volumes, vec![volume("a"), volume("ab"), volume("c")]);
    assert_eq!(app.active_view().rows().len(), 2);
}

#[test]
fn command_prompt_jumps_to_root_view() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut app = app_with(FakeBackend::default(), ResourceKind::Compose, &rt);
    deliver(&mut app, ResourceKind::Compose, vec![project("shop")]);
    handle_key(&mut app, key(KeyCode::Enter));
    assert_eq!(app.scopes.depth(), 1);

    for c in ":images".chars() {
        handle_key(&mut app, key(KeyCode::Char(c)));
    }
    handle_key(&mut app, key(KeyCode::Enter));
    assert_eq!(app.active_kind, ResourceKind::Images);
    assert!(app.scopes.is_empty());
}

#[test]
fn delete_needs_confirmation_and_force_key_forces() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut app = app_with(FakeBackend::default(), ResourceKind::Containers, &rt);
    deliver(&mut app, ResourceKind::Containers, vec![container("A", "", "Exited (0)")]);

    handle_key(&mut app, KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL));
    let confirmation = app.pending_confirmation.as_ref().expect("confirmation pending");
    assert!(confirmation.forceable);
    assert_eq!(app.active_view().pending_count(), 0);

    handle_key(&mut app, key(KeyCode::Char('F')));
    assert!(app.pending_confirmation.is_none());
    assert_eq!(app.active_view().pending_label("A"), Some("deleting"));
}

#[test]
fn other_key_cancels_confirmation() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut app = app_with(FakeBackend::default(), ResourceKind::Images, &rt);
    handle_key(&mut app, key(KeyCode::Char('p')));
    assert!(app.pending_confirmation.is_some());
    handle_key(&mut app, key(KeyCode::Char('n')));
    assert!(app.pending_confirmation.is_none());
    assert_eq!(app.view(ResourceKind::Images).pending_count(), 0);
}

#[test]
fn restart_key_starts_exited_containers() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut app = app_with(FakeBackend::default(), ResourceKind::Containers, &rt);
    deliver(
        &mut app,
        ResourceKind::Containers,
        vec![container("A", "", "Exited (1)"), container("B", "", "Up")],
    );
    handle_key(&mut app, key(KeyCode::Char(' ')));
    handle_key(&mut app, key(KeyCode::Char(' ')));
    handle_key(&mut app, key(KeyCode::Char('r')));

    let view = app.active_view();
    assert_eq!(view.pending_label("A"), Some("starting"));
    assert_eq!(view.pending_label("B"), Some("restarting"));
}

fn network(name: &str) -> Resource {
    Resource::Network(Network {
        id: format!("net-{}", name),
        name: name.to_string(),
        ..Default::default()
    })
}

fn type_text(app: &mut App, text: &str) {
    for c in text.chars() {
        handle_key(app, key(KeyCode::Char(c)));
    }
}

#[test]
fn container_drills_into_the_volumes_and_networks_it_uses() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut app = app_with(FakeBackend::default(), ResourceKind::Containers, &rt);
    let web = Resource::Container(Container {
        id: "web".into(),
        name: "web-1".into(),
        volumes: vec!["pgdata".into()],
        networks: vec!["backend".into()],
        ..Default::default()
    });
    deliver(&mut app, ResourceKind::Containers, vec![web]);

    assert_eq!(handle_key(&mut app, key(KeyCode::Char('v'))), Some(InputResult::Consumed));
    assert_eq!(app.active_kind, ResourceKind::Volumes);
    deliver(&mut app, ResourceKind::Volumes, vec![volume("pgdata"), volume("cache")]);
    assert_eq!(row_ids(&app, ResourceKind::Volumes), vec!["pgdata"]);
    assert_eq!(app.active_view().title(&app.scopes), "containers(web-1) > volumes[1]");

    handle_key(&mut app, key(KeyCode::Esc));
    assert_eq!(app.active_kind, ResourceKind::Containers);
    assert!(app.scopes.is_empty());

    handle_key(&mut app, key(KeyCode::Char('n')));
    assert_eq!(app.active_kind, ResourceKind::Networks);
    deliver(&mut app, ResourceKind::Networks, vec![network("backend"), network("frontend")]);
    assert_eq!(row_ids(&app, ResourceKind::Networks), vec!["net-backend"]);
}

#[test]
fn env_key_shows_container_environment() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut app = app_with(FakeBackend::default(), ResourceKind::Containers, &rt);
    deliver(&mut app, ResourceKind::Containers, vec![container("web", "", "Up")]);

    handle_key(&mut app, key(KeyCode::Char('e')));
    assert_eq!(app.inspector.as_ref().map(|i| i.action), Some("env"));

    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        app.drain_events();
        let lines = match app.inspector.as_ref().map(|i| &i.body) {
            Some(InspectorBody::Text(text)) if !text.is_loading() => text.lines().to_vec(),
            _ => Vec::new(),
        };
        if !lines.is_empty() {
            assert_eq!(lines, vec!["HOSTNAME=web", "PATH=/usr/bin"]);
            break;
        }
        assert!(Instant::now() < deadline, "environment never arrived");
        std::thread::sleep(Duration::from_millis(2));
    }
}

#[test]
fn create_prompt_creates_volume_with_typed_name() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let backend = Arc::new(FakeBackend::default());
    let mut app = app_sharing(Arc::clone(&backend), ResourceKind::Volumes, &rt);

    handle_key(&mut app, key(KeyCode::Char('c')));
    type_text(&mut app, "-new vol-1");
    assert_eq!(
        app.mode,
        InputMode::Create {
            kind: ResourceKind::Volumes,
            input: "newvol-1".into(),
        }
    );
    handle_key(&mut app, key(KeyCode::Enter));
    assert!(app.pending_confirmation.is_none());
    assert_eq!(app.active_view().pending_label("newvol-1"), Some("creating"));

    let deadline = Instant::now() + Duration::from_secs(5);
    while backend.calls().is_empty() {
        assert!(Instant::now() < deadline, "create never ran");
        std::thread::sleep(Duration::from_millis(2));
    }
    assert_eq!(backend.calls(), vec![("newvol-1".to_string(), MutationCommand::Create)]);
}

#[test]
fn create_with_empty_name_is_rejected() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let backend = Arc::new(FakeBackend::default());
    let mut app = app_sharing(Arc::clone(&backend), ResourceKind::Networks, &rt);

    handle_key(&mut app, key(KeyCode::Char('c')));
    handle_key(&mut app, key(KeyCode::Enter));
    assert_eq!(app.mode, InputMode::Normal);
    assert_eq!(app.active_view().pending_count(), 0);
    assert!(app.flash.as_ref().is_some_and(|f| f.text.contains("name required")));
    assert!(backend.calls().is_empty());
}

#[test]
fn late_describe_for_closed_inspector_is_ignored() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut app = app_with(FakeBackend::default(), ResourceKind::Volumes, &rt);
    deliver(&mut app, ResourceKind::Volumes, vec![volume("data")]);

    handle_key(&mut app, key(KeyCode::Char('d')));
    assert_eq!(app.front_page(), Page::Inspector);
    let stale = app.inspector.as_ref().map(|i| i.generation).unwrap_or_default();
    handle_key(&mut app, key(KeyCode::Esc));
    handle_key(&mut app, key(KeyCode::Char('d')));

    assert!(!app.apply_event(AppEvent::Described {
        generation: stale,
        result: Ok("old".into()),
    }));
    let current = app.inspector.as_ref().map(|i| i.generation).unwrap_or_default();
    assert!(app.apply_event(AppEvent::Described {
        generation: current,
        result: Ok("volume data".into()),
    }));
}

#[test]
fn counter_reset_never_yields_negative_rate() {
    let mut engine = MetricsEngine::new(120);
    let doc = |rx: u64, cpu: u64, system: u64| {
        json!({
            "cpu_stats": {
                "cpu_usage": { "total_usage": cpu },
                "system_cpu_usage": system,
                "online_cpus": 2
            },
            "memory_stats": { "usage": 100, "limit": 400 },
            "networks": { "eth0": { "rx_bytes": rx, "tx_bytes": 0 } }
        })
    };
    engine.ingest(doc(500, 100, 1000)).unwrap();
    let first = engine.snapshot();
    assert!(first.cpu.is_empty());
    assert!(first.net_rx.is_empty());
    assert_eq!(first.mem, vec![25.0]);

    engine.ingest(doc(10, 200, 2000)).unwrap();
    let second = engine.snapshot();
    assert_eq!(second.net_rx, vec![0.0]);
    assert!((second.cpu[0] - 20.0).abs() < 1e-9);
    assert!(second.last_raw.is_some());
}

#[test]
fn ring_buffer_evicts_oldest() {
    let mut ring = RingBuffer::new(3);
    for i in 1..=4 {
        ring.push(i);
    }
    assert_eq!(ring.to_vec(), vec![2, 3, 4]);
}

