use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::debug;

use crate::actions::{ActionRequest, ActionTarget, start_or_restart};
use crate::backend::{LogOptions, SharedBackend};
use crate::event::AppEvent;
use crate::inspector::{
    Inspector, InspectorBody, KeyOutcome, LogInspector, LogSource, MetricsInspector,
    PollerSettings, TextInspector,
};
use crate::model::{FlashKind, MutationCommand, ResourceKind};

use super::App;
use super::state::InputMode;

/// Result of handling a key. `None` from `handle_key` means not handled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputResult {
    Quit,
    Consumed,
    /// Hand the terminal to an interactive shell in this container.
    Shell(String),
}

pub const HELP: &str = "\
Navigation
  j/k, Up/Down     move cursor
  g/G              top / bottom
  Enter            drill into the highlighted row
  Esc              clear filter, then selection, then go back
  :<kind>          jump to a view (containers, images, volumes, networks,
                   services, nodes, compose, secrets)
  /                filter rows
  space            toggle selection
  < / >            previous / next sort column
  +                toggle sort order
  q                quit

Containers
  r  start or restart     x  stop        ctrl-d  delete (F forces)
  l  logs                 m  metrics     d       describe
  e  environment          s  shell       v / n   volumes / networks used

Compose projects
  r  restart   x  stop   l  logs   d  describe

Services
  s  scale   r  restart   ctrl-d  delete   l  logs   d  describe

Images, volumes, networks
  ctrl-d  delete   p  prune unused   d  describe
  c       create (volumes, networks)

Nodes, secrets
  ctrl-d  delete   d  describe

Inspectors
  /  search        n/N  next / previous match (text)
  s  auto-scroll   w  wrap   t  timestamps   C  clear (logs)
  t  graphs / raw JSON (metrics)
  Esc, q  close";

/// Rows available to a full-screen page: header, status and footer excluded.
pub fn page_height() -> usize {
    crossterm::terminal::size()
        .map(|(_, h)| h as usize)
        .unwrap_or(24)
        .saturating_sub(5)
}

pub fn handle_key(app: &mut App, key_event: KeyEvent) -> Option<InputResult> {
    let KeyEvent {
        code, modifiers, ..
    } = key_event;

    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        return Some(InputResult::Quit);
    }

    if app.result_modal.take().is_some() {
        return Some(InputResult::Consumed);
    }

    if let Some(confirmation) = app.pending_confirmation.take() {
        match code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                app.dispatch_action(confirmation.confirm(false));
            }
            KeyCode::Char('F') if confirmation.forceable => {
                app.dispatch_action(confirmation.confirm(true));
            }
            _ => app.set_flash(FlashKind::Info, "cancelled"),
        }
        return Some(InputResult::Consumed);
    }

    if app.mode != InputMode::Normal {
        return handle_prompt(app, code);
    }

    if let Some(inspector) = app.inspector.as_mut() {
        return match inspector.handle_key(code, page_height()) {
            KeyOutcome::Close => {
                app.close_inspector();
                Some(InputResult::Consumed)
            }
            KeyOutcome::Consumed => Some(InputResult::Consumed),
            KeyOutcome::Ignored => None,
        };
    }

    handle_view(app, code, modifiers)
}

fn handle_prompt(app: &mut App, code: KeyCode) -> Option<InputResult> {
    match std::mem::replace(&mut app.mode, InputMode::Normal) {
        InputMode::Normal => None,
        InputMode::Filter => {
            let (view, scopes) = app.active_view_and_scope();
            let mut filter = view.user_filter().to_string();
            match code {
                KeyCode::Enter => return Some(InputResult::Consumed),
                KeyCode::Esc => filter.clear(),
                KeyCode::Backspace => {
                    filter.pop();
                }
                KeyCode::Char(c) => filter.push(c),
                _ => {}
            }
            view.set_filter(filter, scopes.current());
            if code != KeyCode::Esc {
                app.mode = InputMode::Filter;
            }
            Some(InputResult::Consumed)
        }
        InputMode::Command(mut input) => {
            match code {
                KeyCode::Enter => run_command(app, &input),
                KeyCode::Esc => {}
                KeyCode::Backspace => {
                    input.pop();
                    app.mode = InputMode::Command(input);
                }
                KeyCode::Char(c) => {
                    input.push(c);
                    app.mode = InputMode::Command(input);
                }
                _ => app.mode = InputMode::Command(input),
            }
            Some(InputResult::Consumed)
        }
        InputMode::Scale { id, mut input } => {
            match code {
                KeyCode::Enter => match input.trim().parse::<u64>() {
                    Ok(n) => app.request_action(ActionRequest::uniform(
                        ResourceKind::Services,
                        MutationCommand::Scale(n),
                        vec![id],
                    )),
                    Err(_) => app.set_flash(FlashKind::Error, format!("invalid replica count: {}", input)),
                },
                KeyCode::Esc => {}
                KeyCode::Backspace => {
                    input.pop();
                    app.mode = InputMode::Scale { id, input };
                }
                KeyCode::Char(c) if c.is_ascii_digit() => {
                    input.push(c);
                    app.mode = InputMode::Scale { id, input };
                }
                _ => app.mode = InputMode::Scale { id, input },
            }
            Some(InputResult::Consumed)
        }
        InputMode::Create { kind, mut input } => {
            match code {
                KeyCode::Enter => {
                    let name = input.trim();
                    if name.is_empty() {
                        app.set_flash(FlashKind::Error, format!("{} name required", kind.noun()));
                    } else {
                        app.request_action(ActionRequest::uniform(
                            kind,
                            MutationCommand::Create,
                            vec![name.to_string()],
                        ));
                    }
                }
                KeyCode::Esc => {}
                KeyCode::Backspace => {
                    input.pop();
                    app.mode = InputMode::Create { kind, input };
                }
                KeyCode::Char(c) if is_name_char(c, input.is_empty()) => {
                    input.push(c);
                    app.mode = InputMode::Create { kind, input };
                }
                _ => app.mode = InputMode::Create { kind, input },
            }
            Some(InputResult::Consumed)
        }
    }
}

/// Docker object names: alphanumeric first, then `_`, `.` or `-` as well.
fn is_name_char(c: char, first: bool) -> bool {
    c.is_ascii_alphanumeric() || (!first && matches!(c, '_' | '.' | '-'))
}

fn run_command(app: &mut App, input: &str) {
    let cmd = input.trim();
    if cmd.is_empty() {
        return;
    }
    match ResourceKind::from_command(cmd) {
        Some(kind) => app.switch_root(kind),
        None => app.set_flash(FlashKind::Error, format!("unknown command: {}", cmd)),
    }
}

fn handle_view(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Option<InputResult> {
    let kind = app.active_kind;
    let ctrl = modifiers.contains(KeyModifiers::CONTROL);

    if ctrl && code == KeyCode::Char('d') {
        let ids = app.active_view().targets();
        if ids.is_empty() {
            return None;
        }
        app.request_action(ActionRequest::uniform(
            kind,
            MutationCommand::Remove { force: false },
            ids,
        ));
        return Some(InputResult::Consumed);
    }

    match code {
        KeyCode::Char('q') => return Some(InputResult::Quit),
        KeyCode::Esc => {
            if !app.escape() {
                return None;
            }
        }
        KeyCode::Up | KeyCode::Char('k') => move_cursor(app, -1),
        KeyCode::Down | KeyCode::Char('j') => move_cursor(app, 1),
        KeyCode::PageUp => move_cursor(app, -(page_height() as isize)),
        KeyCode::PageDown => move_cursor(app, page_height() as isize),
        KeyCode::Char('g') | KeyCode::Home => app.active_view_and_scope().0.cursor_top(),
        KeyCode::Char('G') | KeyCode::End => app.active_view_and_scope().0.cursor_bottom(),
        KeyCode::Char(' ') => {
            app.active_view_and_scope().0.toggle_selection();
            move_cursor(app, 1);
        }
        KeyCode::Char('<') | KeyCode::Char('>') => {
            let (view, scopes) = app.active_view_and_scope();
            view.cycle_sort_column(code == KeyCode::Char('>'), scopes.current());
        }
        KeyCode::Char('+') => {
            let (view, scopes) = app.active_view_and_scope();
            view.toggle_sort_order(scopes.current());
        }
        KeyCode::Char('/') => app.mode = InputMode::Filter,
        KeyCode::Char(':') => app.mode = InputMode::Command(String::new()),
        KeyCode::Char('?') => {
            let generation = app.next_generation();
            let body = InspectorBody::Text(TextInspector::with_content(HELP));
            app.open_inspector(Inspector::new(generation, kind, "", "", "help", body));
        }
        KeyCode::Enter => {
            if !app.drill_down() {
                return None;
            }
        }
        KeyCode::Char('d') => open_describe(app)?,
        KeyCode::Char('e') if kind == ResourceKind::Containers => open_env(app)?,
        KeyCode::Char('v') if kind == ResourceKind::Containers => {
            if !app.drill_into(ResourceKind::Volumes) {
                return None;
            }
        }
        KeyCode::Char('n') if kind == ResourceKind::Containers => {
            if !app.drill_into(ResourceKind::Networks) {
                return None;
            }
        }
        KeyCode::Char('c') if matches!(kind, ResourceKind::Volumes | ResourceKind::Networks) => {
            app.mode = InputMode::Create {
                kind,
                input: String::new(),
            };
        }
        KeyCode::Char('l') if has_logs(kind) => open_logs(app)?,
        KeyCode::Char('m') if kind == ResourceKind::Containers => open_metrics(app)?,
        KeyCode::Char('r') => restart(app)?,
        KeyCode::Char('x') if matches!(kind, ResourceKind::Containers | ResourceKind::Compose) => {
            let ids = app.active_view().targets();
            if ids.is_empty() {
                return None;
            }
            app.request_action(ActionRequest::uniform(kind, MutationCommand::Stop, ids));
        }
        KeyCode::Char('p')
            if matches!(
                kind,
                ResourceKind::Images | ResourceKind::Volumes | ResourceKind::Networks
            ) =>
        {
            app.request_action(ActionRequest::prune(kind));
        }
        KeyCode::Char('s') if kind == ResourceKind::Services => {
            let service = app.active_view().highlighted()?.as_service()?;
            let id = service.id.clone();
            let input = service.desired_replicas().unwrap_or(1).to_string();
            app.mode = InputMode::Scale { id, input };
        }
        KeyCode::Char('s') if kind == ResourceKind::Containers => {
            let container = app.active_view().highlighted()?.as_container()?;
            let (id, name) = (container.id.clone(), container.name.clone());
            if !container.state.eq_ignore_ascii_case("running") {
                app.set_flash(FlashKind::Error, format!("{} is not running", name));
                return Some(InputResult::Consumed);
            }
            return Some(InputResult::Shell(id));
        }
        _ => return None,
    }
    Some(InputResult::Consumed)
}

fn move_cursor(app: &mut App, delta: isize) {
    app.active_view_and_scope().0.move_cursor(delta);
}

fn has_logs(kind: ResourceKind) -> bool {
    matches!(
        kind,
        ResourceKind::Containers | ResourceKind::Compose | ResourceKind::Services
    )
}

/// Containers pick start or restart per row; compose projects and
/// services always restart.
fn restart(app: &mut App) -> Option<()> {
    let kind = app.active_kind;
    let ids = app.active_view().targets();
    if ids.is_empty() {
        return None;
    }
    let request = match kind {
        ResourceKind::Containers => {
            let view = app.active_view();
            let targets: Vec<ActionTarget> = ids
                .into_iter()
                .map(|id| {
                    let command = view
                        .find(&id)
                        .and_then(|r| r.as_container())
                        .map(start_or_restart)
                        .unwrap_or(MutationCommand::Restart);
                    ActionTarget { id, command }
                })
                .collect();
            let all_start = targets.iter().all(|t| t.command == MutationCommand::Start);
            let all_restart = targets.iter().all(|t| t.command == MutationCommand::Restart);
            let label = match (all_start, all_restart) {
                (true, _) => "start",
                (_, true) => "restart",
                _ => "start/restart",
            };
            ActionRequest {
                kind,
                label: label.to_string(),
                targets,
            }
        }
        ResourceKind::Compose | ResourceKind::Services => {
            ActionRequest::uniform(kind, MutationCommand::Restart, ids)
        }
        _ => return None,
    };
    app.request_action(request);
    Some(())
}

fn highlighted_target(app: &App) -> Option<(String, String)> {
    let resource = app.active_view().highlighted()?;
    Some((resource.id().to_string(), resource.name().to_string()))
}

fn open_describe(app: &mut App) -> Option<()> {
    let kind = app.active_kind;
    let (id, name) = highlighted_target(app)?;
    let generation = app.next_generation();
    let backend: SharedBackend = app.backend.clone();
    let tx = app.tx.clone();
    let target = id.clone();
    app.runtime.spawn(async move {
        let result = backend.describe(kind, &target).await;
        let _ = tx.send(AppEvent::Described { generation, result });
    });
    debug!(kind = %kind, id = %id, generation, "describe dispatched");
    let body = InspectorBody::Text(TextInspector::loading());
    app.open_inspector(Inspector::new(generation, kind, &id, &name, "describe", body));
    Some(())
}

fn open_env(app: &mut App) -> Option<()> {
    let (id, name) = highlighted_target(app)?;
    let generation = app.next_generation();
    let backend: SharedBackend = app.backend.clone();
    let tx = app.tx.clone();
    let target = id.clone();
    app.runtime.spawn(async move {
        let result = backend.env(&target).await.map(|vars| {
            if vars.is_empty() {
                "no environment variables".to_string()
            } else {
                vars.join("\n")
            }
        });
        let _ = tx.send(AppEvent::Described { generation, result });
    });
    let body = InspectorBody::Text(TextInspector::loading());
    app.open_inspector(Inspector::new(
        generation,
        ResourceKind::Containers,
        &id,
        &name,
        "env",
        body,
    ));
    Some(())
}

fn open_logs(app: &mut App) -> Option<()> {
    let kind = app.active_kind;
    let (id, name) = highlighted_target(app)?;
    let generation = app.next_generation();
    let source = LogSource {
        backend: app.backend.clone(),
        runtime: app.runtime.clone(),
        kind,
        id: id.clone(),
    };
    let options = LogOptions {
        timestamps: false,
        tail: app.config.log_tail,
    };
    let body = InspectorBody::Log(LogInspector::open(source, options, app.config.log_buffer));
    app.open_inspector(Inspector::new(generation, kind, &id, &name, "logs", body));
    Some(())
}

fn open_metrics(app: &mut App) -> Option<()> {
    let (id, name) = highlighted_target(app)?;
    let generation = app.next_generation();
    let settings = PollerSettings {
        interval: app.config.metrics_interval,
        history: app.config.history_capacity,
        generation,
    };
    let body = InspectorBody::Metrics(MetricsInspector::open(
        &app.runtime,
        app.backend.clone(),
        &id,
        settings,
        app.tx.clone(),
    ));
    app.open_inspector(Inspector::new(
        generation,
        ResourceKind::Containers,
        &id,
        &name,
        "metrics",
        body,
    ));
    Some(())
}
