use std::io::{self, Write};

use crossterm::{cursor::MoveTo, queue, terminal::{self, Clear, ClearType}};

use crate::inspector::InspectorBody;
use crate::model::ResourceKind;
use crate::view::{self, BODY_TOP, CHROME_ROWS, StatusLine};

use super::App;
use super::state::InputMode;

fn view_help(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Containers => "r: (Re)start | x: Stop | ^d: Delete | l: Logs | m: Metrics | d: Describe | e: Env | s: Shell | v: Vols | n: Nets | Enter: Compose | ?: Help",
        ResourceKind::Compose => "Enter: Containers | r: Restart | x: Stop | l: Logs | d: Describe | ?: Help",
        ResourceKind::Services => "s: Scale | r: Restart | ^d: Delete | l: Logs | d: Describe | ?: Help",
        ResourceKind::Images => "Enter: Containers | ^d: Delete | p: Prune | d: Describe | ?: Help",
        ResourceKind::Volumes | ResourceKind::Networks => {
            "Enter: Containers | c: Create | ^d: Delete | p: Prune | d: Describe | ?: Help"
        }
        ResourceKind::Nodes | ResourceKind::Secrets => "Enter: Services | ^d: Delete | d: Describe | ?: Help",
    }
}

fn status_line(app: &App) -> StatusLine {
    match &app.mode {
        InputMode::Filter => return StatusLine::Prompt(format!("/{}", app.active_view().user_filter())),
        InputMode::Command(input) => return StatusLine::Prompt(format!(":{}", input)),
        InputMode::Scale { input, .. } => return StatusLine::Prompt(format!("replicas: {}", input)),
        InputMode::Create { kind, input } => {
            return StatusLine::Prompt(format!("new {} name: {}", kind.noun(), input));
        }
        InputMode::Normal => {}
    }
    if let Some(inspector) = &app.inspector {
        let search = match &inspector.body {
            InspectorBody::Text(t) => Some(t.search()),
            InspectorBody::Log(l) => Some(l.search()),
            InspectorBody::Metrics(_) => None,
        };
        if let Some(s) = search.filter(|s| s.active) {
            return StatusLine::Prompt(format!("/{}", s.query));
        }
    }
    if let Some(flash) = &app.flash {
        return StatusLine::Flash(flash.kind, flash.text.clone());
    }
    if app.inspector.is_none() {
        if let Some(err) = app.active_view().last_error() {
            return StatusLine::FetchError(err.to_string());
        }
    }
    StatusLine::Empty
}

pub fn render(app: &App) -> io::Result<()> {
    let (cols, rows) = terminal::size()?;
    let (width, height) = (cols as usize, rows as usize);
    let body_height = height.saturating_sub(CHROME_ROWS);

    let mut out = io::BufWriter::new(io::stdout());
    queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;

    let right = if app.scheduler.is_paused() {
        "dockscope - paused".to_string()
    } else {
        format!("dockscope - {}", chrono::Local::now().format("%H:%M:%S"))
    };

    match &app.inspector {
        Some(inspector) => {
            let mut title = inspector.title(&app.scopes);
            let help = match &inspector.body {
                InspectorBody::Text(t) => {
                    if !t.matches().is_empty() {
                        title = format!("{}  [{} matches]", title, t.matches().len());
                    }
                    "Esc/q: Back | ↑/↓: Scroll | /: Search | n/N: Next/Prev match"
                }
                InspectorBody::Log(l) => {
                    title = format!("{}  [{}]", title, view::log_flags(l));
                    "Esc/q: Back | ↑/↓: Scroll | s: Auto-scroll | w: Wrap | t: Timestamps | C: Clear | /: Search"
                }
                InspectorBody::Metrics(m) => {
                    if m.show_json {
                        "Esc/q: Back | t: Graphs"
                    } else {
                        "Esc/q: Back | t: Raw JSON"
                    }
                }
            };
            view::render_header(&mut out, None, &title, &right, width)?;
            match &inspector.body {
                InspectorBody::Text(t) => view::render_text(&mut out, t, BODY_TOP, body_height, width)?,
                InspectorBody::Log(l) => view::render_log(&mut out, l, BODY_TOP, body_height, width)?,
                InspectorBody::Metrics(m) => {
                    // copy out under the lock, draw without it
                    let snapshot = m.snapshot();
                    if m.show_json {
                        view::render_raw(&mut out, &snapshot, BODY_TOP, body_height, width)?;
                    } else {
                        view::render_metrics(&mut out, &snapshot, BODY_TOP, body_height, width)?;
                    }
                }
            }
            view::footer(&mut out, help, width, height)?;
        }
        None => {
            let v = app.active_view();
            let mut title = v.title(&app.scopes);
            if !v.user_filter().is_empty() {
                title = format!("{}  /{}", title, v.user_filter());
            }
            if !v.selected_ids().is_empty() {
                title = format!("{}  ({} selected)", title, v.selected_ids().len());
            }
            view::render_header(&mut out, Some(app.active_kind), &title, &right, width)?;
            view::render_table(&mut out, v, BODY_TOP, body_height, width)?;
            view::footer(&mut out, view_help(app.active_kind), width, height)?;
        }
    }

    view::render_status(&mut out, &status_line(app), width, height)?;

    if let Some(confirmation) = &app.pending_confirmation {
        view::render_confirmation(&mut out, &confirmation.description, confirmation.forceable, width, height)?;
    }
    if let Some(summary) = &app.result_modal {
        view::render_result_modal(&mut out, summary, width, height)?;
    }

    out.flush()
}
