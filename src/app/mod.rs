mod state;
mod event_loop;
mod render;
mod input;

use std::io;
use std::process::Command;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, Clear, ClearType},
};
use tracing::{info, warn};

use crate::model::FlashKind;
use crate::view::Presenter;

pub use input::{HELP, InputResult, handle_key, page_height};
pub use state::{App, FLASH_LOCK, Flash, InputMode};

/// Input poll timeout; also the cadence at which background results land.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Restore the terminal to normal mode. Safe to call multiple times.
pub fn restore_terminal() {
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
    let _ = disable_raw_mode();
}

fn enter_terminal() -> io::Result<()> {
    enable_raw_mode()?;
    execute!(io::stdout(), EnterAlternateScreen, Clear(ClearType::All))
}

impl App {
    /// Hand the terminal to `docker exec -it <id> <shell>` and take it back.
    /// Refreshes are paused meanwhile so nothing is applied behind it.
    pub fn suspend_for_shell(&mut self, id: &str) -> io::Result<()> {
        self.scheduler.pause();
        restore_terminal();
        info!(container = %id, shell = %self.config.shell, "shell started");

        let status = Command::new("docker")
            .args(["exec", "-it", id, self.config.shell.as_str()])
            .status();

        enter_terminal()?;
        self.scheduler.resume();
        self.scheduler.request_refresh();

        match status {
            Ok(s) if s.success() => self.set_flash(FlashKind::Info, "shell exited"),
            Ok(s) => {
                warn!(container = %id, status = %s, "shell exited with failure");
                self.set_flash(FlashKind::Error, format!("shell exited: {}", s));
            }
            Err(e) => {
                warn!(container = %id, error = %e, "failed to start shell");
                self.set_flash(FlashKind::Error, format!("failed to start shell: {}", e));
            }
        }
        Ok(())
    }
}

/// Run the dashboard until quit or a termination signal.
pub fn run(mut app: App, should_quit: Arc<AtomicBool>) -> io::Result<()> {
    enter_terminal()?;
    let mut needs_render = true;

    loop {
        if should_quit.load(Ordering::Relaxed) {
            break;
        }

        let now = Instant::now();

        if app.expire_confirmation(now) {
            needs_render = true;
        }
        if app.expire_flash(now) {
            needs_render = true;
        }
        if app.process_tick(now) {
            needs_render = true;
        }
        if app.drain_events() {
            needs_render = true;
        }
        if app.poll_inspector() {
            needs_render = true;
        }

        if needs_render {
            if Presenter::render_size_guard()? {
                needs_render = false;
                if crossterm::event::poll(POLL_INTERVAL)? {
                    if let crossterm::event::Event::Resize(_, _) = crossterm::event::read()? {
                        needs_render = true;
                    }
                }
                continue;
            }
            render::render(&app)?;
            needs_render = false;
        }

        if crossterm::event::poll(POLL_INTERVAL)? {
            match crossterm::event::read()? {
                crossterm::event::Event::Key(key_event) => match handle_key(&mut app, key_event) {
                    Some(InputResult::Quit) => break,
                    Some(InputResult::Consumed) => needs_render = true,
                    Some(InputResult::Shell(id)) => {
                        app.suspend_for_shell(&id)?;
                        needs_render = true;
                    }
                    None => {}
                },
                crossterm::event::Event::Resize(_, _) => needs_render = true,
                _ => {}
            }
        }
    }

    app.close_inspector();
    restore_terminal();
    Ok(())
}
