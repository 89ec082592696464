mod dialog;
mod graph;
mod header;
mod inspector;
mod shared;
mod table;

use std::io::{self, Write};
use crossterm::{execute, cursor, queue, style::{Color, SetForegroundColor, ResetColor}, terminal};

pub use dialog::{render_confirmation, render_result_modal, summary_lines};
pub use graph::{render_metrics, render_raw};
pub use header::{StatusLine, render_header, render_status};
pub use inspector::{log_flags, log_screen_lines, render_log, render_text};
pub use shared::{fit, footer, safe_truncate, truncate_str, wrap_line};
pub use table::{column_widths, render_table, scroll_start};

/// First row below the header block.
pub const BODY_TOP: u16 = 3;
/// Header (3 rows) plus status and footer.
pub const CHROME_ROWS: usize = 5;

pub struct Presenter;

/// Minimum terminal dimensions for usable rendering.
pub const MIN_COLS: u16 = 80;
pub const MIN_ROWS: u16 = 10;

impl Presenter {
    /// Check if the terminal is large enough. If not, render a "too small"
    /// message and return `true` (meaning "skip normal rendering").
    pub fn render_size_guard() -> io::Result<bool> {
        let (cols, rows) = terminal::size()?;
        if cols < MIN_COLS || rows < MIN_ROWS {
            let mut out = std::io::stdout();
            execute!(out, terminal::Clear(terminal::ClearType::All), cursor::MoveTo(0, 0))?;
            let msg = format!(
                "Terminal too small ({}x{}). Resize to at least {}x{}.",
                cols, rows, MIN_COLS, MIN_ROWS
            );
            let y = rows / 2;
            let x = cols.saturating_sub(msg.len() as u16) / 2;
            queue!(out, cursor::MoveTo(x, y), SetForegroundColor(Color::Yellow))?;
            write!(out, "{}", msg)?;
            queue!(out, ResetColor)?;
            out.flush()?;
            return Ok(true);
        }
        Ok(false)
    }
}
