use std::io::{self, Write};
use crossterm::{
    cursor::MoveTo, queue,
    style::{Color, ResetColor, SetForegroundColor},
};

use crate::inspector::{LogInspector, STREAM_ENDED, TextInspector};
use super::shared::{safe_truncate, wrap_line, writeln};

pub fn render_text(out: &mut impl Write, text: &TextInspector, top: u16, height: usize, width: usize) -> io::Result<()> {
    queue!(out, MoveTo(0, top))?;
    if text.is_loading() {
        queue!(out, SetForegroundColor(Color::DarkGrey))?;
        writeln(out, "  Loading...")?;
        queue!(out, ResetColor)?;
        return Ok(());
    }

    let current = text.current_match();
    let end = (text.scroll() + height).min(text.lines().len());
    for i in text.scroll()..end {
        let line = &text.lines()[i];
        let shown = safe_truncate(line, width);
        if Some(i) == current {
            queue!(out, SetForegroundColor(Color::Black), crossterm::style::SetBackgroundColor(Color::Yellow))?;
            write!(out, "{}", shown)?;
            queue!(out, ResetColor)?;
            write!(out, "\r\n")?;
        } else if text.search().matches(line) {
            queue!(out, SetForegroundColor(Color::Yellow))?;
            writeln(out, shown)?;
            queue!(out, ResetColor)?;
        } else {
            writeln(out, shown)?;
        }
    }
    Ok(())
}

/// Flattened screen lines for the log buffer, respecting search and wrap.
pub fn log_screen_lines(log: &LogInspector, width: usize) -> Vec<String> {
    let search = log.search();
    let filtering = !search.active && !search.query.is_empty();
    let mut lines = Vec::new();
    for line in log.buffer().iter() {
        if filtering && !search.matches(line) && line != STREAM_ENDED {
            continue;
        }
        if log.wrap {
            lines.extend(wrap_line(line, width));
        } else {
            lines.push(safe_truncate(line, width).to_string());
        }
    }
    lines
}

pub fn render_log(out: &mut impl Write, log: &LogInspector, top: u16, height: usize, width: usize) -> io::Result<()> {
    queue!(out, MoveTo(0, top))?;
    let lines = log_screen_lines(log, width);
    let bottom_start = lines.len().saturating_sub(height);
    let start = if log.auto_scroll {
        bottom_start
    } else {
        bottom_start.saturating_sub(log.scroll_offset())
    };
    let end = (start + height).min(lines.len());

    for line in &lines[start..end] {
        let lower = line.to_lowercase();
        let color = if line == STREAM_ENDED {
            Some(Color::DarkGrey)
        } else if lower.contains("error") || lower.contains("panic") || lower.contains("fatal") {
            Some(Color::Red)
        } else if log.search().matches(line) {
            Some(Color::Yellow)
        } else {
            None
        };
        if let Some(c) = color {
            queue!(out, SetForegroundColor(c))?;
        }
        writeln(out, line)?;
        if color.is_some() {
            queue!(out, ResetColor)?;
        }
    }
    Ok(())
}

/// `FOLLOWING | WRAP | TIMESTAMPS`
pub fn log_flags(log: &LogInspector) -> String {
    let mut flags = vec![if log.auto_scroll { "FOLLOWING" } else { "PAUSED" }];
    if log.wrap {
        flags.push("WRAP");
    }
    if log.timestamps() {
        flags.push("TIMESTAMPS");
    }
    flags.join(" | ")
}
