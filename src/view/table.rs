use std::io::{self, Write};
use crossterm::{
    cursor::MoveTo, queue,
    style::{Attribute, Color, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
};

use crate::resource_view::ResourceView;
use super::shared::{fit, writeln};

const MAX_COL: usize = 40;
const MIN_COL: usize = 4;
/// Selection marker plus gap.
const GUTTER: usize = 3;

/// Fit columns to content, then shave the widest until the row fits.
pub fn column_widths(headers: &[&str], rows: &[Vec<String>], available: usize) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count() + 2).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count() + 1).min(MAX_COL);
            }
        }
    }
    let gaps = widths.len();
    while widths.iter().sum::<usize>() + gaps > available {
        let Some((idx, &max)) = widths.iter().enumerate().max_by_key(|(_, w)| **w) else { break };
        if max <= MIN_COL {
            break;
        }
        widths[idx] -= 1;
    }
    widths
}

/// First row index to draw so the cursor stays on screen.
pub fn scroll_start(cursor: usize, height: usize, total: usize) -> usize {
    if height == 0 || total <= height {
        return 0;
    }
    cursor.saturating_sub(height - 1).min(total - height)
}

fn status_color(cell: &str) -> Option<Color> {
    let lower = cell.to_lowercase();
    if lower.ends_with("...") {
        Some(Color::Yellow)
    } else if lower.starts_with("up") || lower == "running" || lower == "ready" {
        Some(Color::Green)
    } else if lower.starts_with("exited") || lower == "down" || lower == "dead" {
        Some(Color::Red)
    } else if lower.starts_with("paused") || lower == "partial" || lower.starts_with("restarting") {
        Some(Color::Yellow)
    } else {
        None
    }
}

/// Table body starting at row `top`, `height` rows tall including the header.
pub fn render_table(
    out: &mut impl Write,
    view: &ResourceView,
    top: u16,
    height: usize,
    width: usize,
) -> io::Result<()> {
    queue!(out, MoveTo(0, top))?;
    let headers = view.headers();
    let rows = view.rows();

    if rows.is_empty() {
        writeln(out, "")?;
        let msg = if view.user_filter().is_empty() {
            format!("  No {} found.", view.kind().title())
        } else {
            format!("  No {} match \"{}\".", view.kind().title(), view.user_filter())
        };
        queue!(out, SetForegroundColor(Color::DarkGrey))?;
        writeln(out, &msg)?;
        queue!(out, ResetColor)?;
        return Ok(());
    }

    let body_height = height.saturating_sub(1);
    let start = scroll_start(view.cursor(), body_height, rows.len());
    let end = (start + body_height).min(rows.len());
    let visible: Vec<Vec<String>> = rows[start..end].iter().map(|r| view.display_cells(r)).collect();
    let widths = column_widths(headers, &visible, width.saturating_sub(GUTTER));

    queue!(out, SetAttribute(Attribute::Bold))?;
    write!(out, "{}", " ".repeat(GUTTER))?;
    for (i, h) in headers.iter().enumerate() {
        let label = if i == view.sort_column() {
            format!("{}{}", h, if view.sort_ascending() { "↑" } else { "↓" })
        } else {
            (*h).to_string()
        };
        write!(out, "{} ", fit(&label, widths[i]))?;
    }
    queue!(out, SetAttribute(Attribute::Reset))?;
    write!(out, "\r\n")?;

    let status_col = view.status_column();
    for (offset, cells) in visible.iter().enumerate() {
        let idx = start + offset;
        let resource = &rows[idx];
        let highlighted = idx == view.cursor();
        let selected = view.is_selected(resource.id());

        if highlighted {
            queue!(out, SetBackgroundColor(Color::DarkGrey), SetForegroundColor(Color::White))?;
        }
        let marker = if selected { " ● " } else { "   " };
        if selected {
            queue!(out, SetForegroundColor(Color::Cyan))?;
        }
        write!(out, "{}", marker)?;
        if selected && !highlighted {
            queue!(out, ResetColor)?;
        } else if selected {
            queue!(out, SetForegroundColor(Color::White))?;
        }

        for (i, cell) in cells.iter().enumerate() {
            let w = widths.get(i).copied().unwrap_or(MIN_COL);
            let color = if Some(i) == status_col { status_color(cell) } else { None };
            if let Some(c) = color {
                queue!(out, SetForegroundColor(c))?;
            }
            write!(out, "{} ", fit(cell, w))?;
            if color.is_some() {
                queue!(out, SetForegroundColor(if highlighted { Color::White } else { Color::Reset }))?;
            }
        }
        queue!(out, ResetColor)?;
        write!(out, "\r\n")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths_follow_content_up_to_cap() {
        let rows = vec![vec!["a".to_string(), "x".repeat(60)]];
        let w = column_widths(&["ID", "NAME"], &rows, 200);
        assert_eq!(w, vec![4, MAX_COL]);
    }

    #[test]
    fn widths_shrink_to_fit() {
        let rows = vec![vec!["x".repeat(30), "y".repeat(30)]];
        let w = column_widths(&["A", "B"], &rows, 40);
        assert!(w.iter().sum::<usize>() + 2 <= 40);
    }

    #[test]
    fn scroll_keeps_cursor_visible() {
        assert_eq!(scroll_start(0, 10, 100), 0);
        assert_eq!(scroll_start(15, 10, 100), 6);
        assert_eq!(scroll_start(99, 10, 100), 90);
        assert_eq!(scroll_start(3, 10, 5), 0);
    }
}
