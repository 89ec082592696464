use std::io::{self, Write};
use crossterm::{
    cursor::MoveTo, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
};

use crate::actions::ResultSummary;
use super::shared::fit;

pub fn render_confirmation(out: &mut impl Write, prompt: &str, forceable: bool, width: usize, height: usize) -> io::Result<()> {
    let y = height.saturating_sub(3) as u16;
    let keys = if forceable {
        "y to confirm, F to force, any other key to cancel"
    } else {
        "y to confirm, any other key to cancel"
    };
    let line = format!("  {} ({})  ", prompt, keys);
    queue!(
        out,
        MoveTo(0, y),
        SetBackgroundColor(Color::DarkRed),
        SetForegroundColor(Color::White),
        SetAttribute(Attribute::Bold),
        Print(fit(&line, width)),
        ResetColor,
        SetAttribute(Attribute::Reset)
    )?;
    Ok(())
}

/// Lines of the partial-failure summary: headline, then one per failure.
pub fn summary_lines(summary: &ResultSummary) -> Vec<String> {
    let mut lines = vec![summary.headline(), String::new()];
    for (id, message) in &summary.failures {
        lines.push(format!("{}: {}", crate::model::short_id(id), message));
    }
    lines.push(String::new());
    lines.push("press any key to dismiss".to_string());
    lines
}

pub fn render_result_modal(out: &mut impl Write, summary: &ResultSummary, width: usize, height: usize) -> io::Result<()> {
    let lines = summary_lines(summary);
    let box_w = width.saturating_sub(8).clamp(20, 100);
    let box_h = (lines.len() + 2).min(height.saturating_sub(2));
    let x = (width.saturating_sub(box_w) / 2) as u16;
    let y = (height.saturating_sub(box_h) / 2) as u16;

    queue!(out, SetBackgroundColor(Color::DarkRed), SetForegroundColor(Color::White))?;
    queue!(out, MoveTo(x, y), Print(fit("", box_w)))?;
    for (i, line) in lines.iter().take(box_h.saturating_sub(2)).enumerate() {
        if i == 0 {
            queue!(out, SetAttribute(Attribute::Bold))?;
        }
        queue!(out, MoveTo(x, y + 1 + i as u16), Print(fit(&format!("  {}", line), box_w)))?;
        if i == 0 {
            queue!(out, SetAttribute(Attribute::Reset), SetBackgroundColor(Color::DarkRed), SetForegroundColor(Color::White))?;
        }
    }
    queue!(out, MoveTo(x, y + box_h.saturating_sub(1) as u16), Print(fit("", box_w)), ResetColor)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_lists_failures_in_order() {
        let summary = ResultSummary {
            label: "remove".into(),
            succeeded: 1,
            total: 3,
            failures: vec![
                ("bbbbbbbbbbbbbbbb".into(), "conflict".into()),
                ("cccc".into(), "not found".into()),
            ],
        };
        let lines = summary_lines(&summary);
        assert_eq!(lines[0], "remove: 1 of 3 succeeded");
        assert_eq!(lines[2], "bbbbbbbbbbbb: conflict");
        assert_eq!(lines[3], "cccc: not found");
    }
}
