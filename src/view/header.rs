use std::io::{self, Write};
use crossterm::{
    cursor::MoveTo, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
};

use crate::model::{FlashKind, ResourceKind};
use super::shared::{fit, separator};

/// What the status row shows, most urgent first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StatusLine {
    /// An input prompt such as `/web_` or `:images_`.
    Prompt(String),
    Flash(FlashKind, String),
    /// Last fetch failure of the view in front.
    FetchError(String),
    Empty,
}

/// Kind bar, title line and separator (rows 0-2).
pub fn render_header(
    out: &mut impl Write,
    active: Option<ResourceKind>,
    title: &str,
    right: &str,
    width: usize,
) -> io::Result<()> {
    queue!(out, MoveTo(0, 0))?;
    write!(out, " ")?;
    for kind in ResourceKind::ALL {
        if Some(kind) == active {
            queue!(out, SetBackgroundColor(Color::DarkBlue), SetForegroundColor(Color::White))?;
        } else {
            queue!(out, SetForegroundColor(Color::DarkGrey))?;
        }
        write!(out, " {} ", kind.title())?;
        queue!(out, ResetColor)?;
    }

    let right = format!("{} ", right);
    let col = width.saturating_sub(right.chars().count());
    queue!(out, MoveTo(col as u16, 0), SetForegroundColor(Color::DarkGrey), Print(&right), ResetColor)?;

    queue!(out, MoveTo(0, 1), SetAttribute(Attribute::Bold))?;
    write!(out, " {}", fit(title, width.saturating_sub(1)))?;
    queue!(out, SetAttribute(Attribute::Reset), MoveTo(0, 2))?;
    separator(out, width)?;
    Ok(())
}

pub fn render_status(out: &mut impl Write, status: &StatusLine, width: usize, height: usize) -> io::Result<()> {
    let y = height.saturating_sub(2) as u16;
    queue!(out, MoveTo(0, y))?;
    let (color, text) = match status {
        StatusLine::Prompt(p) => (Color::Cyan, format!(" {}_", p)),
        StatusLine::Flash(kind, text) => {
            let color = match kind {
                FlashKind::Info => Color::White,
                FlashKind::Pending => Color::Yellow,
                FlashKind::Success => Color::Green,
                FlashKind::Error => Color::Red,
            };
            (color, format!(" {}", text))
        }
        StatusLine::FetchError(e) => (Color::Red, format!(" {}", e)),
        StatusLine::Empty => (Color::Reset, String::new()),
    };
    queue!(out, SetForegroundColor(color), Print(fit(&text, width)), ResetColor)?;
    Ok(())
}
