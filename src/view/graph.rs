use std::io::{self, Write};
use crossterm::{
    cursor::MoveTo, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
};

use crate::backend::format::format_bytes;
use crate::metrics::MetricsSnapshot;
use crate::metrics::chart::{graph_unit, plot, series_max};
use super::shared::{fit, safe_truncate};

const SERIES_COLORS: [Color; 2] = [Color::Green, Color::Cyan];

struct Panel<'a> {
    caption: String,
    series: Vec<&'a [f64]>,
    /// Divide values by this before plotting.
    scale: f64,
    /// Lower bound for the y axis, in scaled units.
    floor: f64,
    axis_unit: &'a str,
}

fn byte_panel<'a>(name: &str, a: (&str, &'a [f64]), b: (&str, &'a [f64]), current: (f64, f64)) -> Panel<'a> {
    let (scale, unit) = graph_unit(series_max(&[a.1, b.1]));
    Panel {
        caption: format!(
            "{}  {} {}/tick  {} {}/tick",
            name,
            a.0,
            format_bytes(current.0 as u64),
            b.0,
            format_bytes(current.1 as u64)
        ),
        series: vec![a.1, b.1],
        scale,
        floor: 1.0,
        axis_unit: unit,
    }
}

fn panels(snap: &MetricsSnapshot) -> [Panel<'_>; 4] {
    let cur = &snap.current;
    [
        Panel {
            caption: format!("CPU  {:.1}%", cur.cpu_percent),
            series: vec![snap.cpu.as_slice()],
            scale: 1.0,
            floor: 100.0,
            axis_unit: "%",
        },
        Panel {
            caption: format!(
                "Memory  {:.1}% ({} / {})",
                cur.mem_percent,
                format_bytes(cur.mem_usage),
                format_bytes(cur.mem_limit)
            ),
            series: vec![snap.mem.as_slice()],
            scale: 1.0,
            floor: 100.0,
            axis_unit: "%",
        },
        byte_panel(
            "Network",
            ("rx", snap.net_rx.as_slice()),
            ("tx", snap.net_tx.as_slice()),
            (cur.rates.net_rx, cur.rates.net_tx),
        ),
        byte_panel(
            "Disk",
            ("read", snap.disk_read.as_slice()),
            ("write", snap.disk_write.as_slice()),
            (cur.rates.disk_read, cur.rates.disk_write),
        ),
    ]
}

fn render_panel(out: &mut impl Write, panel: &Panel, x: u16, y: u16, width: usize, height: usize) -> io::Result<()> {
    queue!(out, MoveTo(x, y), SetAttribute(Attribute::Bold), Print(fit(&panel.caption, width)), SetAttribute(Attribute::Reset))?;
    let chart_height = height.saturating_sub(1);
    if chart_height == 0 {
        return Ok(());
    }

    let scaled: Vec<Vec<f64>> = panel
        .series
        .iter()
        .map(|s| s.iter().map(|v| v / panel.scale).collect())
        .collect();
    let refs: Vec<&[f64]> = scaled.iter().map(Vec::as_slice).collect();

    const AXIS: usize = 9;
    let chart = plot(&refs, width.saturating_sub(AXIS), chart_height, panel.floor);

    for (row, cells) in chart.cells.iter().enumerate() {
        queue!(out, MoveTo(x, y + 1 + row as u16), SetForegroundColor(Color::DarkGrey))?;
        let label = if row == 0 {
            format!("{:>6.1}{:<2}", chart.max, panel.axis_unit)
        } else if row + 1 == chart.cells.len() {
            format!("{:>6}{:<2}", 0, panel.axis_unit)
        } else {
            " ".repeat(AXIS - 1)
        };
        write!(out, "{}│", safe_truncate(&label, AXIS - 1))?;
        queue!(out, ResetColor)?;
        for cell in cells {
            match cell {
                Some(idx) => {
                    let color = SERIES_COLORS[*idx % SERIES_COLORS.len()];
                    queue!(out, SetForegroundColor(color), Print('█'), ResetColor)?;
                }
                None => write!(out, " ")?,
            }
        }
    }
    Ok(())
}

/// Four panels in a 2x2 grid, sized to the area on every draw.
pub fn render_metrics(out: &mut impl Write, snap: &MetricsSnapshot, top: u16, height: usize, width: usize) -> io::Result<()> {
    if snap.ticks == 0 {
        queue!(out, MoveTo(2, top), SetForegroundColor(Color::DarkGrey), Print("Waiting for stats..."), ResetColor)?;
        return Ok(());
    }
    let half_w = width / 2;
    let half_h = height / 2;
    for (i, panel) in panels(snap).iter().enumerate() {
        let x = if i % 2 == 0 { 0 } else { half_w };
        let y = top as usize + if i < 2 { 0 } else { half_h };
        render_panel(out, panel, x as u16, y as u16, half_w.saturating_sub(1), half_h.saturating_sub(1))?;
    }
    Ok(())
}

/// Last raw stats document, pretty-printed.
pub fn render_raw(out: &mut impl Write, snap: &MetricsSnapshot, top: u16, height: usize, width: usize) -> io::Result<()> {
    let text = match &snap.last_raw {
        Some(raw) => serde_json::to_string_pretty(raw).unwrap_or_else(|e| format!("error: {}", e)),
        None => "no stats yet".to_string(),
    };
    for (i, line) in text.lines().take(height).enumerate() {
        queue!(out, MoveTo(0, top + i as u16), Print(safe_truncate(line, width)))?;
    }
    Ok(())
}
