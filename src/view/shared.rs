use std::io::{self, Write};
use crossterm::{cursor::MoveTo, queue, style::{Color, SetForegroundColor, ResetColor, Print}};

/// Truncate a string to at most `max_len` characters (not bytes), appending "..."
/// if truncated. Safe for multi-byte UTF-8.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_len {
        s.to_string()
    } else {
        let keep = max_len.saturating_sub(3);
        let truncated: String = s.chars().take(keep).collect();
        format!("{}...", truncated)
    }
}

/// Byte-bounded prefix ending on a char boundary.
pub fn safe_truncate(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Truncate or right-pad to exactly `width` characters.
pub fn fit(s: &str, width: usize) -> String {
    let t = truncate_str(s, width);
    let pad = width.saturating_sub(t.chars().count());
    format!("{}{}", t, " ".repeat(pad))
}

/// Split a line into chunks of at most `width` characters.
pub fn wrap_line(s: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let chars: Vec<char> = s.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars.chunks(width).map(|c| c.iter().collect()).collect()
}

pub fn writeln(out: &mut impl Write, text: &str) -> io::Result<()> {
    write!(out, "{}\r\n", text)
}

pub fn separator(out: &mut impl Write, width: usize) -> io::Result<()> {
    queue!(out, SetForegroundColor(Color::DarkGrey))?;
    write!(out, "{}\r\n", "─".repeat(width))?;
    queue!(out, ResetColor)?;
    Ok(())
}

/// Key hints on the last terminal row.
pub fn footer(out: &mut impl Write, help: &str, width: usize, height: usize) -> io::Result<()> {
    let help_y = height.saturating_sub(1) as u16;
    queue!(
        out,
        MoveTo(1, help_y),
        SetForegroundColor(Color::DarkGrey),
        Print(fit(help, width.saturating_sub(1))),
        ResetColor
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_str_long_string() {
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hello", 10), "hello");
    }

    #[test]
    fn truncate_str_utf8() {
        assert_eq!(truncate_str("日本語", 3), "日本語");
        assert_eq!(truncate_str("hello世界", 6), "hel...");
    }

    #[test]
    fn safe_truncate_utf8_boundary() {
        let s = "café";
        assert_eq!(safe_truncate(s, 3), "caf");
        assert_eq!(safe_truncate(s, 5), "café");
    }

    #[test]
    fn fit_pads_and_truncates() {
        assert_eq!(fit("ab", 4), "ab  ");
        assert_eq!(fit("abcdefgh", 6), "abc...");
    }

    #[test]
    fn wrap_line_chunks_by_chars() {
        assert_eq!(wrap_line("abcdef", 4), vec!["abcd", "ef"]);
        assert_eq!(wrap_line("", 4), vec![""]);
    }
}
