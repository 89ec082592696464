//! Typed ordering for table cells. A cell is read as a plain number, then a
//! byte size, then a duration, and only then compared as text. Each cell is
//! classified on its own so the result is a total order even when a column
//! mixes shapes; numbers sort before sizes, sizes before durations, and all of
//! them before text.

use std::cmp::Ordering;

#[derive(Clone, Debug, PartialEq)]
pub enum SortKey {
    Number(f64),
    Bytes(f64),
    Duration(f64),
    Text(String),
}

impl SortKey {
    pub fn parse(cell: &str) -> Self {
        let s = cell.trim();
        if let Some(n) = parse_number(s) {
            SortKey::Number(n)
        } else if let Some(b) = parse_bytes(s) {
            SortKey::Bytes(b)
        } else if let Some(d) = parse_duration(s) {
            SortKey::Duration(d)
        } else {
            SortKey::Text(s.to_lowercase())
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SortKey::Number(_) => 0,
            SortKey::Bytes(_) => 1,
            SortKey::Duration(_) => 2,
            SortKey::Text(_) => 3,
        }
    }
}

impl Eq for SortKey {}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Number(a), SortKey::Number(b))
            | (SortKey::Bytes(a), SortKey::Bytes(b))
            | (SortKey::Duration(a), SortKey::Duration(b)) => a.total_cmp(b),
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

fn parse_number(s: &str) -> Option<f64> {
    let s = s.strip_suffix('%').unwrap_or(s);
    let n: f64 = s.parse().ok()?;
    n.is_finite().then_some(n)
}

/// Split "1.5 GiB" / "10MB" into its numeric prefix and unit suffix.
fn split_quantity(s: &str) -> Option<(f64, &str)> {
    let end = s
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
        .map(|(i, _)| i)?;
    if end == 0 {
        return None;
    }
    let value: f64 = s[..end].parse().ok()?;
    Some((value, s[end..].trim()))
}

fn parse_bytes(s: &str) -> Option<f64> {
    let (value, unit) = split_quantity(s)?;
    let factor: f64 = match unit.to_ascii_lowercase().as_str() {
        "b" => 1.0,
        "kb" | "kib" => 1024.0,
        "mb" | "mib" => 1024.0 * 1024.0,
        "gb" | "gib" => 1024.0 * 1024.0 * 1024.0,
        "tb" | "tib" => 1024.0 * 1024.0 * 1024.0 * 1024.0,
        _ => return None,
    };
    Some(value * factor)
}

fn parse_duration(s: &str) -> Option<f64> {
    let (value, unit) = split_quantity(s)?;
    let secs: f64 = match unit {
        "s" => 1.0,
        "m" => 60.0,
        "h" => 3600.0,
        "d" => 86_400.0,
        "w" => 7.0 * 86_400.0,
        "mo" => 30.0 * 86_400.0,
        "y" => 365.0 * 86_400.0,
        _ => return None,
    };
    Some(value * secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compare_values(a: &str, b: &str) -> Ordering {
        SortKey::parse(a).cmp(&SortKey::parse(b))
    }

    #[test]
    fn numbers_compare_numerically() {
        assert_eq!(compare_values("9", "10"), Ordering::Less);
        assert_eq!(compare_values("12.5%", "3%"), Ordering::Greater);
    }

    #[test]
    fn sizes_compare_by_magnitude() {
        assert_eq!(compare_values("900 KiB", "1.2 MiB"), Ordering::Less);
        assert_eq!(compare_values("2GB", "512MB"), Ordering::Greater);
    }

    #[test]
    fn durations_compare_by_length() {
        assert_eq!(compare_values("59m", "2h"), Ordering::Less);
        assert_eq!(compare_values("3d", "1w"), Ordering::Less);
        assert_eq!(compare_values("2mo", "5w"), Ordering::Greater);
    }

    #[test]
    fn text_falls_back_case_insensitive() {
        assert_eq!(compare_values("alpha", "Beta"), Ordering::Less);
        assert_eq!(compare_values("web", "web"), Ordering::Equal);
    }

    #[test]
    fn mixed_column_is_totally_ordered() {
        let mut cells = vec!["-", "5m", "10", "1.5 KiB", "abc", "2"];
        cells.sort_by(|a, b| compare_values(a, b));
        assert_eq!(cells, vec!["2", "10", "1.5 KiB", "5m", "-", "abc"]);
    }
}
