//! Display shaping for values the engine reports in raw form.

use bollard::models::{ContainerSummary, EndpointPortConfig};

/// Split a `docker ps` status ("Up 5 minutes", "Exited (0) 2 hours ago")
/// into a short status and an age.
pub fn parse_status(raw: &str) -> (String, String) {
    let s = raw.trim();

    if s.ends_with("(Paused)") {
        let rest = s.trim_start_matches("Up ").trim_end_matches(" (Paused)");
        return ("Paused".to_string(), shorten_duration(rest));
    }
    if let Some(rest) = s.strip_prefix("Up") {
        // "Up 3 hours (healthy)"
        let rest = rest.split(" (").next().unwrap_or_default();
        return ("Up".to_string(), shorten_duration(rest.trim()));
    }
    if s.starts_with("Exited") {
        return match s.split_once(") ") {
            Some((code, age)) => (
                format!("{})", code),
                shorten_duration(age.trim_end_matches(" ago")),
            ),
            None => ("Exited".to_string(), s.to_string()),
        };
    }
    if s.starts_with("Created") {
        return ("Created".to_string(), "-".to_string());
    }
    if s.starts_with("Exiting") {
        return ("Exiting".to_string(), "-".to_string());
    }
    if s.to_lowercase().contains("starting") {
        return ("Starting".to_string(), "-".to_string());
    }
    (s.to_string(), "-".to_string())
}

/// "5 minutes" -> "5m", "About an hour" -> "1h".
pub fn shorten_duration(d: &str) -> String {
    let d = d.to_lowercase();
    if d.contains("less than") {
        return "1s".to_string();
    }
    let d = d
        .replace("about ", "")
        .replace("an ", "1 ")
        .replace("a ", "1 ");
    let d = d.trim_end_matches(" ago");

    let mut parts = d.split_whitespace();
    let (Some(val), Some(unit)) = (parts.next(), parts.next()) else {
        return d.to_string();
    };
    if val == "0" && unit.starts_with("second") {
        return "1s".to_string();
    }
    let suffix = if unit.starts_with("second") {
        "s"
    } else if unit.starts_with("minute") {
        "m"
    } else if unit.starts_with("hour") {
        "h"
    } else if unit.starts_with("day") {
        "d"
    } else if unit.starts_with("week") {
        "w"
    } else if unit.starts_with("month") {
        "mo"
    } else if unit.starts_with("year") {
        "y"
    } else {
        return d.to_string();
    };
    format!("{}{}", val, suffix)
}

/// Binary-unit byte size: "512 B", "1.5 KiB", "2.0 GiB".
pub fn format_bytes(b: u64) -> String {
    const UNIT: u64 = 1024;
    if b < UNIT {
        return format!("{} B", b);
    }
    let mut div = UNIT;
    let mut exp = 0;
    let mut n = b / UNIT;
    while n >= UNIT && exp < 5 {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    let prefix = ['K', 'M', 'G', 'T', 'P', 'E'][exp];
    format!("{:.1} {}iB", b as f64 / div as f64, prefix)
}

/// Unix seconds to local "YYYY-MM-DD HH:MM".
pub fn format_timestamp(ts: i64) -> String {
    match chrono::DateTime::from_timestamp(ts, 0) {
        Some(dt) => dt
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        None => "-".to_string(),
    }
}

/// RFC 3339 engine timestamp to the same short form; unparsable input is kept.
pub fn format_rfc3339(ts: &str) -> String {
    match chrono::DateTime::parse_from_rfc3339(ts) {
        Ok(dt) => dt
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        Err(_) => ts.to_string(),
    }
}

/// Replace the home directory prefix with `~`.
pub fn shorten_path(path: &str) -> String {
    match std::env::var("HOME") {
        Ok(home) if !home.is_empty() && path.starts_with(&home) => {
            format!("~{}", &path[home.len()..])
        }
        _ => path.to_string(),
    }
}

pub fn container_ports(s: &ContainerSummary) -> String {
    let Some(ports) = &s.ports else { return String::new() };
    let mut parts: Vec<String> = ports
        .iter()
        .map(|p| {
            let proto = p
                .typ
                .as_ref()
                .map(|t| t.to_string())
                .unwrap_or_else(|| "tcp".to_string());
            match (&p.ip, p.public_port) {
                (Some(ip), Some(public)) => {
                    format!("{}:{}->{}/{}", ip, public, p.private_port, proto)
                }
                _ => format!("{}/{}", p.private_port, proto),
            }
        })
        .collect();
    // IPv4 and IPv6 bindings show up as separate entries
    parts.dedup();
    parts.join(", ")
}

pub fn service_ports(ports: &[EndpointPortConfig]) -> String {
    ports
        .iter()
        .map(|p| {
            let proto = p
                .protocol
                .as_ref()
                .map(|t| t.to_string())
                .unwrap_or_else(|| "tcp".to_string());
            format!(
                "{}->{}/{}",
                p.published_port.unwrap_or_default(),
                p.target_port.unwrap_or_default(),
                proto
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_status_up() {
        assert_eq!(
            parse_status("Up 5 minutes"),
            ("Up".to_string(), "5m".to_string())
        );
        assert_eq!(
            parse_status("Up About an hour (healthy)"),
            ("Up".to_string(), "1h".to_string())
        );
    }

    #[test]
    fn parse_status_exited() {
        assert_eq!(
            parse_status("Exited (137) 2 days ago"),
            ("Exited (137)".to_string(), "2d".to_string())
        );
    }

    #[test]
    fn parse_status_paused_and_created() {
        assert_eq!(
            parse_status("Up 2 hours (Paused)"),
            ("Paused".to_string(), "2h".to_string())
        );
        assert_eq!(
            parse_status("Created"),
            ("Created".to_string(), "-".to_string())
        );
    }

    #[test]
    fn shorten_duration_units() {
        assert_eq!(shorten_duration("Less than a second"), "1s");
        assert_eq!(shorten_duration("3 weeks"), "3w");
        assert_eq!(shorten_duration("2 months ago"), "2mo");
        assert_eq!(shorten_duration("a year"), "1y");
    }

    #[test]
    fn format_bytes_binary_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KiB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.0 GiB");
    }
}
