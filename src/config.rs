//! Runtime configuration: built-in defaults, overlaid by an optional YAML
//! file, overlaid by command-line flags.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;
use tracing::debug;

use crate::model::ResourceKind;

pub const MIN_REFRESH_MS: u64 = 500;
pub const MIN_METRICS_MS: u64 = 250;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "dockscope",
    version,
    about = "A terminal dashboard for Docker containers, images, volumes, networks and Swarm."
)]
pub struct CliArgs {
    /// Table refresh interval in milliseconds
    #[arg(long, env = "DOCKSCOPE_REFRESH_MS")]
    pub refresh_ms: Option<u64>,

    /// Metrics inspector poll interval in milliseconds
    #[arg(long, env = "DOCKSCOPE_METRICS_MS")]
    pub metrics_ms: Option<u64>,

    /// Number of points kept per metrics series
    #[arg(long)]
    pub history: Option<usize>,

    /// Number of log lines requested when a log stream starts
    #[arg(long)]
    pub log_tail: Option<u32>,

    /// View shown at startup (containers, images, volumes, ...)
    #[arg(long)]
    pub view: Option<String>,

    /// Path to a YAML config file
    #[arg(long, env = "DOCKSCOPE_CONFIG")]
    pub config: Option<PathBuf>,

    /// tracing filter (for example: info,dockscope=debug)
    #[arg(long, default_value = "info")]
    pub log_filter: String,

    /// Directory for the log file
    #[arg(long, env = "DOCKSCOPE_LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    refresh_ms: Option<u64>,
    metrics_ms: Option<u64>,
    history: Option<usize>,
    log_tail: Option<u32>,
    log_buffer: Option<usize>,
    confirm_timeout_secs: Option<u64>,
    shell: Option<String>,
    view: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub refresh_interval: Duration,
    pub metrics_interval: Duration,
    pub history_capacity: usize,
    pub log_tail: u32,
    pub log_buffer: usize,
    pub confirm_timeout: Duration,
    pub shell: String,
    pub start_view: ResourceKind,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_millis(2_000),
            metrics_interval: Duration::from_millis(1_000),
            history_capacity: 120,
            log_tail: 200,
            log_buffer: 5_000,
            confirm_timeout: Duration::from_secs(5),
            shell: "/bin/sh".to_string(),
            start_view: ResourceKind::Containers,
        }
    }
}

impl Config {
    /// Resolve the effective config. A missing default file is not an error;
    /// an explicitly named file that cannot be read or parsed is.
    pub fn load(args: &CliArgs) -> anyhow::Result<Self> {
        let file = match &args.config {
            Some(path) => read_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => read_file(&path)?,
                _ => ConfigFile::default(),
            },
        };
        Ok(Self::layered(file, args))
    }

    fn layered(file: ConfigFile, args: &CliArgs) -> Self {
        let mut cfg = Config::default();

        if let Some(ms) = args.refresh_ms.or(file.refresh_ms) {
            cfg.refresh_interval = Duration::from_millis(ms.max(MIN_REFRESH_MS));
        }
        if let Some(ms) = args.metrics_ms.or(file.metrics_ms) {
            cfg.metrics_interval = Duration::from_millis(ms.max(MIN_METRICS_MS));
        }
        if let Some(n) = args.history.or(file.history) {
            cfg.history_capacity = n.max(2);
        }
        if let Some(n) = args.log_tail.or(file.log_tail) {
            cfg.log_tail = n;
        }
        if let Some(n) = file.log_buffer {
            cfg.log_buffer = n.max(100);
        }
        if let Some(secs) = file.confirm_timeout_secs {
            cfg.confirm_timeout = Duration::from_secs(secs.max(1));
        }
        if let Some(shell) = file.shell.filter(|s| !s.trim().is_empty()) {
            cfg.shell = shell;
        }
        if let Some(kind) = args
            .view
            .as_deref()
            .or(file.view.as_deref())
            .and_then(ResourceKind::from_command)
        {
            cfg.start_view = kind;
        }
        cfg
    }
}

fn read_file(path: &Path) -> anyhow::Result<ConfigFile> {
    use anyhow::Context;

    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let file: ConfigFile = serde_yaml::from_str(&text)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    debug!(path = %path.display(), "loaded config file");
    Ok(file)
}

fn default_config_path() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(dir).join("dockscope").join("config.yaml"));
    }
    std::env::var_os("HOME").map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join("dockscope")
            .join("config.yaml")
    })
}
