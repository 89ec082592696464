use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use dockscope::app::{self, App};
use dockscope::backend::{DockerBackend, SharedBackend, is_docker_cli_available};
use dockscope::config::{CliArgs, Config};
use dockscope::error::DashboardError;

/// The terminal belongs to the dashboard, so tracing goes to a file.
fn init_tracing(level_filter: &str, dir: &Path) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;
    let filter = EnvFilter::try_new(level_filter)
        .or_else(|_| EnvFilter::try_new("info"))
        .context("failed to initialize tracing filter")?;

    let appender = tracing_appender::rolling::never(dir, "dockscope.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(writer)
        .try_init();
    Ok(guard)
}

fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        app::restore_terminal();
        original_hook(panic_info);
    }));
}

fn main() -> Result<()> {
    let args = CliArgs::parse();
    let log_dir = args.log_dir.clone().unwrap_or_else(std::env::temp_dir);
    let _guard = init_tracing(&args.log_filter, &log_dir)?;
    let config = Config::load(&args)?;
    info!(?config, "starting dockscope");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .build()
        .context("failed to create tokio runtime")?;

    let backend = runtime.block_on(DockerBackend::connect()).map_err(|e| {
        let err = DashboardError::Fatal(format!("cannot connect to docker: {}", e));
        error!(error = %err, "startup failed");
        err
    })?;
    if !is_docker_cli_available() {
        warn!("docker CLI not found; service scaling, service logs and container shells will fail");
    }
    let backend: SharedBackend = Arc::new(backend);

    let should_quit = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&should_quit))
        .context("failed to register SIGINT handler")?;
    signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&should_quit))
        .context("failed to register SIGTERM handler")?;

    install_panic_hook();

    let app = App::new(config, backend, runtime.handle().clone());
    let result = app::run(app, should_quit);
    app::restore_terminal();
    runtime.shutdown_timeout(std::time::Duration::from_millis(500));
    info!("dockscope exited");
    result.context("dashboard loop failed")
}
