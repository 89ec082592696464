//! Error taxonomy for the dashboard core.
//!
//! `BackendError` is what the adapter returns. `DashboardError` classifies a
//! failure by where it surfaced so the caller knows how to recover: fetch
//! errors keep stale rows, action errors are aggregated per ID, stream errors
//! skip a tick. Only `Fatal` ever leaves the event loop.

use thiserror::Error;

use crate::model::{MutationCommand, ResourceKind};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{0}")]
    Docker(#[from] bollard::errors::Error),

    #[error("`{command}` failed: {stderr}")]
    Cli { command: String, stderr: String },

    #[error("{command} is not supported for {kind}")]
    Unsupported {
        kind: ResourceKind,
        command: MutationCommand,
    },

    #[error("not found: {0}")]
    NotFound(String),

    /// Some containers of a compose project failed; one entry per container.
    #[error("project {project}: {}", .failures.join("; "))]
    Compose {
        project: String,
        failures: Vec<String>,
    },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    /// Well-formed JSON that lacks what the reader needs.
    #[error("malformed {0}")]
    Malformed(String),
}

impl BackendError {
    pub fn cli(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        BackendError::Cli {
            command: command.into(),
            stderr: stderr.into().trim().to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("listing {kind} failed: {source}")]
    Fetch {
        kind: ResourceKind,
        #[source]
        source: BackendError,
    },

    #[error("stream: {source}")]
    Stream {
        #[source]
        source: BackendError,
    },

    #[error("{0}")]
    Fatal(String),
}

pub type BackendResult<T> = Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_error_trims_stderr() {
        let err = BackendError::cli("docker service scale web=3", "  no such service\n");
        assert_eq!(err.to_string(), "`docker service scale web=3` failed: no such service");
    }

    #[test]
    fn unsupported_names_kind_and_command() {
        let err = BackendError::Unsupported {
            kind: ResourceKind::Secrets,
            command: MutationCommand::Stop,
        };
        assert_eq!(err.to_string(), "stop is not supported for secrets");
    }
}
