//! Swarm operations that go through the `docker` CLI: node and task queries
//! the API client does not cover, service scale and forced restart, and
//! service log following.

use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::debug;

use super::{LogOptions, LogStreamHandle, SharedChild};
use crate::error::{BackendError, BackendResult};
use crate::model::Node;

/// Check if the `docker` CLI binary is available in PATH.
pub fn is_docker_cli_available() -> bool {
    Command::new("docker")
        .arg("version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Run `docker <args>` and return its stdout.
fn docker_output(args: &[&str]) -> BackendResult<String> {
    let output = Command::new("docker").args(args).output()?;
    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    } else {
        Err(BackendError::cli(
            format!("docker {}", args.join(" ")),
            String::from_utf8_lossy(&output.stderr),
        ))
    }
}

fn run_docker(args: &[&str]) -> BackendResult<()> {
    docker_output(args).map(|_| ())
}

/// One line of `docker node ls --format '{{json .}}'`.
#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NodeLine {
    #[serde(rename = "ID")]
    id: String,
    #[serde(default)]
    hostname: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    availability: String,
    #[serde(default)]
    manager_status: String,
    #[serde(default)]
    engine_version: String,
}

impl From<NodeLine> for Node {
    fn from(n: NodeLine) -> Self {
        let role = match n.manager_status.as_str() {
            "" => "worker".to_string(),
            "Leader" => "manager (leader)".to_string(),
            _ => "manager".to_string(),
        };
        Node {
            id: n.id,
            hostname: n.hostname,
            status: n.status.to_lowercase(),
            availability: n.availability.to_lowercase(),
            role,
            version: n.engine_version,
        }
    }
}

fn parse_node_lines(text: &str) -> BackendResult<Vec<Node>> {
    text.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|line| Ok(serde_json::from_str::<NodeLine>(line)?.into()))
        .collect()
}

/// List all nodes in the swarm. Fails on a node that is not a manager.
pub fn list_nodes() -> BackendResult<Vec<Node>> {
    parse_node_lines(&docker_output(&["node", "ls", "--format", "{{json .}}"])?)
}

/// `docker node inspect` output, already pretty-printed JSON.
pub fn inspect_node(node_id: &str) -> BackendResult<String> {
    docker_output(&["node", "inspect", node_id])
}

pub fn remove_node(node_id: &str, force: bool) -> BackendResult<()> {
    if force {
        run_docker(&["node", "rm", "--force", node_id])
    } else {
        run_docker(&["node", "rm", node_id])
    }
}

#[derive(Deserialize, Default)]
struct TaskStatus {
    #[serde(rename = "State", default)]
    state: String,
}

/// The fields of `docker inspect --type task` this dashboard reads.
#[derive(Deserialize)]
struct TaskDoc {
    #[serde(rename = "ServiceID", default)]
    service_id: String,
    #[serde(rename = "NodeID", default)]
    node_id: String,
    #[serde(rename = "DesiredState", default)]
    desired_state: String,
    #[serde(rename = "Status", default)]
    status: TaskStatus,
}

/// Per-service task tally: running and desired counts plus the nodes that
/// run at least one task.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskPlacement {
    pub running: usize,
    pub desired: usize,
    pub node_ids: Vec<String>,
}

fn tally_tasks(text: &str) -> BackendResult<HashMap<String, TaskPlacement>> {
    let docs: Vec<TaskDoc> = serde_json::from_str(text.trim())?;
    let mut placements: HashMap<String, TaskPlacement> = HashMap::new();
    for task in docs {
        if task.service_id.is_empty() {
            continue;
        }
        let entry = placements.entry(task.service_id).or_default();
        if task.desired_state == "running" {
            entry.desired += 1;
        }
        if task.status.state == "running" {
            entry.running += 1;
            if !task.node_id.is_empty() && !entry.node_ids.contains(&task.node_id) {
                entry.node_ids.push(task.node_id);
            }
        }
    }
    Ok(placements)
}

/// Task placement for the given services, keyed by service ID. Two CLI
/// calls: `service ps` for the task IDs, then one `inspect` over all of them.
pub fn list_task_placements(service_ids: &[String]) -> BackendResult<HashMap<String, TaskPlacement>> {
    if service_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let mut args = vec![
        "service",
        "ps",
        "--quiet",
        "--no-trunc",
        "--filter",
        "desired-state=running",
    ];
    args.extend(service_ids.iter().map(String::as_str));
    let listing = docker_output(&args)?;

    let mut task_ids: Vec<&str> = listing.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    task_ids.dedup();
    if task_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let mut args = vec!["inspect", "--type", "task"];
    args.extend(task_ids);
    tally_tasks(&docker_output(&args)?)
}

/// Scale a service to a given number of replicas.
pub fn scale_service(service_id: &str, replicas: u64) -> BackendResult<()> {
    let arg = format!("{}={}", service_id, replicas);
    run_docker(&["service", "scale", "--detach", &arg])
}

/// Force-update a service (rolling restart of all replicas).
pub fn force_update_service(service_id: &str) -> BackendResult<()> {
    run_docker(&["service", "update", "--force", "--detach", service_id])
}

/// Follow `docker service logs`.
pub fn tail_service_logs(service_id: &str, options: LogOptions) -> LogStreamHandle {
    let mut command = Command::new("docker");
    command.args(["service", "logs", "--follow", "--tail"]);
    command.arg(options.tail.to_string());
    if options.timestamps {
        command.arg("--timestamps");
    }
    command.arg(service_id);
    follow_process(command)
}

/// Forward a child's stdout and stderr lines into a log handle. The child is
/// spawned here, before the handle exists, so a kill can never miss it.
fn follow_process(mut command: Command) -> LogStreamHandle {
    let (tx, rx) = mpsc::unbounded_channel::<String>();
    let kill_flag = Arc::new(AtomicBool::new(false));

    let mut child = match command.stdout(Stdio::piped()).stderr(Stdio::piped()).spawn() {
        Ok(c) => c,
        Err(e) => {
            let _ = tx.send(format!("[error] failed to start log stream: {}", e));
            return LogStreamHandle::new(rx, kill_flag, None);
        }
    };
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let slot: SharedChild = Arc::new(Mutex::new(Some(child)));

    let flag = Arc::clone(&kill_flag);
    let reaper = Arc::clone(&slot);
    let program = format!("{:?}", command.get_program());
    thread::spawn(move || {
        let stderr_reader = stderr.map(|stderr| {
            let tx = tx.clone();
            let flag = Arc::clone(&flag);
            thread::spawn(move || forward_lines(BufReader::new(stderr), &tx, &flag))
        });
        if let Some(stdout) = stdout {
            forward_lines(BufReader::new(stdout), &tx, &flag);
        }
        terminate(&reaper);
        if let Some(reader) = stderr_reader {
            let _ = reader.join();
        }
        debug!(program = %program, "log follower ended");
    });

    LogStreamHandle::new(rx, kill_flag, None).with_child(slot)
}

/// Kill and reap the process in `slot`, if it is still there.
pub(super) fn terminate(slot: &Mutex<Option<Child>>) {
    let child = match slot.lock() {
        Ok(mut guard) => guard.take(),
        Err(poisoned) => poisoned.into_inner().take(),
    };
    if let Some(mut child) = child {
        let _ = child.kill();
        let _ = child.wait();
    }
}

fn forward_lines(reader: impl BufRead, tx: &mpsc::UnboundedSender<String>, flag: &AtomicBool) {
    for line in reader.lines() {
        if flag.load(Ordering::Relaxed) {
            break;
        }
        match line {
            Ok(l) => {
                if tx.send(l).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    }
}
