use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bollard::Docker;
use bollard::container::{
    InspectContainerOptions, ListContainersOptions, LogOutput, LogsOptions, PruneContainersOptions,
    RemoveContainerOptions, RestartContainerOptions, StatsOptions, StopContainerOptions,
};
use bollard::image::{ListImagesOptions, PruneImagesOptions, RemoveImageOptions};
use bollard::models::ContainerSummary;
use bollard::network::{
    CreateNetworkOptions, InspectNetworkOptions, ListNetworksOptions, PruneNetworksOptions,
};
use bollard::secret::ListSecretsOptions;
use bollard::service::{InspectServiceOptions, ListServicesOptions};
use bollard::volume::{
    CreateVolumeOptions, ListVolumesOptions, PruneVolumesOptions, RemoveVolumeOptions,
};
use futures_util::future::{BoxFuture, FutureExt};
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::format::{
    container_ports, format_bytes, format_rfc3339, format_timestamp, parse_status, service_ports,
    shorten_path,
};
use super::{Backend, LogOptions, LogStreamHandle, swarm};
use crate::error::{BackendError, BackendResult};
use crate::model::{
    ComposeProject, Container, Image, MutationCommand, Network, Node, Resource, ResourceKind,
    Secret, Service, Volume,
};

const PROJECT_LABEL: &str = "com.docker.compose.project";
const CONFIG_FILES_LABEL: &str = "com.docker.compose.project.config_files";
const STOP_TIMEOUT_SECS: i64 = 10;

/// `Backend` over the engine API via bollard.
pub struct DockerBackend {
    client: Docker,
}

impl DockerBackend {
    /// Connect with local defaults and ping the daemon. Failure here is fatal
    /// to the caller; the dashboard never starts without a reachable engine.
    pub async fn connect() -> BackendResult<Self> {
        let client = Docker::connect_with_local_defaults()?;
        client.ping().await?;
        info!("connected to docker daemon");
        Ok(Self { client })
    }

    async fn list_containers(&self) -> BackendResult<Vec<Resource>> {
        let options = ListContainersOptions::<String> {
            all: true,
            ..Default::default()
        };
        let summaries = self.client.list_containers(Some(options)).await?;
        Ok(summaries
            .iter()
            .map(|s| Resource::Container(container_from_summary(s)))
            .collect())
    }

    async fn list_images(&self) -> BackendResult<Vec<Resource>> {
        let options = ListImagesOptions::<String> {
            all: false,
            ..Default::default()
        };
        let images = self.client.list_images(Some(options)).await?;
        Ok(images
            .into_iter()
            .map(|i| {
                let tags: Vec<String> = i
                    .repo_tags
                    .into_iter()
                    .filter(|t| t != "<none>:<none>")
                    .collect();
                Resource::Image(Image {
                    id: i.id,
                    tags: if tags.is_empty() {
                        "<none>".to_string()
                    } else {
                        tags.join(", ")
                    },
                    size: format_bytes(i.size.max(0) as u64),
                    containers: if i.containers < 0 {
                        "-".to_string()
                    } else {
                        i.containers.to_string()
                    },
                    created: format_timestamp(i.created),
                })
            })
            .collect())
    }

    async fn list_volumes(&self) -> BackendResult<Vec<Resource>> {
        let response = self
            .client
            .list_volumes(None::<ListVolumesOptions<String>>)
            .await?;
        Ok(response
            .volumes
            .unwrap_or_default()
            .into_iter()
            .map(|v| {
                Resource::Volume(Volume {
                    name: v.name,
                    driver: v.driver,
                    scope: v.scope.map(|s| s.to_string()).unwrap_or_default(),
                    mountpoint: v.mountpoint,
                    created: v
                        .created_at
                        .map(|d| format_rfc3339(&d.to_string()))
                        .unwrap_or_default(),
                })
            })
            .collect())
    }

    async fn list_networks(&self) -> BackendResult<Vec<Resource>> {
        let networks = self
            .client
            .list_networks(None::<ListNetworksOptions<String>>)
            .await?;
        Ok(networks
            .into_iter()
            .map(|n| {
                Resource::Network(Network {
                    id: n.id.unwrap_or_default(),
                    name: n.name.unwrap_or_default(),
                    driver: n.driver.unwrap_or_default(),
                    scope: n.scope.unwrap_or_default(),
                })
            })
            .collect())
    }

    /// Services plus the task-derived relations: which nodes run a task of
    /// each service and which secrets it mounts.
    async fn list_services(&self) -> BackendResult<Vec<Resource>> {
        let services = self
            .client
            .list_services(None::<ListServicesOptions<String>>)
            .await?;
        let ids: Vec<String> = services.iter().filter_map(|s| s.id.clone()).collect();
        let mut placements = run_blocking(move || swarm::list_task_placements(&ids)).await?;

        Ok(services
            .into_iter()
            .map(|s| {
                let id = s.id.unwrap_or_default();
                let spec = s.spec.unwrap_or_default();
                let container_spec = spec
                    .task_template
                    .and_then(|t| t.container_spec)
                    .unwrap_or_default();
                let image = container_spec
                    .image
                    .unwrap_or_default()
                    .split('@')
                    .next()
                    .unwrap_or_default()
                    .to_string();
                let secret_ids = container_spec
                    .secrets
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|sec| sec.secret_id)
                    .collect();

                let placement = placements.remove(&id).unwrap_or_default();
                let (mode, want) = match spec.mode {
                    Some(m) if m.global.is_some() => ("global", placement.desired as i64),
                    Some(m) => (
                        "replicated",
                        m.replicated.and_then(|r| r.replicas).unwrap_or(0),
                    ),
                    None => ("replicated", 0),
                };
                let ports = s
                    .endpoint
                    .and_then(|e| e.ports)
                    .map(|p| service_ports(&p))
                    .unwrap_or_default();

                Resource::Service(Service {
                    name: spec.name.unwrap_or_default(),
                    image,
                    mode: mode.to_string(),
                    replicas: format!("{}/{}", placement.running, want),
                    ports,
                    node_ids: placement.node_ids,
                    secret_ids,
                    id,
                })
            })
            .collect())
    }

    async fn list_nodes(&self) -> BackendResult<Vec<Resource>> {
        let nodes = run_blocking(swarm::list_nodes).await?;
        Ok(nodes.into_iter().map(Resource::Node).collect())
    }

    async fn list_compose(&self) -> BackendResult<Vec<Resource>> {
        let options = ListContainersOptions::<String> {
            all: true,
            ..Default::default()
        };
        let summaries = self.client.list_containers(Some(options)).await?;
        Ok(compose_projects(&summaries)
            .into_iter()
            .map(Resource::Compose)
            .collect())
    }

    async fn list_secrets(&self) -> BackendResult<Vec<Resource>> {
        let secrets = self
            .client
            .list_secrets(None::<ListSecretsOptions<String>>)
            .await?;
        let services = self
            .client
            .list_services(None::<ListServicesOptions<String>>)
            .await?;

        // secret id -> names of services mounting it
        let mut users: HashMap<String, Vec<String>> = HashMap::new();
        for svc in services {
            let spec = svc.spec.unwrap_or_default();
            let name = spec.name.clone().unwrap_or_default();
            let refs = spec
                .task_template
                .and_then(|t| t.container_spec)
                .and_then(|c| c.secrets)
                .unwrap_or_default();
            for r in refs {
                if let Some(secret_id) = r.secret_id {
                    users.entry(secret_id).or_default().push(name.clone());
                }
            }
        }

        Ok(secrets
            .into_iter()
            .map(|s| {
                let id = s.id.unwrap_or_default();
                Resource::Secret(Secret {
                    name: s.spec.and_then(|sp| sp.name).unwrap_or_default(),
                    services: users.remove(&id).unwrap_or_default().join(", "),
                    created: s
                        .created_at
                        .map(|d| format_rfc3339(&d.to_string()))
                        .unwrap_or_default(),
                    updated: s
                        .updated_at
                        .map(|d| format_rfc3339(&d.to_string()))
                        .unwrap_or_default(),
                    id,
                })
            })
            .collect())
    }

    async fn mutate_container(&self, id: &str, command: MutationCommand) -> BackendResult<()> {
        match command {
            MutationCommand::Start => {
                self.client.start_container::<String>(id, None).await?;
            }
            MutationCommand::Stop => {
                let options = StopContainerOptions { t: STOP_TIMEOUT_SECS };
                self.client.stop_container(id, Some(options)).await?;
            }
            MutationCommand::Restart => {
                let options = RestartContainerOptions {
                    t: STOP_TIMEOUT_SECS as isize,
                };
                self.client.restart_container(id, Some(options)).await?;
            }
            MutationCommand::Remove { force } => {
                let options = RemoveContainerOptions {
                    force,
                    ..Default::default()
                };
                self.client.remove_container(id, Some(options)).await?;
            }
            MutationCommand::Prune => {
                self.client
                    .prune_containers(None::<PruneContainersOptions<String>>)
                    .await?;
            }
            MutationCommand::Scale(_) | MutationCommand::Create => {
                return Err(BackendError::Unsupported {
                    kind: ResourceKind::Containers,
                    command,
                });
            }
        }
        Ok(())
    }

    /// Apply start/stop/restart to every container of a project. Individual
    /// failures are collected into one error naming each container.
    async fn mutate_compose(&self, project: &str, command: MutationCommand) -> BackendResult<()> {
        if !matches!(
            command,
            MutationCommand::Start | MutationCommand::Stop | MutationCommand::Restart
        ) {
            return Err(BackendError::Unsupported {
                kind: ResourceKind::Compose,
                command,
            });
        }

        let containers = project_containers(&self.client, project).await?;
        if containers.is_empty() {
            return Err(BackendError::NotFound(format!(
                "no containers for project {}",
                project
            )));
        }

        let mut failures = Vec::new();
        for c in &containers {
            let Some(id) = c.id.as_deref() else { continue };
            if let Err(e) = self.mutate_container(id, command).await {
                failures.push(format!("{}: {}", container_name(c), e));
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(BackendError::Compose {
                project: project.to_string(),
                failures,
            })
        }
    }

    async fn describe_compose(&self, project: &str) -> BackendResult<String> {
        let containers = project_containers(&self.client, project).await?;
        Ok(serde_json::to_string_pretty(&containers)?)
    }
}

impl Backend for DockerBackend {
    fn list(&self, kind: ResourceKind) -> BoxFuture<'_, BackendResult<Vec<Resource>>> {
        async move {
            match kind {
                ResourceKind::Containers => self.list_containers().await,
                ResourceKind::Images => self.list_images().await,
                ResourceKind::Volumes => self.list_volumes().await,
                ResourceKind::Networks => self.list_networks().await,
                ResourceKind::Services => self.list_services().await,
                ResourceKind::Nodes => self.list_nodes().await,
                ResourceKind::Compose => self.list_compose().await,
                ResourceKind::Secrets => self.list_secrets().await,
            }
        }
        .boxed()
    }

    fn mutate<'a>(
        &'a self,
        kind: ResourceKind,
        id: &'a str,
        command: MutationCommand,
    ) -> BoxFuture<'a, BackendResult<()>> {
        async move {
            debug!(%kind, id, %command, "mutate");
            let unsupported = BackendError::Unsupported { kind, command };
            match (kind, command) {
                (ResourceKind::Containers, _) => self.mutate_container(id, command).await,
                (ResourceKind::Compose, _) => self.mutate_compose(id, command).await,

                (ResourceKind::Images, MutationCommand::Remove { force }) => {
                    let options = RemoveImageOptions {
                        force,
                        ..Default::default()
                    };
                    self.client.remove_image(id, Some(options), None).await?;
                    Ok(())
                }
                (ResourceKind::Images, MutationCommand::Prune) => {
                    self.client
                        .prune_images(None::<PruneImagesOptions<String>>)
                        .await?;
                    Ok(())
                }

                (ResourceKind::Volumes, MutationCommand::Remove { force }) => {
                    let options = RemoveVolumeOptions { force };
                    self.client.remove_volume(id, Some(options)).await?;
                    Ok(())
                }
                (ResourceKind::Volumes, MutationCommand::Create) => {
                    let options = CreateVolumeOptions {
                        name: id,
                        ..Default::default()
                    };
                    let volume = self.client.create_volume(options).await?;
                    info!(name = %volume.name, "volume created");
                    Ok(())
                }
                (ResourceKind::Volumes, MutationCommand::Prune) => {
                    self.client
                        .prune_volumes(None::<PruneVolumesOptions<String>>)
                        .await?;
                    Ok(())
                }

                (ResourceKind::Networks, MutationCommand::Remove { .. }) => {
                    self.client.remove_network(id).await?;
                    Ok(())
                }
                (ResourceKind::Networks, MutationCommand::Create) => {
                    let options = CreateNetworkOptions {
                        name: id,
                        ..Default::default()
                    };
                    let created = self.client.create_network(options).await?;
                    info!(name = id, network = ?created.id, "network created");
                    Ok(())
                }
                (ResourceKind::Networks, MutationCommand::Prune) => {
                    self.client
                        .prune_networks(None::<PruneNetworksOptions<String>>)
                        .await?;
                    Ok(())
                }

                (ResourceKind::Services, MutationCommand::Remove { .. }) => {
                    self.client.delete_service(id).await?;
                    Ok(())
                }
                (ResourceKind::Services, MutationCommand::Scale(replicas)) => {
                    let id = id.to_string();
                    run_blocking(move || swarm::scale_service(&id, replicas)).await
                }
                (ResourceKind::Services, MutationCommand::Restart) => {
                    let id = id.to_string();
                    run_blocking(move || swarm::force_update_service(&id)).await
                }

                (ResourceKind::Nodes, MutationCommand::Remove { force }) => {
                    let id = id.to_string();
                    run_blocking(move || swarm::remove_node(&id, force)).await
                }

                (ResourceKind::Secrets, MutationCommand::Remove { .. }) => {
                    self.client.delete_secret(id).await?;
                    Ok(())
                }

                _ => Err(unsupported),
            }
        }
        .boxed()
    }

    fn stats<'a>(&'a self, id: &'a str) -> BoxFuture<'a, BackendResult<serde_json::Value>> {
        async move {
            let options = StatsOptions {
                stream: false,
                one_shot: true,
            };
            let mut stream = Box::pin(self.client.stats(id, Some(options)));
            match stream.next().await {
                Some(Ok(stats)) => Ok(serde_json::to_value(&stats)?),
                Some(Err(e)) => Err(e.into()),
                None => Err(BackendError::NotFound(format!("stats for {}", id))),
            }
        }
        .boxed()
    }

    fn describe<'a>(
        &'a self,
        kind: ResourceKind,
        id: &'a str,
    ) -> BoxFuture<'a, BackendResult<String>> {
        async move {
            let text = match kind {
                ResourceKind::Containers => serde_json::to_string_pretty(
                    &self
                        .client
                        .inspect_container(id, None::<InspectContainerOptions>)
                        .await?,
                )?,
                ResourceKind::Images => {
                    serde_json::to_string_pretty(&self.client.inspect_image(id).await?)?
                }
                ResourceKind::Volumes => {
                    serde_json::to_string_pretty(&self.client.inspect_volume(id).await?)?
                }
                ResourceKind::Networks => serde_json::to_string_pretty(
                    &self
                        .client
                        .inspect_network(id, None::<InspectNetworkOptions<String>>)
                        .await?,
                )?,
                ResourceKind::Services => serde_json::to_string_pretty(
                    &self
                        .client
                        .inspect_service(id, None::<InspectServiceOptions>)
                        .await?,
                )?,
                ResourceKind::Nodes => {
                    let id = id.to_string();
                    run_blocking(move || swarm::inspect_node(&id)).await?
                }
                ResourceKind::Secrets => {
                    serde_json::to_string_pretty(&self.client.inspect_secret(id).await?)?
                }
                ResourceKind::Compose => self.describe_compose(id).await?,
            };
            Ok(text)
        }
        .boxed()
    }

    fn env<'a>(&'a self, id: &'a str) -> BoxFuture<'a, BackendResult<Vec<String>>> {
        async move {
            let details = self
                .client
                .inspect_container(id, None::<InspectContainerOptions>)
                .await?;
            Ok(details.config.and_then(|c| c.env).unwrap_or_default())
        }
        .boxed()
    }

    fn stream_logs(
        &self,
        kind: ResourceKind,
        id: &str,
        options: LogOptions,
        handle: &tokio::runtime::Handle,
    ) -> LogStreamHandle {
        if kind == ResourceKind::Services {
            return swarm::tail_service_logs(id, options);
        }

        let (tx, rx) = mpsc::unbounded_channel::<String>();
        let kill_flag = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&kill_flag);
        let client = self.client.clone();
        let id = id.to_string();

        let task = handle.spawn(async move {
            // Compose logs follow the project's first container
            let container_id = if kind == ResourceKind::Compose {
                match project_containers(&client, &id).await {
                    Ok(list) => match list.into_iter().find_map(|c| c.id) {
                        Some(cid) => cid,
                        None => {
                            let _ = tx.send(format!("[error] no containers for project {}", id));
                            return;
                        }
                    },
                    Err(e) => {
                        let _ = tx.send(format!("[error] {}", e));
                        return;
                    }
                }
            } else {
                id
            };

            let log_options = LogsOptions::<String> {
                stdout: true,
                stderr: true,
                follow: true,
                tail: options.tail.to_string(),
                timestamps: options.timestamps,
                ..Default::default()
            };
            let mut stream = Box::pin(client.logs(&container_id, Some(log_options)));
            while let Some(item) = stream.next().await {
                if flag.load(Ordering::Relaxed) {
                    break;
                }
                let message = match item {
                    Ok(LogOutput::StdOut { message })
                    | Ok(LogOutput::StdErr { message })
                    | Ok(LogOutput::Console { message }) => message,
                    Ok(LogOutput::StdIn { .. }) => continue,
                    Err(e) => {
                        let _ = tx.send(format!("[error] {}", e));
                        break;
                    }
                };
                for line in String::from_utf8_lossy(&message).lines() {
                    if tx.send(line.to_string()).is_err() {
                        return;
                    }
                }
            }
            debug!(container = %container_id, "log stream ended");
        });

        LogStreamHandle::new(rx, kill_flag, Some(task))
    }
}

// --- Free helper functions ---

/// Run a docker CLI call on the blocking pool.
async fn run_blocking<F, T>(f: F) -> BackendResult<T>
where
    F: FnOnce() -> BackendResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| BackendError::Io(std::io::Error::other(e)))?
}

async fn project_containers(client: &Docker, project: &str) -> BackendResult<Vec<ContainerSummary>> {
    let mut filters = HashMap::new();
    filters.insert(
        "label".to_string(),
        vec![format!("{}={}", PROJECT_LABEL, project)],
    );
    let options = ListContainersOptions::<String> {
        all: true,
        filters,
        ..Default::default()
    };
    Ok(client.list_containers(Some(options)).await?)
}

fn container_name(s: &ContainerSummary) -> String {
    s.names
        .as_ref()
        .and_then(|n| n.first())
        .map(|n| n.trim_start_matches('/').to_string())
        .or_else(|| s.id.clone())
        .unwrap_or_default()
}

fn label<'a>(s: &'a ContainerSummary, key: &str) -> Option<&'a String> {
    s.labels.as_ref().and_then(|l| l.get(key))
}

fn container_from_summary(s: &ContainerSummary) -> Container {
    let (status, age) = parse_status(s.status.as_deref().unwrap_or_default());

    let mut networks: Vec<String> = s
        .network_settings
        .as_ref()
        .and_then(|n| n.networks.as_ref())
        .map(|m| m.keys().cloned().collect())
        .unwrap_or_default();
    networks.sort();

    let volumes = s
        .mounts
        .as_ref()
        .map(|mounts| {
            mounts
                .iter()
                .filter_map(|m| m.name.clone())
                .filter(|n| !n.is_empty())
                .collect()
        })
        .unwrap_or_default();

    Container {
        id: s.id.clone().unwrap_or_default(),
        name: container_name(s),
        image: s.image.clone().unwrap_or_default(),
        image_id: s.image_id.clone().unwrap_or_default(),
        state: s.state.clone().unwrap_or_default(),
        status,
        age,
        ports: container_ports(s),
        project: label(s, PROJECT_LABEL).cloned().unwrap_or_default(),
        created: s.created.map(format_timestamp).unwrap_or_default(),
        networks,
        volumes,
    }
}

/// Group containers into compose projects by their project label.
fn compose_projects(summaries: &[ContainerSummary]) -> Vec<ComposeProject> {
    struct Tally {
        total: usize,
        running: usize,
        config: String,
    }
    let mut projects: BTreeMap<String, Tally> = BTreeMap::new();
    for s in summaries {
        let Some(project) = label(s, PROJECT_LABEL).filter(|p| !p.is_empty()) else {
            continue;
        };
        let tally = projects.entry(project.clone()).or_insert_with(|| Tally {
            total: 0,
            running: 0,
            config: label(s, CONFIG_FILES_LABEL)
                .map(|c| shorten_path(c))
                .unwrap_or_default(),
        });
        tally.total += 1;
        if s.state.as_deref() == Some("running") {
            tally.running += 1;
        }
    }

    projects
        .into_iter()
        .map(|(name, t)| {
            let status = if t.running == t.total {
                "running"
            } else if t.running == 0 {
                "exited"
            } else {
                "partial"
            };
            ComposeProject {
                name,
                ready: format!("{}/{}", t.running, t.total),
                status: status.to_string(),
                config_files: t.config,
            }
        })
        .collect()
}
