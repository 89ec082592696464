use super::ResourceKind;

/// Display width of truncated IDs.
pub const SHORT_ID_LEN: usize = 12;

/// Shorten an engine ID for display, dropping a `sha256:` digest prefix.
pub fn short_id(id: &str) -> String {
    let id = id.strip_prefix("sha256:").unwrap_or(id);
    id.chars().take(SHORT_ID_LEN).collect()
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Container {
    pub id: String,
    pub name: String,
    pub image: String,
    pub image_id: String,      // full image ID, used for image drill-down
    pub state: String,         // raw engine state: "running", "exited", ...
    pub status: String,        // short status: "Up", "Exited (0)", "Created"
    pub age: String,           // "5m", "2h", "3d"
    pub ports: String,
    pub project: String,       // compose project label, empty if none
    pub created: String,
    pub networks: Vec<String>, // attached network names
    pub volumes: Vec<String>,  // mounted named volumes
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Image {
    pub id: String,
    pub tags: String,
    pub size: String,
    pub containers: String,
    pub created: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Volume {
    pub name: String,
    pub driver: String,
    pub scope: String,
    pub mountpoint: String,
    pub created: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Network {
    pub id: String,
    pub name: String,
    pub driver: String,
    pub scope: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub image: String,
    pub mode: String,          // "replicated", "global"
    pub replicas: String,      // "running/desired"
    pub ports: String,
    pub node_ids: Vec<String>, // nodes with a running task of this service
    pub secret_ids: Vec<String>,
}

impl Service {
    /// Desired replica count parsed from the `running/desired` column.
    pub fn desired_replicas(&self) -> Option<u64> {
        let (_, desired) = self.replicas.split_once('/')?;
        desired.trim().parse().ok()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Node {
    pub id: String,
    pub hostname: String,
    pub status: String,
    pub availability: String,
    pub role: String,
    pub version: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ComposeProject {
    pub name: String,
    pub ready: String, // "running/total"
    pub status: String,
    pub config_files: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Secret {
    pub id: String,
    pub name: String,
    pub services: String,
    pub created: String,
    pub updated: String,
}

/// One displayable unit. Every variant exposes an ID and an ordered list of
/// cells matching its kind's headers; kind-specific fields are reached by
/// matching on the variant.
#[derive(Clone, Debug, PartialEq)]
pub enum Resource {
    Container(Container),
    Image(Image),
    Volume(Volume),
    Network(Network),
    Service(Service),
    Node(Node),
    Compose(ComposeProject),
    Secret(Secret),
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Container(_) => ResourceKind::Containers,
            Resource::Image(_) => ResourceKind::Images,
            Resource::Volume(_) => ResourceKind::Volumes,
            Resource::Network(_) => ResourceKind::Networks,
            Resource::Service(_) => ResourceKind::Services,
            Resource::Node(_) => ResourceKind::Nodes,
            Resource::Compose(_) => ResourceKind::Compose,
            Resource::Secret(_) => ResourceKind::Secrets,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Resource::Container(c) => &c.id,
            Resource::Image(i) => &i.id,
            Resource::Volume(v) => &v.name,
            Resource::Network(n) => &n.id,
            Resource::Service(s) => &s.id,
            Resource::Node(n) => &n.id,
            Resource::Compose(p) => &p.name,
            Resource::Secret(s) => &s.id,
        }
    }

    /// Human label used for breadcrumbs and confirmation prompts.
    pub fn name(&self) -> &str {
        match self {
            Resource::Container(c) => &c.name,
            Resource::Image(i) => {
                if i.tags.is_empty() {
                    &i.id
                } else {
                    &i.tags
                }
            }
            Resource::Volume(v) => &v.name,
            Resource::Network(n) => &n.name,
            Resource::Service(s) => &s.name,
            Resource::Node(n) => &n.hostname,
            Resource::Compose(p) => {
                if p.config_files.is_empty() {
                    &p.name
                } else {
                    &p.config_files
                }
            }
            Resource::Secret(s) => &s.name,
        }
    }

    pub fn cells(&self) -> Vec<String> {
        match self {
            Resource::Container(c) => vec![
                short_id(&c.id),
                c.name.clone(),
                c.image.clone(),
                c.status.clone(),
                c.age.clone(),
                c.ports.clone(),
                c.project.clone(),
                c.created.clone(),
            ],
            Resource::Image(i) => vec![
                short_id(&i.id),
                i.tags.clone(),
                i.size.clone(),
                i.containers.clone(),
                i.created.clone(),
            ],
            Resource::Volume(v) => vec![
                v.name.clone(),
                v.driver.clone(),
                v.scope.clone(),
                v.mountpoint.clone(),
                v.created.clone(),
            ],
            Resource::Network(n) => vec![
                short_id(&n.id),
                n.name.clone(),
                n.driver.clone(),
                n.scope.clone(),
            ],
            Resource::Service(s) => vec![
                short_id(&s.id),
                s.name.clone(),
                s.image.clone(),
                s.mode.clone(),
                s.replicas.clone(),
                s.ports.clone(),
            ],
            Resource::Node(n) => vec![
                short_id(&n.id),
                n.hostname.clone(),
                n.status.clone(),
                n.availability.clone(),
                n.role.clone(),
                n.version.clone(),
            ],
            Resource::Compose(p) => vec![
                p.name.clone(),
                p.ready.clone(),
                p.status.clone(),
                p.config_files.clone(),
            ],
            Resource::Secret(s) => vec![
                short_id(&s.id),
                s.name.clone(),
                s.services.clone(),
                s.created.clone(),
                s.updated.clone(),
            ],
        }
    }

    pub fn as_container(&self) -> Option<&Container> {
        match self {
            Resource::Container(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_service(&self) -> Option<&Service> {
        match self {
            Resource::Service(s) => Some(s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_id_strips_digest_prefix() {
        assert_eq!(short_id("sha256:0123456789abcdef0123"), "0123456789ab");
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn cells_match_header_count() {
        let samples = vec![
            Resource::Container(Container::default()),
            Resource::Image(Image::default()),
            Resource::Volume(Volume::default()),
            Resource::Network(Network::default()),
            Resource::Service(Service::default()),
            Resource::Node(Node::default()),
            Resource::Compose(ComposeProject::default()),
            Resource::Secret(Secret::default()),
        ];
        for res in samples {
            assert_eq!(res.cells().len(), res.kind().headers().len(), "{}", res.kind());
        }
    }

    #[test]
    fn volume_and_compose_use_name_as_id() {
        let vol = Resource::Volume(Volume {
            name: "pgdata".into(),
            ..Default::default()
        });
        assert_eq!(vol.id(), "pgdata");
        let proj = Resource::Compose(ComposeProject {
            name: "shop".into(),
            config_files: "~/shop/compose.yml".into(),
            ..Default::default()
        });
        assert_eq!(proj.id(), "shop");
        assert_eq!(proj.name(), "~/shop/compose.yml");
    }

    #[test]
    fn desired_replicas_parses_right_side() {
        let svc = Service {
            replicas: "2/3".into(),
            ..Default::default()
        };
        assert_eq!(svc.desired_replicas(), Some(3));
        let global = Service {
            replicas: "global".into(),
            ..Default::default()
        };
        assert_eq!(global.desired_replicas(), None);
    }
}
