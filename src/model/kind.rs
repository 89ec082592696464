use std::fmt;

/// The fixed set of resource kinds the dashboard manages. Each kind owns one
/// table view for the life of the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    Containers,
    Images,
    Volumes,
    Networks,
    Services,
    Nodes,
    Compose,
    Secrets,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 8] = [
        ResourceKind::Containers,
        ResourceKind::Images,
        ResourceKind::Volumes,
        ResourceKind::Networks,
        ResourceKind::Services,
        ResourceKind::Nodes,
        ResourceKind::Compose,
        ResourceKind::Secrets,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ResourceKind::Containers => "containers",
            ResourceKind::Images => "images",
            ResourceKind::Volumes => "volumes",
            ResourceKind::Networks => "networks",
            ResourceKind::Services => "services",
            ResourceKind::Nodes => "nodes",
            ResourceKind::Compose => "compose",
            ResourceKind::Secrets => "secrets",
        }
    }

    /// Singular noun used by `describe` and in messages.
    pub fn noun(self) -> &'static str {
        match self {
            ResourceKind::Containers => "container",
            ResourceKind::Images => "image",
            ResourceKind::Volumes => "volume",
            ResourceKind::Networks => "network",
            ResourceKind::Services => "service",
            ResourceKind::Nodes => "node",
            ResourceKind::Compose => "compose project",
            ResourceKind::Secrets => "secret",
        }
    }

    pub fn headers(self) -> &'static [&'static str] {
        match self {
            ResourceKind::Containers => &[
                "ID", "NAME", "IMAGE", "STATUS", "AGE", "PORTS", "COMPOSE", "CREATED",
            ],
            ResourceKind::Images => &["ID", "TAGS", "SIZE", "CONTAINERS", "CREATED"],
            ResourceKind::Volumes => &["NAME", "DRIVER", "SCOPE", "MOUNTPOINT", "CREATED"],
            ResourceKind::Networks => &["ID", "NAME", "DRIVER", "SCOPE"],
            ResourceKind::Services => &["ID", "NAME", "IMAGE", "MODE", "REPLICAS", "PORTS"],
            ResourceKind::Nodes => &["ID", "HOSTNAME", "STATUS", "AVAIL", "ROLE", "VERSION"],
            ResourceKind::Compose => &["PROJECT", "READY", "STATUS", "CONFIG FILES"],
            ResourceKind::Secrets => &["ID", "NAME", "SERVICES", "CREATED", "UPDATED"],
        }
    }

    /// Parse a `:command` (or `--view` value) into a kind.
    pub fn from_command(cmd: &str) -> Option<Self> {
        match cmd.trim().to_lowercase().as_str() {
            "c" | "co" | "con" | "container" | "containers" => Some(ResourceKind::Containers),
            "i" | "im" | "img" | "image" | "images" => Some(ResourceKind::Images),
            "v" | "vo" | "vol" | "volume" | "volumes" => Some(ResourceKind::Volumes),
            "n" | "ne" | "net" | "network" | "networks" => Some(ResourceKind::Networks),
            "s" | "se" | "svc" | "service" | "services" => Some(ResourceKind::Services),
            "no" | "node" | "nodes" => Some(ResourceKind::Nodes),
            "cp" | "compose" | "project" | "projects" => Some(ResourceKind::Compose),
            "sec" | "secret" | "secrets" => Some(ResourceKind::Secrets),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_aliases_resolve() {
        assert_eq!(ResourceKind::from_command("co"), Some(ResourceKind::Containers));
        assert_eq!(ResourceKind::from_command(" Images "), Some(ResourceKind::Images));
        assert_eq!(ResourceKind::from_command("no"), Some(ResourceKind::Nodes));
        assert_eq!(ResourceKind::from_command("cp"), Some(ResourceKind::Compose));
        assert_eq!(ResourceKind::from_command("pods"), None);
    }

    #[test]
    fn every_kind_has_headers() {
        for kind in ResourceKind::ALL {
            assert!(!kind.headers().is_empty(), "{kind} has no headers");
        }
    }
}
