//! Drill-down context. Each scope remembers which resource the user entered
//! and links to the scope below it; popping exposes the parent.

use std::sync::Arc;

use crate::model::{Resource, ResourceKind};

#[derive(Clone, Debug, PartialEq)]
pub struct Scope {
    /// Kind of the resource that was drilled into.
    pub kind: ResourceKind,
    /// Matched value: project name, node ID, image ID, volume name, ...
    pub value: String,
    pub label: String,
    /// View the scope was entered from.
    pub origin_view: ResourceKind,
    /// Names the scoped resource itself points at (a container's volumes or
    /// networks); empty for scopes matched by `value`.
    pub related: Vec<String>,
    pub parent: Option<Arc<Scope>>,
}

/// Where a drill-down from a row leads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrillDown {
    pub target: ResourceKind,
    pub value: String,
    pub label: String,
    pub related: Vec<String>,
}

/// Target view and scope value for entering `resource`, or `None` if the
/// kind has no child view.
pub fn drill_down(resource: &Resource) -> Option<DrillDown> {
    let (target, value, label) = match resource {
        Resource::Compose(p) => (ResourceKind::Containers, p.name.clone(), p.name.clone()),
        Resource::Node(n) => (ResourceKind::Services, n.id.clone(), n.hostname.clone()),
        Resource::Image(i) => (ResourceKind::Containers, i.id.clone(), i.tags.clone()),
        Resource::Secret(s) => (ResourceKind::Services, s.id.clone(), s.name.clone()),
        Resource::Network(n) => (ResourceKind::Containers, n.name.clone(), n.name.clone()),
        Resource::Volume(v) => (ResourceKind::Containers, v.name.clone(), v.name.clone()),
        Resource::Container(c) if !c.project.is_empty() => {
            (ResourceKind::Compose, c.project.clone(), c.name.clone())
        }
        Resource::Container(_) | Resource::Service(_) => return None,
    };
    Some(DrillDown {
        target,
        value,
        label,
        related: Vec::new(),
    })
}

/// Drill from a container into the volumes or networks it uses. Any other
/// resource or target has no such relation.
pub fn drill_into(resource: &Resource, target: ResourceKind) -> Option<DrillDown> {
    let Resource::Container(c) = resource else {
        return None;
    };
    let related = match target {
        ResourceKind::Volumes => c.volumes.clone(),
        ResourceKind::Networks => c.networks.clone(),
        _ => return None,
    };
    Some(DrillDown {
        target,
        value: c.id.clone(),
        label: c.name.clone(),
        related,
    })
}

/// Whether `resource` belongs in a view narrowed by `scope`. No scope admits
/// everything; a kind pair with no defined relation admits nothing.
pub fn relation(scope: Option<&Scope>, resource: &Resource) -> bool {
    let Some(scope) = scope else { return true };
    let value = scope.value.as_str();
    match (scope.kind, resource) {
        (ResourceKind::Compose, Resource::Container(c)) => c.project == value,
        (ResourceKind::Nodes, Resource::Service(s)) => s.node_ids.iter().any(|n| n == value),
        (ResourceKind::Images, Resource::Container(c)) => c.image_id == value,
        (ResourceKind::Secrets, Resource::Service(s)) => s.secret_ids.iter().any(|id| id == value),
        (ResourceKind::Networks, Resource::Container(c)) => c.networks.iter().any(|n| n == value),
        (ResourceKind::Volumes, Resource::Container(c)) => c.volumes.iter().any(|v| v == value),
        (ResourceKind::Containers, Resource::Compose(p)) => p.name == value,
        (ResourceKind::Containers, Resource::Volume(v)) => scope.related.contains(&v.name),
        (ResourceKind::Containers, Resource::Network(n)) => scope.related.contains(&n.name),
        _ => false,
    }
}

#[derive(Clone, Debug, Default)]
pub struct ScopeStack {
    top: Option<Arc<Scope>>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        kind: ResourceKind,
        value: impl Into<String>,
        label: impl Into<String>,
        origin_view: ResourceKind,
    ) {
        self.push_related(kind, value, label, origin_view, Vec::new());
    }

    pub fn push_related(
        &mut self,
        kind: ResourceKind,
        value: impl Into<String>,
        label: impl Into<String>,
        origin_view: ResourceKind,
        related: Vec<String>,
    ) {
        let scope = Scope {
            kind,
            value: value.into(),
            label: label.into(),
            origin_view,
            related,
            parent: self.top.take(),
        };
        self.top = Some(Arc::new(scope));
    }

    /// Discard the top scope and return it; the parent becomes current.
    pub fn pop(&mut self) -> Option<Arc<Scope>> {
        let top = self.top.take()?;
        self.top = top.parent.clone();
        Some(top)
    }

    pub fn current(&self) -> Option<&Scope> {
        self.top.as_deref()
    }

    pub fn clear(&mut self) {
        self.top = None;
    }

    pub fn is_empty(&self) -> bool {
        self.top.is_none()
    }

    pub fn depth(&self) -> usize {
        let mut n = 0;
        let mut cur = self.top.as_deref();
        while let Some(s) = cur {
            n += 1;
            cur = s.parent.as_deref();
        }
        n
    }

    /// `origin(label)` for each scope, root first.
    pub fn breadcrumbs(&self) -> Vec<String> {
        let mut crumbs = Vec::new();
        let mut cur = self.top.as_deref();
        while let Some(s) = cur {
            crumbs.push(format!("{}({})", s.origin_view, s.label));
            cur = s.parent.as_deref();
        }
        crumbs.reverse();
        crumbs
    }
}
