//! Optimistic bulk command execution.
//!
//! Dispatch marks every target pending on the render thread, then a
//! background task runs the commands one at a time and posts an
//! [`ActionRun`] back. Completion clears the pending marks and decides
//! between a success flash and a result summary.

use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::backend::{Backend, SharedBackend};
use crate::event::{AppEvent, EventSender};
use crate::model::{Container, MutationCommand, ResourceKind};
use crate::resource_view::ResourceView;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionTarget {
    pub id: String,
    pub command: MutationCommand,
}

/// What to run, decoupled from how feedback is shown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionRequest {
    pub kind: ResourceKind,
    pub label: String,
    pub targets: Vec<ActionTarget>,
}

impl ActionRequest {
    /// Same command for every ID.
    pub fn uniform(kind: ResourceKind, command: MutationCommand, ids: Vec<String>) -> Self {
        Self {
            kind,
            label: command.to_string(),
            targets: ids
                .into_iter()
                .map(|id| ActionTarget { id, command })
                .collect(),
        }
    }

    /// Kind-wide prune. The single target carries the kind's name.
    pub fn prune(kind: ResourceKind) -> Self {
        Self::uniform(kind, MutationCommand::Prune, vec![kind.title().to_string()])
    }

    /// Switch a plain remove to a forced one.
    pub fn forced(mut self) -> Self {
        for t in &mut self.targets {
            if let MutationCommand::Remove { .. } = t.command {
                t.command = MutationCommand::Remove { force: true };
            }
        }
        if let Some(t) = self.targets.first() {
            self.label = t.command.to_string();
        }
        self
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.targets.iter().map(|t| t.id.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    Err(String),
}

/// Result of one action, one outcome per target in target order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionRun {
    pub kind: ResourceKind,
    pub label: String,
    pub outcomes: Vec<(String, Outcome)>,
}

impl ActionRun {
    pub fn target_ids(&self) -> impl Iterator<Item = &str> {
        self.outcomes.iter().map(|(id, _)| id.as_str())
    }

    pub fn outcome(&self, id: &str) -> Option<&Outcome> {
        self.outcomes.iter().find(|(i, _)| i == id).map(|(_, o)| o)
    }

    pub fn failures(&self) -> Vec<(&str, &str)> {
        self.outcomes
            .iter()
            .filter_map(|(id, o)| match o {
                Outcome::Err(msg) => Some((id.as_str(), msg.as_str())),
                Outcome::Ok => None,
            })
            .collect()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| *o == Outcome::Ok)
            .count()
    }
}

/// Shown when at least one target failed; dismissed by any key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultSummary {
    pub label: String,
    pub succeeded: usize,
    pub total: usize,
    pub failures: Vec<(String, String)>,
}

impl ResultSummary {
    pub fn headline(&self) -> String {
        format!(
            "{}: {} of {} succeeded",
            self.label, self.succeeded, self.total
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Completion {
    Success(String),
    Partial(ResultSummary),
}

/// Mark every target pending. Runs on the render thread before any
/// backend call, so feedback is visible immediately.
pub fn begin(view: &mut ResourceView, request: &ActionRequest) {
    for t in &request.targets {
        view.set_pending(t.id.clone(), t.command.pending_label());
    }
}

/// Run each target's command strictly in order, collecting outcomes.
pub async fn run_sequential(backend: &dyn Backend, request: ActionRequest) -> ActionRun {
    let mut outcomes = Vec::with_capacity(request.targets.len());
    for t in &request.targets {
        let outcome = match backend.mutate(request.kind, &t.id, t.command).await {
            Ok(()) => Outcome::Ok,
            Err(e) => {
                warn!(kind = %request.kind, id = %t.id, command = %t.command, error = %e, "action failed");
                Outcome::Err(e.to_string())
            }
        };
        outcomes.push((t.id.clone(), outcome));
    }
    ActionRun {
        kind: request.kind,
        label: request.label,
        outcomes,
    }
}

pub fn spawn(
    handle: &tokio::runtime::Handle,
    backend: SharedBackend,
    request: ActionRequest,
    tx: EventSender,
) {
    info!(kind = %request.kind, label = %request.label, targets = request.targets.len(), "action started");
    handle.spawn(async move {
        let run = run_sequential(backend.as_ref(), request).await;
        let _ = tx.send(AppEvent::ActionFinished(run));
    });
}

/// Apply a finished run to its view: pending marks go away for every
/// target; the selection is cleared only if every target succeeded.
pub fn complete(view: &mut ResourceView, run: &ActionRun) -> Completion {
    for id in run.target_ids() {
        view.clear_pending(id);
    }
    let total = run.outcomes.len();
    let succeeded = run.succeeded();
    info!(kind = %run.kind, label = %run.label, succeeded, total, "action finished");

    if succeeded == total {
        view.clear_selection();
        let what = if total == 1 {
            run.kind.noun().to_string()
        } else {
            format!("{} {}", total, run.kind.title())
        };
        Completion::Success(format!("{}: {} done", run.label, what))
    } else {
        Completion::Partial(ResultSummary {
            label: run.label.clone(),
            succeeded,
            total,
            failures: run
                .failures()
                .into_iter()
                .map(|(id, msg)| (id.to_string(), msg.to_string()))
                .collect(),
        })
    }
}

/// Exited or created containers get started; anything else is restarted.
/// Decided from the last snapshot, which may be stale.
pub fn start_or_restart(container: &Container) -> MutationCommand {
    let status = container.status.to_lowercase();
    if status.contains("exited") || status.contains("created") {
        MutationCommand::Start
    } else {
        MutationCommand::Restart
    }
}

/// A destructive request awaiting `y` (or `F` for force).
#[derive(Clone, Debug)]
pub struct PendingConfirmation {
    pub description: String,
    pub request: ActionRequest,
    pub forceable: bool,
    pub expires: Instant,
}

impl PendingConfirmation {
    pub fn new(request: ActionRequest, timeout: Duration) -> Self {
        let forceable = request
            .targets
            .iter()
            .any(|t| t.command == MutationCommand::Remove { force: false });
        let count = request.targets.len();
        let description = match (request.targets.first(), count) {
            (Some(t), _) if t.command == MutationCommand::Prune => {
                format!("Prune unused {}?", request.kind.title())
            }
            (Some(t), 1) => format!(
                "{} {} {}?",
                capitalize(&request.label),
                request.kind.noun(),
                crate::model::short_id(&t.id)
            ),
            _ => format!(
                "{} {} {}?",
                capitalize(&request.label),
                count,
                request.kind.title()
            ),
        };
        Self {
            description,
            request,
            forceable,
            expires: Instant::now() + timeout,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now > self.expires
    }

    /// The request to run; forced if asked and the request allows it.
    pub fn confirm(self, force: bool) -> ActionRequest {
        if force && self.forceable {
            self.request.forced()
        } else {
            self.request
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut c = s.chars();
    match c.next() {
        None => String::new(),
        Some(f) => f.to_uppercase().to_string() + c.as_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Resource, Volume};

    fn run_with(outcomes: &[(&str, Option<&str>)]) -> ActionRun {
        ActionRun {
            kind: ResourceKind::Volumes,
            label: "remove".into(),
            outcomes: outcomes
                .iter()
                .map(|(id, err)| {
                    let o = match err {
                        Some(m) => Outcome::Err(m.to_string()),
                        None => Outcome::Ok,
                    };
                    (id.to_string(), o)
                })
                .collect(),
        }
    }

    fn view_with(ids: &[&str]) -> ResourceView {
        let mut view = ResourceView::new(ResourceKind::Volumes);
        let rows = ids
            .iter()
            .map(|id| {
                Resource::Volume(Volume {
                    name: id.to_string(),
                    ..Default::default()
                })
            })
            .collect();
        view.update(rows, None);
        view
    }

    #[test]
    fn begin_marks_every_target_pending() {
        let mut view = view_with(&["a", "b"]);
        let req = ActionRequest::uniform(
            ResourceKind::Volumes,
            MutationCommand::Remove { force: false },
            vec!["a".into(), "b".into()],
        );
        begin(&mut view, &req);
        assert_eq!(view.pending_label("a"), Some("deleting"));
        assert_eq!(view.pending_label("b"), Some("deleting"));
    }

    #[test]
    fn partial_failure_keeps_selection_and_clears_pending() {
        let mut view = view_with(&["A", "B", "C"]);
        for _ in 0..3 {
            view.toggle_selection();
            view.move_cursor(1);
        }
        let req = ActionRequest::uniform(
            ResourceKind::Volumes,
            MutationCommand::Remove { force: false },
            view.targets(),
        );
        begin(&mut view, &req);

        let run = run_with(&[("A", None), ("B", Some("volume in use")), ("C", None)]);
        let completion = complete(&mut view, &run);

        assert_eq!(view.pending_count(), 0);
        assert_eq!(view.selected_ids().len(), 3);
        match completion {
            Completion::Partial(summary) => {
                assert_eq!(summary.headline(), "remove: 2 of 3 succeeded");
                assert_eq!(summary.failures, vec![("B".to_string(), "volume in use".to_string())]);
            }
            other => panic!("expected partial, got {:?}", other),
        }
    }

    #[test]
    fn full_success_clears_selection() {
        let mut view = view_with(&["A", "B"]);
        view.toggle_selection();
        let run = run_with(&[("A", None)]);
        assert!(matches!(complete(&mut view, &run), Completion::Success(_)));
        assert!(view.selected_ids().is_empty());
    }

    #[test]
    fn exited_and_created_containers_are_started() {
        let mut c = Container {
            status: "Exited (0)".into(),
            ..Default::default()
        };
        assert_eq!(start_or_restart(&c), MutationCommand::Start);
        c.status = "Created".into();
        assert_eq!(start_or_restart(&c), MutationCommand::Start);
        c.status = "Up".into();
        assert_eq!(start_or_restart(&c), MutationCommand::Restart);
        c.status = "Paused".into();
        assert_eq!(start_or_restart(&c), MutationCommand::Restart);
    }

    #[test]
    fn confirmation_force_only_applies_to_remove() {
        let req = ActionRequest::uniform(
            ResourceKind::Containers,
            MutationCommand::Remove { force: false },
            vec!["0123456789abcdef".into()],
        );
        let pending = PendingConfirmation::new(req, Duration::from_secs(5));
        assert_eq!(pending.description, "Remove container 0123456789ab?");
        let forced = pending.confirm(true);
        assert_eq!(forced.targets[0].command, MutationCommand::Remove { force: true });
        assert_eq!(forced.label, "force remove");

        let prune = PendingConfirmation::new(
            ActionRequest::prune(ResourceKind::Images),
            Duration::from_secs(5),
        );
        assert_eq!(prune.description, "Prune unused images?");
        assert!(!prune.forceable);
        assert_eq!(prune.confirm(true).targets[0].command, MutationCommand::Prune);
    }

    #[test]
    fn confirmation_expires() {
        let req = ActionRequest::prune(ResourceKind::Volumes);
        let pending = PendingConfirmation::new(req, Duration::from_millis(10));
        assert!(!pending.is_expired(Instant::now()));
        assert!(pending.is_expired(Instant::now() + Duration::from_secs(1)));
    }
}
