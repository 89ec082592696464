use std::fmt;

/// A single-ID mutation the adapter knows how to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationCommand {
    Start,
    Stop,
    Restart,
    Remove { force: bool },
    /// Kind-wide; the target ID is ignored.
    Prune,
    Scale(u64),
    /// Create a volume or network; the target ID is the new name.
    Create,
}

impl MutationCommand {
    /// Progressive label shown in the status column while the command runs.
    pub fn pending_label(self) -> &'static str {
        match self {
            MutationCommand::Start => "starting",
            MutationCommand::Stop => "stopping",
            MutationCommand::Restart => "restarting",
            MutationCommand::Remove { .. } => "deleting",
            MutationCommand::Prune => "pruning",
            MutationCommand::Scale(_) => "scaling",
            MutationCommand::Create => "creating",
        }
    }

    pub fn is_destructive(self) -> bool {
        matches!(self, MutationCommand::Remove { .. } | MutationCommand::Prune)
    }
}

impl fmt::Display for MutationCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationCommand::Start => write!(f, "start"),
            MutationCommand::Stop => write!(f, "stop"),
            MutationCommand::Restart => write!(f, "restart"),
            MutationCommand::Remove { force: false } => write!(f, "remove"),
            MutationCommand::Remove { force: true } => write!(f, "force remove"),
            MutationCommand::Prune => write!(f, "prune"),
            MutationCommand::Scale(n) => write!(f, "scale to {}", n),
            MutationCommand::Create => write!(f, "create"),
        }
    }
}
