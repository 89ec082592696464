use super::ResourceKind;

/// What currently owns the main area of the screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Page {
    View(ResourceKind),
    Inspector,
}

/// Severity of a flash message in the status line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlashKind {
    Info,
    Pending,
    Success,
    Error,
}
