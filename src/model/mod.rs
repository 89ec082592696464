// Re-export all model types from submodules.

pub use app::{FlashKind, Page};
pub use command::MutationCommand;
pub use kind::ResourceKind;
pub use resource::{
    ComposeProject, Container, Image, Network, Node, Resource, Secret, Service, Volume, short_id,
    SHORT_ID_LEN,
};

mod app;
mod command;
mod kind;
mod resource;
