//! dockscope: a terminal dashboard for Docker and Swarm resources.
//!
//! The library holds the interactive state engine (scopes, resource views,
//! refresh scheduling, bulk actions, inspectors and metrics) so the binary
//! and the integration tests share it.

pub mod actions;
pub mod app;
pub mod backend;
pub mod compare;
pub mod config;
pub mod error;
pub mod event;
pub mod inspector;
pub mod metrics;
pub mod model;
pub mod resource_view;
pub mod scheduler;
pub mod scope;
pub mod view;
