//! Live container telemetry: counter parsing, rate derivation, bounded
//! history and the scaling used to draw it.

pub mod chart;
mod engine;
mod ring;
mod sample;

pub use engine::{
    CurrentValues, MetricsEngine, MetricsSnapshot, PollerHandle, SharedEngine, spawn_poller,
};
pub use ring::RingBuffer;
pub use sample::{MetricsSample, RateSample};
