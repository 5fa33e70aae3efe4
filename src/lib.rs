//! eventline - streaming burst detection over short-text streams
//!
//! Documents flow through a [`DocumentQueue`](queue::DocumentQueue) into a
//! consumer [`Pipeline`](consumer::Pipeline) that folds them into time
//! windows, records per-window term nutrition, clusters them incrementally
//! and reports a [`Development`](timeline::Development) whenever bursty terms
//! are backed by a cluster.

pub mod config;
pub mod consumer;
pub mod error;
pub mod nlp;
pub mod queue;
pub mod tdt;
pub mod timeline;
pub mod vsm;

pub use config::{load_config, save_config, EventlineConfig};
pub use consumer::{ConsumerState, Pipeline, RunStats, StopHandle};
pub use error::{ConfigError, PipelineError, QueueError};
pub use timeline::Development;
