//! Stream consumer
//!
//! The consumer drains a [`DocumentQueue`](crate::queue::DocumentQueue),
//! folds documents into time windows and, whenever a window closes, drives
//! the nutrition store, the burst detector and the clustering engine in
//! lockstep to emit developments.
//!
//! Lifecycle: `Created → Running → Stopping → Stopped`. A [`StopHandle`] can
//! request the stop from any thread or task; the run loop observes it within
//! one iteration, processes whatever is still queued and exits.

pub mod checkpoint;
pub mod join;
pub mod pipeline;

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use checkpoint::{Checkpoint, CheckpointLog};
pub use join::{JoinConfig, JoinKind};
pub use pipeline::{Pipeline, RunStats};

use crate::error::ConfigError;
use crate::nlp::RawDocument;
use crate::queue::DocumentQueue;

/// How documents are grouped before processing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowMode {
    /// Fixed-length time windows
    #[default]
    Windowed,
    /// Every dequeued batch is processed at once
    Immediate,
}

/// Which clock closes windows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeMode {
    /// Document timestamps drive the clock (offline replay)
    #[default]
    Simulated,
    /// The wall clock drives the clock
    Live,
}

/// Windowing options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window length in seconds
    pub length_secs: i64,
    pub mode: WindowMode,
    pub time: TimeMode,
    /// Run the burst detector every this many windows
    pub check_every: usize,
    /// Stop after this many seconds without input
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle_timeout_secs: Option<u64>,
    /// Longest suspension while waiting for input
    pub poll_interval_ms: u64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            length_secs: 60,
            mode: WindowMode::Windowed,
            time: TimeMode::Simulated,
            check_every: 1,
            idle_timeout_secs: None,
            poll_interval_ms: 250,
        }
    }
}

impl WindowConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_positive("window.length_secs", self.length_secs as f64)?;
        ConfigError::check_positive("window.check_every", self.check_every as f64)?;
        ConfigError::check_positive("window.poll_interval_ms", self.poll_interval_ms as f64)?;
        if let Some(idle) = self.idle_timeout_secs {
            ConfigError::check_positive("window.idle_timeout_secs", idle as f64)?;
        }
        Ok(())
    }
}

/// How a window's summed term weights become nutrition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NutritionScaling {
    /// Rescale so the heaviest term has nutrition 1
    #[default]
    Max,
    /// Keep the summed weights
    Raw,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NutritionConfig {
    pub scaling: NutritionScaling,
}

/// Consumer lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConsumerState {
    Created = 0,
    Running = 1,
    Stopping = 2,
    Stopped = 3,
}

impl ConsumerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Created,
            1 => Self::Running,
            2 => Self::Stopping,
            _ => Self::Stopped,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for ConsumerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared, atomically updated consumer state
#[derive(Debug, Clone)]
pub(crate) struct SharedState(Arc<AtomicU8>);

impl SharedState {
    pub(crate) fn new() -> Self {
        Self(Arc::new(AtomicU8::new(ConsumerState::Created as u8)))
    }

    pub(crate) fn get(&self) -> ConsumerState {
        ConsumerState::from_u8(self.0.load(Ordering::SeqCst))
    }

    pub(crate) fn set(&self, state: ConsumerState) {
        self.0.store(state as u8, Ordering::SeqCst);
    }

    /// Move from `from` to `to`; false when the state was something else
    pub(crate) fn transition(&self, from: ConsumerState, to: ConsumerState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

/// Requests a consumer stop from another thread or task
#[derive(Debug, Clone)]
pub struct StopHandle {
    state: SharedState,
    queue: DocumentQueue<RawDocument>,
}

impl StopHandle {
    pub(crate) fn new(state: SharedState, queue: DocumentQueue<RawDocument>) -> Self {
        Self { state, queue }
    }

    /// Ask the consumer to stop; returns false when it is already stopping or stopped
    ///
    /// A stop requested before the consumer starts makes it drain and exit
    /// as soon as it runs.
    pub fn stop(&self) -> bool {
        let requested = self
            .state
            .transition(ConsumerState::Running, ConsumerState::Stopping)
            || self
                .state
                .transition(ConsumerState::Created, ConsumerState::Stopping);
        if requested {
            self.queue.wake();
        }
        requested
    }

    pub fn state(&self) -> ConsumerState {
        self.state.get()
    }
}
