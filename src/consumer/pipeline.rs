//! Consumer pipeline
//!
//! One task owns the loop: wait for input, dequeue everything, vectorize,
//! fold vectors into the open window and close windows as the clock passes
//! their end. Closing a window writes its nutrition, clusters its vectors,
//! records a checkpoint, optionally runs the burst detector and prunes
//! history the detector no longer needs.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::checkpoint::{Checkpoint, CheckpointLog};
use super::join::{self, JoinConfig};
use super::{
    ConsumerState, NutritionConfig, NutritionScaling, SharedState, StopHandle, TimeMode,
    WindowConfig, WindowMode,
};
use crate::config::EventlineConfig;
use crate::error::{ConfigError, PipelineError};
use crate::nlp::{RawDocument, Vectorizer};
use crate::queue::DocumentQueue;
use crate::tdt::{BurstDetector, MemoryNutritionStore, NutritionStore};
use crate::timeline::Development;
use crate::vsm::{math, ClusterId, ClusteringEngine, Vector};

/// Counters reported when a run ends
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub documents: usize,
    pub skipped: usize,
    pub checkpoints: usize,
    pub developments: usize,
}

/// The consumer state machine
pub struct Pipeline {
    window: WindowConfig,
    nutrition: NutritionConfig,
    join: JoinConfig,
    queue: DocumentQueue<RawDocument>,
    vectorizer: Box<dyn Vectorizer>,
    store: Box<dyn NutritionStore>,
    detector: BurstDetector,
    engine: ClusteringEngine,
    checkpoints: CheckpointLog,
    buffer: Vec<Vector>,
    window_end: Option<i64>,
    windows_closed: usize,
    state: SharedState,
    started: bool,
    sink: Option<UnboundedSender<Development>>,
    developments: Vec<Development>,
    stats: RunStats,
}

impl Pipeline {
    /// Build a consumer over `queue`, rejecting invalid configuration
    pub fn new(
        config: &EventlineConfig,
        queue: DocumentQueue<RawDocument>,
        vectorizer: Box<dyn Vectorizer>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            window: config.window.clone(),
            nutrition: config.nutrition.clone(),
            join: config.join.clone(),
            queue,
            vectorizer,
            store: Box::new(MemoryNutritionStore::new()),
            detector: BurstDetector::from_config(&config.detector)?,
            engine: ClusteringEngine::new(config.clustering.clone())?,
            checkpoints: CheckpointLog::default(),
            buffer: Vec::new(),
            window_end: None,
            windows_closed: 0,
            state: SharedState::new(),
            started: false,
            sink: None,
            developments: Vec::new(),
            stats: RunStats::default(),
        })
    }

    /// Use another nutrition store backend
    pub fn with_store(mut self, store: Box<dyn NutritionStore>) -> Self {
        self.store = store;
        self
    }

    /// Send developments to a channel instead of keeping them
    pub fn with_sink(mut self, sink: UnboundedSender<Development>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn state(&self) -> ConsumerState {
        self.state.get()
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle::new(self.state.clone(), self.queue.clone())
    }

    pub fn store(&self) -> &dyn NutritionStore {
        self.store.as_ref()
    }

    pub fn engine(&self) -> &ClusteringEngine {
        &self.engine
    }

    pub fn detector(&self) -> &BurstDetector {
        &self.detector
    }

    pub fn checkpoints(&self) -> &CheckpointLog {
        &self.checkpoints
    }

    /// Developments kept when no sink is attached
    pub fn developments(&self) -> &[Development] {
        &self.developments
    }

    pub fn take_developments(&mut self) -> Vec<Development> {
        std::mem::take(&mut self.developments)
    }

    /// Run until stopped, idle or out of input
    ///
    /// Documents still queued when the loop ends are processed and the open
    /// window is closed before the state becomes `Stopped`. A pipeline runs
    /// once.
    pub async fn run(&mut self) -> Result<RunStats, PipelineError> {
        if self.started {
            return Err(PipelineError::InvalidState {
                from: self.state.get().as_str(),
                to: ConsumerState::Running.as_str(),
            });
        }
        self.started = true;

        if self
            .state
            .transition(ConsumerState::Created, ConsumerState::Running)
        {
            info!(
                "Consumer running ({} detector, {}s windows)",
                self.detector.name(),
                self.window.length_secs
            );
        }

        let result = match self.run_loop().await {
            Ok(()) => {
                self.state
                    .transition(ConsumerState::Running, ConsumerState::Stopping);
                info!("Consumer stopping");
                self.drain()
            }
            Err(e) => Err(e),
        };

        self.state.set(ConsumerState::Stopped);
        info!(
            "Consumer stopped: {} documents, {} skipped, {} checkpoints, {} developments",
            self.stats.documents,
            self.stats.skipped,
            self.stats.checkpoints,
            self.stats.developments
        );
        result.map(|()| self.stats.clone())
    }

    async fn run_loop(&mut self) -> Result<(), PipelineError> {
        let poll = Duration::from_millis(self.window.poll_interval_ms);
        let idle = self.window.idle_timeout_secs.map(Duration::from_secs);
        let mut last_input = Instant::now();

        if self.is_live_windowed() {
            self.window_end = Some(self.window_end_for(Utc::now().timestamp()));
        }

        while self.state.get() == ConsumerState::Running {
            if self.queue.is_exhausted() {
                info!("Input stream ended");
                break;
            }

            self.queue.wait_for_input(poll).await;
            let batch = self.queue.dequeue_all();
            if !batch.is_empty() {
                last_input = Instant::now();
                self.process_batch(batch)?;
            }

            if self.is_live_windowed() {
                self.close_due_windows(Utc::now().timestamp())?;
            }

            if let Some(idle) = idle {
                if last_input.elapsed() >= idle {
                    info!("No input for {}s", idle.as_secs());
                    break;
                }
            }
        }
        Ok(())
    }

    /// Process what is still queued and close the open window
    fn drain(&mut self) -> Result<(), PipelineError> {
        let batch = self.queue.dequeue_all();
        if !batch.is_empty() {
            info!("Draining {} queued documents", batch.len());
            self.process_batch(batch)?;
        }

        if !self.buffer.is_empty() {
            if let Some(end) = self.window_end {
                self.close_window(end)?;
            }
        }
        Ok(())
    }

    fn is_live_windowed(&self) -> bool {
        self.window.mode == WindowMode::Windowed && self.window.time == TimeMode::Live
    }

    fn process_batch(&mut self, batch: Vec<RawDocument>) -> Result<(), PipelineError> {
        for raw in batch {
            self.stats.documents += 1;
            let vector = match self.vectorizer.vectorize(&raw) {
                Ok(vector) => vector,
                Err(e) => {
                    warn!("Skipping document: {}", e);
                    self.stats.skipped += 1;
                    continue;
                }
            };

            match (self.window.mode, self.window.time) {
                (WindowMode::Windowed, TimeMode::Simulated) => {
                    self.close_due_windows(vector.timestamp)?;
                    if self.window_end.is_none() {
                        self.window_end = Some(self.window_end_for(vector.timestamp));
                    }
                }
                (WindowMode::Windowed, TimeMode::Live) => {
                    if self.window_end.is_none() {
                        self.window_end = Some(self.window_end_for(Utc::now().timestamp()));
                    }
                }
                (WindowMode::Immediate, _) => {}
            }
            self.buffer.push(vector);
        }

        if self.window.mode == WindowMode::Immediate && !self.buffer.is_empty() {
            let now = match self.window.time {
                TimeMode::Simulated => self.buffer.iter().map(|v| v.timestamp).max(),
                TimeMode::Live => Some(Utc::now().timestamp()),
            }
            .unwrap_or_default();
            // Checkpoint timestamps must strictly increase
            let timestamp = match self.checkpoints.latest() {
                Some(last) => now.max(last.timestamp + 1),
                None => now,
            };
            self.close_window(timestamp)?;
        }
        Ok(())
    }

    /// End of the window containing `timestamp`
    fn window_end_for(&self, timestamp: i64) -> i64 {
        let length = self.window.length_secs;
        timestamp.div_euclid(length) * length + length
    }

    /// History span kept behind each checkpoint, a whole number of windows
    fn retention_secs(&self) -> i64 {
        let length = self.window.length_secs;
        let lookback = self.detector.lookback(length).max(length);
        (lookback + length - 1) / length * length
    }

    /// Close every open window whose end is at or before `now`
    ///
    /// Empty windows between documents are recorded too, but only as far
    /// back as the detector can see.
    fn close_due_windows(&mut self, now: i64) -> Result<(), PipelineError> {
        let Some(mut end) = self.window_end else {
            return Ok(());
        };
        let length = self.window.length_secs;
        let retention = self.retention_secs();

        while now >= end {
            self.close_window(end)?;
            end += length;

            let earliest = self.window_end_for(now) - retention;
            if end < earliest {
                debug!("Skipping empty windows from {} to {}", end, earliest);
                end = earliest;
            }
        }
        self.window_end = Some(end);
        Ok(())
    }

    /// Fold the buffered vectors into a checkpoint at `timestamp`
    fn close_window(&mut self, timestamp: i64) -> Result<(), PipelineError> {
        let vectors = std::mem::take(&mut self.buffer);
        let documents = vectors.len();

        let mut nutrition = math::concatenate(vectors.iter().map(Vector::dimensions));
        if self.nutrition.scaling == NutritionScaling::Max {
            math::max_normalize(&mut nutrition);
        }
        self.store.add(timestamp, nutrition);

        let updated = self.engine.cluster_batch(vectors);
        self.windows_closed += 1;
        self.stats.checkpoints += 1;

        debug!(
            "Checkpoint at {}: {} documents, {} active clusters",
            timestamp,
            documents,
            self.engine.active_count()
        );
        self.checkpoints.push(Checkpoint {
            timestamp,
            documents,
            active_clusters: self.engine.active().iter().map(|c| c.id()).collect(),
            updated_clusters: updated.clone(),
        });

        if documents > 0 && self.windows_closed % self.window.check_every == 0 {
            self.detect(timestamp, &updated)?;
        }

        self.prune(timestamp);
        Ok(())
    }

    /// Run the detector and emit a development when clusters support the burst
    fn detect(&mut self, timestamp: i64, updated: &[ClusterId]) -> Result<(), PipelineError> {
        let bursts = self.detector.detect(self.store.as_ref(), timestamp);
        if bursts.is_empty() {
            return Ok(());
        }

        let candidates = updated
            .iter()
            .filter_map(|id| self.engine.get(*id))
            .filter(|c| !c.is_frozen());
        let (clusters, documents) = join::resolve(candidates, &bursts, &self.join);
        if clusters.is_empty() {
            debug!(
                "{} bursty terms at {} but no supporting cluster",
                bursts.len(),
                timestamp
            );
            return Ok(());
        }

        let development = Development::new(timestamp, bursts, documents, clusters);
        info!(
            "Development at {}: [{}] from {} documents",
            timestamp,
            development.term_names().join(", "),
            development.documents.len()
        );
        self.emit(development)
    }

    fn emit(&mut self, development: Development) -> Result<(), PipelineError> {
        self.stats.developments += 1;
        match &self.sink {
            Some(sink) => sink.send(development).map_err(|_| PipelineError::Sink),
            None => {
                self.developments.push(development);
                Ok(())
            }
        }
    }

    /// Evict nutrition and checkpoints the detector no longer reads
    fn prune(&mut self, timestamp: i64) {
        let horizon = timestamp - self.retention_secs();
        let windows = self.store.retain_since(horizon);
        let checkpoints = self.checkpoints.retain_since(horizon);
        if windows > 0 || checkpoints > 0 {
            debug!(
                "Pruned {} nutrition windows and {} checkpoints before {}",
                windows, checkpoints, horizon
            );
        }
    }
}
