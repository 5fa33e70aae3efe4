//! Checkpoints
//!
//! A checkpoint marks the close of one window. The window's nutrition lives in
//! the nutrition store under the same timestamp; the checkpoint records the
//! cluster state at that moment.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::vsm::ClusterId;

/// Snapshot taken when a window closes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Timestamp of the window in the nutrition store
    pub timestamp: i64,
    /// Documents folded into the window
    pub documents: usize,
    /// Active clusters after the window was clustered
    pub active_clusters: Vec<ClusterId>,
    /// Clusters that received documents in this window
    pub updated_clusters: Vec<ClusterId>,
}

/// Checkpoints retained for the detector's lookback, oldest first
#[derive(Debug, Clone, Default)]
pub struct CheckpointLog {
    entries: VecDeque<Checkpoint>,
}

impl CheckpointLog {
    pub fn push(&mut self, checkpoint: Checkpoint) {
        self.entries.push_back(checkpoint);
    }

    pub fn latest(&self) -> Option<&Checkpoint> {
        self.entries.back()
    }

    /// Drop checkpoints older than `timestamp`; returns how many were removed
    pub fn retain_since(&mut self, timestamp: i64) -> usize {
        let before = self.entries.len();
        while self
            .entries
            .front()
            .is_some_and(|c| c.timestamp < timestamp)
        {
            self.entries.pop_front();
        }
        before - self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Checkpoint> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
