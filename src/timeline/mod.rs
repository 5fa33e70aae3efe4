//! Timelines built from developments
//!
//! Developments are grouped into nodes. At most one node is active at a
//! time: while the newest node has not expired, every development joins it.
//! Afterwards a recent node with a similar topic may absorb a development;
//! otherwise a new node starts.

pub mod development;
pub mod mmr;
pub mod node;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use development::{BurstTerm, Development, DocumentRecord, DEVELOPMENT_SCHEMA_VERSION};
pub use mmr::mmr;
pub use node::TimelineNode;

use crate::error::ConfigError;

/// Timeline parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Seconds a node stays active after its creation
    pub expiry: i64,
    /// Minimum topic similarity for an expired node to absorb a development
    pub min_similarity: f64,
    /// Nodes older than this many seconds never absorb developments
    pub max_time: i64,
    /// MMR trade-off between relevance and diversity in summaries
    pub lambda: f64,
    /// Documents per node summary
    pub summary_size: usize,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            expiry: 90,
            min_similarity: 0.6,
            max_time: 600,
            lambda: 0.7,
            summary_size: 3,
        }
    }
}

impl TimelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_non_negative("timeline.expiry", self.expiry as f64)?;
        ConfigError::check_range(
            "timeline.min_similarity",
            self.min_similarity,
            0.0,
            1.0,
            "in [0, 1]",
        )?;
        ConfigError::check_non_negative("timeline.max_time", self.max_time as f64)?;
        ConfigError::check_range("timeline.lambda", self.lambda, 0.0, 1.0, "in [0, 1]")?;
        Ok(())
    }
}

/// A succession of nodes, oldest first
#[derive(Debug, Clone)]
pub struct Timeline {
    config: TimelineConfig,
    nodes: Vec<TimelineNode>,
}

impl Timeline {
    pub fn new(config: TimelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            nodes: Vec::new(),
        })
    }

    pub fn nodes(&self) -> &[TimelineNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a development and return the index of the node that took it
    pub fn add(&mut self, development: Development) -> usize {
        let timestamp = development.timestamp;

        if let Some(latest) = self.nodes.last_mut() {
            if !latest.expired(self.config.expiry, timestamp) {
                latest.add(development);
                return self.nodes.len() - 1;
            }
        }

        let absorbing = self.nodes.iter().rposition(|node| {
            timestamp - node.created_at <= self.config.max_time
                && node.similarity(&development) >= self.config.min_similarity
        });
        if let Some(index) = absorbing {
            debug!("Node {} absorbed development at {}", index, timestamp);
            self.nodes[index].add(development);
            return index;
        }

        let mut node = TimelineNode::new(timestamp);
        node.add(development);
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Per-node summaries: creation time and representative texts
    pub fn summarize(&self) -> Result<Vec<(i64, Vec<String>)>, ConfigError> {
        self.nodes
            .iter()
            .map(|node| {
                let texts = node.summarize(self.config.lambda, self.config.summary_size)?;
                Ok((node.created_at, texts))
            })
            .collect()
    }
}
