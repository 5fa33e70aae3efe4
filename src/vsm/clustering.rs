//! Incremental No-K-Means clustering
//!
//! Each incoming vector joins the active cluster whose centroid is most
//! similar to it, provided the similarity reaches the threshold; otherwise it
//! seeds a new cluster. The number of clusters is never fixed in advance.
//!
//! Clusters that stop receiving vectors are frozen. The freeze policy decides
//! how inactivity is measured:
//! - `Ticks`: one tick per `cluster()` call
//! - `Temporal`: seconds between the incoming vector and the cluster's newest
//!   member, with an optional recency penalty on similarity

use std::cmp::Ordering;
use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::cluster::{Cluster, ClusterId};
use super::vector::Vector;
use crate::error::ConfigError;

/// How cluster inactivity is measured
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FreezePolicy {
    /// Freeze after `period` consecutive `cluster()` calls without a new member
    Ticks { period: u64 },
    /// Freeze once the newest member is more than `period_secs` older than the
    /// incoming vector. Similarity is multiplied by
    /// `exp(-recency_decay * age / period_secs)`.
    Temporal {
        period_secs: i64,
        #[serde(default)]
        recency_decay: f64,
    },
}

impl Default for FreezePolicy {
    fn default() -> Self {
        Self::Ticks { period: 20 }
    }
}

/// Configuration for the clustering engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Minimum cosine similarity for a vector to join a cluster
    pub threshold: f64,
    pub freeze: FreezePolicy,
    /// Keep frozen clusters in an archive instead of discarding them
    pub store_frozen: bool,
    /// Upper bound on the archive; the oldest frozen clusters go first
    pub max_frozen: Option<usize>,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            freeze: FreezePolicy::default(),
            store_frozen: false,
            max_frozen: None,
        }
    }
}

impl ClusteringConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_range("clustering.threshold", self.threshold, 0.0, 1.0, "in [0, 1]")?;
        match self.freeze {
            FreezePolicy::Ticks { period } => {
                ConfigError::check_positive("clustering.freeze.period", period as f64)?;
            }
            FreezePolicy::Temporal {
                period_secs,
                recency_decay,
            } => {
                ConfigError::check_positive("clustering.freeze.period_secs", period_secs as f64)?;
                ConfigError::check_non_negative("clustering.freeze.recency_decay", recency_decay)?;
            }
        }
        if self.max_frozen == Some(0) {
            return Err(ConfigError::NonPositive {
                field: "clustering.max_frozen",
                value: 0.0,
            });
        }
        Ok(())
    }
}

/// Online clustering engine owning every active and archived cluster
#[derive(Debug)]
pub struct ClusteringEngine {
    config: ClusteringConfig,
    active: Vec<Cluster>,
    archive: VecDeque<Cluster>,
    next_id: ClusterId,
    sequence: u64,
    frozen_total: usize,
}

impl ClusteringEngine {
    /// Create an engine, rejecting invalid parameters
    pub fn new(config: ClusteringConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            active: Vec::new(),
            archive: VecDeque::new(),
            next_id: 1,
            sequence: 0,
            frozen_total: 0,
        })
    }

    pub fn config(&self) -> &ClusteringConfig {
        &self.config
    }

    /// Assign a vector to a cluster and return the cluster's id
    ///
    /// Inactive clusters are aged and frozen before the comparison, so a
    /// vector can never join a cluster that has just gone stale.
    pub fn cluster(&mut self, vector: Vector) -> ClusterId {
        self.sequence += 1;
        self.age_and_freeze(vector.timestamp);

        let best = if vector.is_zero() {
            None
        } else {
            self.best_match(&vector)
        };

        match best {
            Some((index, similarity)) if similarity >= self.config.threshold => {
                let sequence = self.sequence;
                let cluster = &mut self.active[index];
                cluster.add(vector);
                cluster.touch(sequence);
                cluster.id()
            }
            _ => {
                let mut cluster = Cluster::new(self.next_id);
                self.next_id += 1;
                cluster.add(vector);
                cluster.touch(self.sequence);
                let id = cluster.id();
                debug!("Created cluster {} ({} active)", id, self.active.len() + 1);
                self.active.push(cluster);
                id
            }
        }
    }

    /// Cluster several vectors in timestamp order
    ///
    /// Returns the distinct ids of the clusters that received a vector.
    pub fn cluster_batch(&mut self, mut vectors: Vec<Vector>) -> Vec<ClusterId> {
        vectors.sort_by_key(|v| v.timestamp);
        let ids: BTreeSet<ClusterId> = vectors.into_iter().map(|v| self.cluster(v)).collect();
        ids.into_iter().collect()
    }

    /// Index and effective similarity of the best active cluster
    ///
    /// Ties go to the cluster updated most recently.
    fn best_match(&self, vector: &Vector) -> Option<(usize, f64)> {
        self.active
            .iter()
            .enumerate()
            .map(|(i, c)| (i, self.effective_similarity(c, vector), c.touched()))
            .max_by(|a, b| {
                a.1.partial_cmp(&b.1)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| a.2.cmp(&b.2))
            })
            .map(|(i, sim, _)| (i, sim))
    }

    fn effective_similarity(&self, cluster: &Cluster, vector: &Vector) -> f64 {
        let similarity = cluster.similarity(vector);
        match self.config.freeze {
            FreezePolicy::Temporal {
                period_secs,
                recency_decay,
            } if recency_decay > 0.0 => {
                let age = cluster.age() as f64;
                similarity * (-recency_decay * age / period_secs as f64).exp()
            }
            _ => similarity,
        }
    }

    fn age_and_freeze(&mut self, now: i64) {
        let limit = match self.config.freeze {
            FreezePolicy::Ticks { period } => {
                for cluster in &mut self.active {
                    cluster.set_age(cluster.age() + 1);
                }
                period
            }
            FreezePolicy::Temporal { period_secs, .. } => {
                for cluster in &mut self.active {
                    let age = now.saturating_sub(cluster.last_updated()).max(0);
                    cluster.set_age(age as u64);
                }
                period_secs as u64
            }
        };

        let (stale, live): (Vec<Cluster>, Vec<Cluster>) = std::mem::take(&mut self.active)
            .into_iter()
            .partition(|c| c.age() > limit);
        self.active = live;

        for mut cluster in stale {
            cluster.freeze();
            self.frozen_total += 1;
            debug!(
                "Froze cluster {} with {} members (age {})",
                cluster.id(),
                cluster.size(),
                cluster.age()
            );
            if self.config.store_frozen {
                self.archive.push_back(cluster);
            }
        }

        if let Some(max) = self.config.max_frozen {
            while self.archive.len() > max {
                self.archive.pop_front();
            }
        }
    }

    /// Number of clusters still accepting vectors
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Number of clusters frozen so far, archived or not
    pub fn frozen_count(&self) -> usize {
        self.frozen_total
    }

    pub fn active(&self) -> &[Cluster] {
        &self.active
    }

    /// Archived frozen clusters, oldest first
    pub fn frozen(&self) -> impl Iterator<Item = &Cluster> {
        self.archive.iter()
    }

    /// Look up a cluster by id among active and archived clusters
    pub fn get(&self, id: ClusterId) -> Option<&Cluster> {
        self.active
            .iter()
            .find(|c| c.id() == id)
            .or_else(|| self.archive.iter().find(|c| c.id() == id))
    }
}
