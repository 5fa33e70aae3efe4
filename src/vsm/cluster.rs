//! Clusters of vectors
//!
//! A cluster owns its member vectors and keeps per-dimension sums so the
//! centroid (the per-dimension mean of the members) can be updated in O(d)
//! per insertion instead of being recomputed from every member.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::math::{self, Dimensions};
use super::vector::Vector;

/// Current export schema for clusters
pub const CLUSTER_SCHEMA_VERSION: u32 = 1;

/// Identifier assigned by the clustering engine
pub type ClusterId = u64;

/// Lifecycle of a cluster: active clusters accept members, frozen ones never do again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterState {
    Active,
    Frozen,
}

/// A group of vectors representing one topic
#[derive(Debug, Clone)]
pub struct Cluster {
    id: ClusterId,
    members: Vec<Vector>,
    sums: Dimensions,
    centroid: Dimensions,
    last_updated: i64,
    age: u64,
    touched: u64,
    state: ClusterState,
}

impl Cluster {
    /// Create an empty active cluster
    pub fn new(id: ClusterId) -> Self {
        Self {
            id,
            members: Vec::new(),
            sums: Dimensions::new(),
            centroid: Dimensions::new(),
            last_updated: 0,
            age: 0,
            touched: 0,
            state: ClusterState::Active,
        }
    }

    pub fn id(&self) -> ClusterId {
        self.id
    }

    pub fn state(&self) -> ClusterState {
        self.state
    }

    pub fn is_frozen(&self) -> bool {
        self.state == ClusterState::Frozen
    }

    pub fn size(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[Vector] {
        &self.members
    }

    /// Timestamp of the newest member
    pub fn last_updated(&self) -> i64 {
        self.last_updated
    }

    /// Inactivity counter maintained by the freeze policy
    pub fn age(&self) -> u64 {
        self.age
    }

    /// Per-dimension mean of the members
    pub fn centroid(&self) -> &Dimensions {
        &self.centroid
    }

    /// Cosine similarity between a vector and the centroid
    pub fn similarity(&self, vector: &Vector) -> f64 {
        math::cosine(&self.centroid, vector.dimensions())
    }

    /// Add a member and update the centroid incrementally
    pub(crate) fn add(&mut self, vector: Vector) {
        debug_assert!(!self.is_frozen(), "frozen clusters are immutable");
        for (dim, weight) in vector.dimensions() {
            *self.sums.entry(dim.clone()).or_insert(0.0) += weight;
        }
        self.last_updated = self.last_updated.max(vector.timestamp);
        self.members.push(vector);
        self.refresh_centroid();
    }

    /// Rebuild sums and centroid from the members
    pub fn recalculate_centroid(&mut self) {
        self.sums = math::concatenate(self.members.iter().map(Vector::dimensions));
        self.refresh_centroid();
    }

    fn refresh_centroid(&mut self) {
        let n = self.members.len() as f64;
        self.centroid = if n > 0.0 {
            self.sums.iter().map(|(d, s)| (d.clone(), s / n)).collect()
        } else {
            Dimensions::new()
        };
    }

    pub(crate) fn set_age(&mut self, age: u64) {
        self.age = age;
    }

    pub(crate) fn touched(&self) -> u64 {
        self.touched
    }

    pub(crate) fn touch(&mut self, sequence: u64) {
        self.touched = sequence;
        self.age = 0;
    }

    pub(crate) fn freeze(&mut self) {
        self.state = ClusterState::Frozen;
    }

    /// Mean similarity between the members and the centroid
    pub fn intra_similarity(&self) -> f64 {
        if self.members.is_empty() {
            return 0.0;
        }
        let total: f64 = self.members.iter().map(|v| self.similarity(v)).sum();
        total / self.members.len() as f64
    }

    /// Up to `k` members closest to the centroid, most similar first
    pub fn representative(&self, k: usize) -> Vec<&Vector> {
        let mut ranked: Vec<(&Vector, f64)> = self
            .members
            .iter()
            .map(|v| (v, self.similarity(v)))
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        ranked.into_iter().take(k).map(|(v, _)| v).collect()
    }

    /// The `n` heaviest centroid dimensions, ties broken by term
    pub fn vocabulary(&self, n: usize) -> Vec<(&str, f64)> {
        let mut terms: Vec<(&str, f64)> = self
            .centroid
            .iter()
            .map(|(d, w)| (d.as_str(), *w))
            .collect();
        terms.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });
        terms.truncate(n);
        terms
    }

    /// Export the cluster; the centroid is derived and therefore omitted
    pub fn to_record(&self) -> ClusterRecord {
        ClusterRecord {
            schema_version: CLUSTER_SCHEMA_VERSION,
            id: self.id,
            state: self.state,
            last_updated: self.last_updated,
            members: self.members.clone(),
        }
    }

    /// Rebuild a cluster from an export
    pub fn from_record(record: ClusterRecord) -> Self {
        let mut cluster = Self::new(record.id);
        cluster.members = record.members;
        cluster.last_updated = record.last_updated;
        cluster.state = record.state;
        cluster.recalculate_centroid();
        cluster
    }
}

/// Serialized form of a [`Cluster`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterRecord {
    pub schema_version: u32,
    pub id: ClusterId,
    pub state: ClusterState,
    pub last_updated: i64,
    pub members: Vec<Vector>,
}
