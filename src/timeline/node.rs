//! Timeline nodes

use serde::{Deserialize, Serialize};

use super::development::{Development, DocumentRecord};
use super::mmr::mmr;
use crate::error::ConfigError;
use crate::vsm::{cosine, math, Dimensions};

/// A period of the timeline holding the developments that happened in it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineNode {
    pub created_at: i64,
    pub developments: Vec<Development>,
}

impl TimelineNode {
    pub fn new(created_at: i64) -> Self {
        Self {
            created_at,
            developments: Vec::new(),
        }
    }

    pub fn add(&mut self, development: Development) {
        self.developments.push(development);
    }

    /// Whether the node stopped accepting developments at `timestamp`
    pub fn expired(&self, expiry: i64, timestamp: i64) -> bool {
        timestamp - self.created_at >= expiry
    }

    /// Combined bursty terms of every development
    pub fn topic(&self) -> Dimensions {
        let topics: Vec<Dimensions> = self.developments.iter().map(Development::topic).collect();
        math::concatenate(&topics)
    }

    /// Cosine similarity between the node's topic and a development's
    pub fn similarity(&self, development: &Development) -> f64 {
        cosine(&self.topic(), &development.topic())
    }

    /// Distinct documents of the node, in arrival order
    pub fn documents(&self) -> Vec<DocumentRecord> {
        let mut seen = std::collections::HashSet::new();
        self.developments
            .iter()
            .flat_map(|d| d.documents.iter())
            .filter(|d| seen.insert(d.id.clone()))
            .cloned()
            .collect()
    }

    /// Up to `k` representative texts chosen by MMR against the node's topic
    pub fn summarize(&self, lambda: f64, k: usize) -> Result<Vec<String>, ConfigError> {
        let documents = self.documents();
        let topic = self.topic();
        Ok(mmr(&documents, Some(&topic), lambda, k)?
            .into_iter()
            .map(|d| d.text.clone())
            .collect())
    }
}
