//! Resolving bursty terms to clusters
//!
//! A cluster supports a burst when its vocabulary (the heaviest centroid
//! terms) overlaps the bursty terms according to the configured predicate.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::timeline::DocumentRecord;
use crate::vsm::{Cluster, ClusterId};

/// How much vocabulary overlap a cluster needs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinKind {
    /// At least one shared term
    #[default]
    AnyOverlap,
    /// Shared terms over the smaller of vocabulary and burst set must reach `min_overlap`
    MinOverlap,
}

/// Join predicate between bursty terms and clusters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JoinConfig {
    pub kind: JoinKind,
    /// Fraction used by `min_overlap`
    pub min_overlap: f64,
    /// Number of centroid terms forming a cluster's vocabulary
    pub vocabulary_size: usize,
    /// Smaller clusters are ignored
    pub min_cluster_size: usize,
    /// Cap on documents attached to one development
    pub max_documents: usize,
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self {
            kind: JoinKind::AnyOverlap,
            min_overlap: 0.5,
            vocabulary_size: 10,
            min_cluster_size: 1,
            max_documents: 50,
        }
    }
}

impl JoinConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_range("join.min_overlap", self.min_overlap, 0.0, 1.0, "in [0, 1]")?;
        ConfigError::check_positive("join.vocabulary_size", self.vocabulary_size as f64)?;
        ConfigError::check_positive("join.max_documents", self.max_documents as f64)?;
        Ok(())
    }

    /// Whether a cluster supports the bursty terms
    pub fn matches(&self, cluster: &Cluster, bursty: &HashSet<&str>) -> bool {
        if cluster.size() < self.min_cluster_size || bursty.is_empty() {
            return false;
        }

        let vocabulary = cluster.vocabulary(self.vocabulary_size);
        if vocabulary.is_empty() {
            return false;
        }
        let shared = vocabulary
            .iter()
            .filter(|(term, _)| bursty.contains(term))
            .count();

        match self.kind {
            JoinKind::AnyOverlap => shared > 0,
            JoinKind::MinOverlap => {
                let base = vocabulary.len().min(bursty.len()) as f64;
                shared > 0 && shared as f64 / base >= self.min_overlap
            }
        }
    }
}

/// Clusters supporting a burst and their documents, most central first
///
/// Once `max_documents` is reached no further clusters are named, so every
/// returned cluster contributed at least one document.
pub fn resolve<'a, I>(
    clusters: I,
    bursty: &[(String, f64)],
    config: &JoinConfig,
) -> (Vec<ClusterId>, Vec<DocumentRecord>)
where
    I: IntoIterator<Item = &'a Cluster>,
{
    let terms: HashSet<&str> = bursty.iter().map(|(t, _)| t.as_str()).collect();

    let mut ids = Vec::new();
    let mut documents = Vec::new();
    for cluster in clusters {
        let room = config.max_documents.saturating_sub(documents.len());
        if room == 0 {
            break;
        }
        if !config.matches(cluster, &terms) {
            continue;
        }
        ids.push(cluster.id());
        documents.extend(
            cluster
                .representative(room)
                .into_iter()
                .map(DocumentRecord::from),
        );
    }
    (ids, documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vsm::{ClusteringConfig, ClusteringEngine, Vector};

    fn vector(pairs: &[(&str, f64)], id: &str) -> Vector {
        Vector::new(pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect(), 0)
            .with_attribute("id", id)
            .with_attribute("text", id)
    }

    fn engine_with(vectors: Vec<Vector>) -> ClusteringEngine {
        let mut engine = ClusteringEngine::new(ClusteringConfig {
            threshold: 0.5,
            ..ClusteringConfig::default()
        })
        .unwrap();
        engine.cluster_batch(vectors);
        engine
    }

    fn bursts(terms: &[&str]) -> Vec<(String, f64)> {
        terms.iter().map(|t| (t.to_string(), 1.0)).collect()
    }

    #[test]
    fn test_any_overlap() {
        let engine = engine_with(vec![
            vector(&[("goal", 1.0), ("france", 0.5)], "1"),
            vector(&[("rain", 1.0)], "2"),
        ]);
        let (ids, docs) = resolve(engine.active(), &bursts(&["goal"]), &JoinConfig::default());
        assert_eq!(ids.len(), 1);
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "1");
    }

    #[test]
    fn test_min_overlap() {
        let engine = engine_with(vec![vector(&[("goal", 1.0), ("france", 0.5)], "1")]);
        let strict = JoinConfig {
            kind: JoinKind::MinOverlap,
            min_overlap: 0.75,
            ..JoinConfig::default()
        };
        // One of two vocabulary terms is bursty
        let (ids, _) = resolve(engine.active(), &bursts(&["goal", "card", "rain"]), &strict);
        assert!(ids.is_empty());

        let (ids, _) = resolve(engine.active(), &bursts(&["goal", "france"]), &strict);
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn test_min_cluster_size_and_document_cap() {
        let engine = engine_with(vec![
            vector(&[("goal", 1.0)], "1"),
            vector(&[("goal", 1.0)], "2"),
            vector(&[("goal", 1.0)], "3"),
        ]);
        let config = JoinConfig {
            min_cluster_size: 4,
            ..JoinConfig::default()
        };
        assert!(resolve(engine.active(), &bursts(&["goal"]), &config).0.is_empty());

        let capped = JoinConfig {
            max_documents: 2,
            ..JoinConfig::default()
        };
        let (_, docs) = resolve(engine.active(), &bursts(&["goal"]), &capped);
        assert_eq!(docs.len(), 2);
    }

    #[test]
    fn test_full_document_cap_names_no_more_clusters() {
        let engine = engine_with(vec![
            vector(&[("goal", 1.0)], "1"),
            vector(&[("goal", 0.2), ("card", 1.0), ("red", 1.0)], "2"),
        ]);
        assert_eq!(engine.active_count(), 2);

        let capped = JoinConfig {
            max_documents: 1,
            ..JoinConfig::default()
        };
        let (ids, docs) = resolve(engine.active(), &bursts(&["goal"]), &capped);
        assert_eq!(ids.len(), 1);
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "1");
    }

    #[test]
    fn test_no_bursts_no_match() {
        let engine = engine_with(vec![vector(&[("goal", 1.0)], "1")]);
        let (ids, docs) = resolve(engine.active(), &[], &JoinConfig::default());
        assert!(ids.is_empty());
        assert!(docs.is_empty());
    }
}
