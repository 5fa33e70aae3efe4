//! Developments emitted by the consumer

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::vsm::{ClusterId, Dimensions, Vector};

/// Current export schema for developments
pub const DEVELOPMENT_SCHEMA_VERSION: u32 = 1;

/// A bursty term and its burst score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurstTerm {
    pub term: String,
    pub score: f64,
}

/// A document supporting a development
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub text: String,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
    /// Term weights, kept in memory for summarization only
    #[serde(skip)]
    pub dimensions: Dimensions,
}

impl From<&Vector> for DocumentRecord {
    fn from(vector: &Vector) -> Self {
        let attributes = vector
            .attributes
            .iter()
            .filter(|(k, _)| k.as_str() != "id" && k.as_str() != "text")
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self {
            id: vector.id().unwrap_or_default().to_string(),
            text: vector.text().unwrap_or_default().to_string(),
            timestamp: vector.timestamp,
            attributes,
            dimensions: vector.dimensions().clone(),
        }
    }
}

/// One detected topical event: bursty terms plus the documents behind them
///
/// Immutable once emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Development {
    pub schema_version: u32,
    pub timestamp: i64,
    pub terms: Vec<BurstTerm>,
    pub documents: Vec<DocumentRecord>,
    #[serde(default)]
    pub clusters: Vec<ClusterId>,
}

impl Development {
    pub fn new(
        timestamp: i64,
        terms: Vec<(String, f64)>,
        documents: Vec<DocumentRecord>,
        clusters: Vec<ClusterId>,
    ) -> Self {
        Self {
            schema_version: DEVELOPMENT_SCHEMA_VERSION,
            timestamp,
            terms: terms
                .into_iter()
                .map(|(term, score)| BurstTerm { term, score })
                .collect(),
            documents,
            clusters,
        }
    }

    pub fn term_names(&self) -> Vec<&str> {
        self.terms.iter().map(|t| t.term.as_str()).collect()
    }

    /// Bursty terms as a dimension map, weighted by positive burst
    ///
    /// Terms with a non-positive score still count with weight 1.
    pub fn topic(&self) -> Dimensions {
        self.terms
            .iter()
            .map(|t| {
                let weight = if t.score > 0.0 { t.score } else { 1.0 };
                (t.term.clone(), weight)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_record_from_vector() {
        let vector = Vector::new([("goal".to_string(), 1.0)].into_iter().collect(), 30)
            .with_attribute("id", "7")
            .with_attribute("text", "Goal!")
            .with_attribute("user", "fan");
        let record = DocumentRecord::from(&vector);
        assert_eq!(record.id, "7");
        assert_eq!(record.text, "Goal!");
        assert_eq!(record.timestamp, 30);
        assert_eq!(record.attributes.len(), 1);
        assert_eq!(record.dimensions["goal"], 1.0);
    }

    #[test]
    fn test_json_shape() {
        let dev = Development::new(
            120,
            vec![("goal".to_string(), 0.8)],
            vec![DocumentRecord {
                id: "1".to_string(),
                text: "Goal!".to_string(),
                timestamp: 100,
                attributes: Map::new(),
                dimensions: Dimensions::new(),
            }],
            vec![3],
        );

        let json = serde_json::to_value(&dev).unwrap();
        assert_eq!(json["schema_version"], DEVELOPMENT_SCHEMA_VERSION);
        assert_eq!(json["timestamp"], 120);
        assert_eq!(json["terms"][0]["term"], "goal");
        assert_eq!(json["documents"][0]["id"], "1");
        assert!(json["documents"][0].get("dimensions").is_none());
        assert_eq!(json["clusters"][0], 3);

        let back: Development = serde_json::from_value(json).unwrap();
        assert_eq!(back, dev);
    }

    #[test]
    fn test_topic_weights() {
        let dev = Development::new(
            0,
            vec![("goal".to_string(), 0.5), ("card".to_string(), -0.2)],
            vec![],
            vec![],
        );
        let topic = dev.topic();
        assert_eq!(topic["goal"], 0.5);
        assert_eq!(topic["card"], 1.0);
        assert_eq!(dev.term_names(), vec!["goal", "card"]);
    }
}
