//! Vectors in the vector space model
//!
//! A [`Vector`] is a sparse term → weight map with a creation timestamp and a
//! free-form attribute bag. Documents are vectors whose attributes carry the
//! original text and id.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::math::{self, Dimensions};

/// Current export schema for vectors
pub const VECTOR_SCHEMA_VERSION: u32 = 1;

/// A sparse, timestamped vector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    dimensions: Dimensions,
    /// Unix timestamp (seconds) at which the vector was created
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
}

impl Vector {
    /// Create a vector, discarding zero, negative and non-finite weights
    pub fn new(dimensions: Dimensions, timestamp: i64) -> Self {
        let dimensions = dimensions
            .into_iter()
            .filter(|(_, w)| w.is_finite() && *w > 0.0)
            .collect();
        Self {
            dimensions,
            timestamp,
            attributes: Map::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_attribute(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    pub fn dimensions(&self) -> &Dimensions {
        &self.dimensions
    }

    /// Weight of a single dimension, zero when absent
    pub fn dimension(&self, name: &str) -> f64 {
        self.dimensions.get(name).copied().unwrap_or(0.0)
    }

    /// Set a dimension; non-positive values remove it
    pub fn set_dimension(&mut self, name: &str, value: f64) {
        if value.is_finite() && value > 0.0 {
            self.dimensions.insert(name.to_string(), value);
        } else {
            self.dimensions.remove(name);
        }
    }

    pub fn magnitude(&self) -> f64 {
        math::magnitude(&self.dimensions)
    }

    pub fn is_zero(&self) -> bool {
        self.magnitude() == 0.0
    }

    /// Scale to unit length; zero vectors are left as they are
    pub fn normalize(&mut self) {
        math::normalize_l2(&mut self.dimensions);
    }

    pub fn cosine(&self, other: &Vector) -> f64 {
        math::cosine(&self.dimensions, &other.dimensions)
    }

    /// Document id, when the vector carries one
    pub fn id(&self) -> Option<&str> {
        self.attributes.get("id").and_then(Value::as_str)
    }

    /// Original text, when the vector carries one
    pub fn text(&self) -> Option<&str> {
        self.attributes.get("text").and_then(Value::as_str)
    }
}
