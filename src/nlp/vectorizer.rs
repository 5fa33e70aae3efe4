//! Raw documents to vectors

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::tokenizer::Tokenizer;
use super::weighting::TermWeighting;
use crate::error::PipelineError;
use crate::vsm::Vector;

/// A document before tokenization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    pub id: String,
    pub text: String,
    /// Unix timestamp in seconds
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
}

impl RawDocument {
    pub fn new(id: impl Into<String>, text: impl Into<String>, timestamp: i64) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            timestamp,
            attributes: Map::new(),
        }
    }
}

/// Converts raw documents into vectors
///
/// A failure only concerns the one document; the consumer logs and skips it.
pub trait Vectorizer: Send + Sync {
    fn vectorize(&self, raw: &RawDocument) -> Result<Vector, PipelineError>;
}

/// Tokenizer, term weighting and L2 normalization
#[derive(Debug, Clone, Default)]
pub struct DocumentVectorizer {
    tokenizer: Tokenizer,
    weighting: TermWeighting,
}

impl DocumentVectorizer {
    pub fn new(tokenizer: Tokenizer, weighting: TermWeighting) -> Self {
        Self {
            tokenizer,
            weighting,
        }
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }
}

impl Vectorizer for DocumentVectorizer {
    fn vectorize(&self, raw: &RawDocument) -> Result<Vector, PipelineError> {
        let tokens = self.tokenizer.tokenize(&raw.text);
        if tokens.is_empty() {
            return Err(PipelineError::Vectorize {
                id: raw.id.clone(),
                reason: "no terms left after tokenization".to_string(),
            });
        }

        let mut vector = Vector::new(self.weighting.weigh(&tokens), raw.timestamp)
            .with_attribute("id", raw.id.as_str())
            .with_attribute("text", raw.text.as_str());
        for (key, value) in &raw.attributes {
            vector.attributes.insert(key.clone(), value.clone());
        }
        vector.normalize();
        Ok(vector)
    }
}
