//! Term weighting schemes
//!
//! Turns a token list into sparse dimensions. TF-IDF needs document
//! frequencies, which are gathered up front from a corpus.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::vsm::Dimensions;

/// Weighting scheme as it appears in configuration files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightingScheme {
    #[default]
    Tf,
    Tfidf,
}

/// Inverse document frequencies of a corpus
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdfTable {
    idf: HashMap<String, f64>,
    documents: usize,
}

impl IdfTable {
    /// Count document frequencies over tokenized documents
    pub fn from_documents<I>(documents: I) -> Self
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        let mut n_docs = 0;

        for tokens in documents {
            n_docs += 1;
            let unique: HashSet<String> = tokens.into_iter().collect();
            for token in unique {
                *doc_freq.entry(token).or_insert(0) += 1;
            }
        }

        let idf = doc_freq
            .into_iter()
            .map(|(token, freq)| {
                // IDF = log(N / df)
                let idf = (n_docs as f64 / freq as f64).ln();
                (token, idf.max(0.1))
            })
            .collect();

        Self {
            idf,
            documents: n_docs,
        }
    }

    pub fn documents(&self) -> usize {
        self.documents
    }

    /// IDF of a term; unseen terms count as appearing in one document
    pub fn idf(&self, term: &str) -> f64 {
        match self.idf.get(term) {
            Some(idf) => *idf,
            None if self.documents > 1 => (self.documents as f64).ln(),
            None => 1.0,
        }
    }
}

/// How token counts become weights
#[derive(Debug, Clone, Default)]
pub enum TermWeighting {
    /// Raw term frequency
    #[default]
    Tf,
    /// Term frequency scaled by inverse document frequency
    TfIdf(IdfTable),
}

impl TermWeighting {
    pub fn weigh(&self, tokens: &[String]) -> Dimensions {
        let mut tf = Dimensions::new();
        for token in tokens {
            *tf.entry(token.clone()).or_insert(0.0) += 1.0;
        }

        if let Self::TfIdf(table) = self {
            for (term, weight) in tf.iter_mut() {
                *weight *= table.idf(term);
            }
        }
        tf
    }
}
