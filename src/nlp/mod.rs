//! Text processing for incoming documents
//!
//! Extracts text from tweets, tokenizes it and weighs terms so that the
//! consumer receives plain [`Vector`](crate::vsm::Vector)s.

pub mod tokenizer;
pub mod tweet;
pub mod vectorizer;
pub mod weighting;

use serde::{Deserialize, Serialize};

pub use tokenizer::{Tokenizer, TokenizerConfig};
pub use vectorizer::{DocumentVectorizer, RawDocument, Vectorizer};
pub use weighting::{IdfTable, TermWeighting, WeightingScheme};

/// Term weighting options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightingConfig {
    pub scheme: WeightingScheme,
}

/// Build a vectorizer from configuration
///
/// TF-IDF uses `corpus` to count document frequencies; TF ignores it.
pub fn build_vectorizer<'a, I>(
    tokenizer: &TokenizerConfig,
    weighting: &WeightingConfig,
    corpus: I,
) -> DocumentVectorizer
where
    I: IntoIterator<Item = &'a str>,
{
    let tokenizer = Tokenizer::new(tokenizer.clone());
    let weighting = match weighting.scheme {
        WeightingScheme::Tf => TermWeighting::Tf,
        WeightingScheme::Tfidf => {
            let table = IdfTable::from_documents(corpus.into_iter().map(|t| tokenizer.tokenize(t)));
            TermWeighting::TfIdf(table)
        }
    };
    DocumentVectorizer::new(tokenizer, weighting)
}
