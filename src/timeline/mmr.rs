//! Maximal Marginal Relevance summarization
//!
//! Greedily picks documents that are relevant to a query yet dissimilar to
//! the documents already picked:
//!
//! ```text
//! score(d) = λ · sim(d, q) - (1 - λ) · max_{c ∈ chosen} sim(d, c)
//! ```

use std::cmp::Ordering;

use super::development::DocumentRecord;
use crate::error::ConfigError;
use crate::vsm::{cosine, math, Dimensions};

/// Select up to `k` documents by MMR
///
/// The query defaults to the centroid of the documents. Documents with the
/// same text as one already chosen are skipped.
pub fn mmr<'a>(
    documents: &'a [DocumentRecord],
    query: Option<&Dimensions>,
    lambda: f64,
    k: usize,
) -> Result<Vec<&'a DocumentRecord>, ConfigError> {
    ConfigError::check_range("mmr.lambda", lambda, 0.0, 1.0, "in [0, 1]")?;

    let centroid;
    let query = match query {
        Some(q) => q,
        None => {
            centroid = mean(documents);
            &centroid
        }
    };

    let relevance: Vec<f64> = documents
        .iter()
        .map(|d| cosine(&d.dimensions, query))
        .collect();

    let mut chosen: Vec<usize> = Vec::new();
    let mut candidates: Vec<usize> = (0..documents.len()).collect();

    while chosen.len() < k && !candidates.is_empty() {
        let best = candidates
            .iter()
            .enumerate()
            .map(|(pos, &i)| {
                let redundancy = chosen
                    .iter()
                    .map(|&c| cosine(&documents[i].dimensions, &documents[c].dimensions))
                    .fold(0.0_f64, f64::max);
                (pos, lambda * relevance[i] - (1.0 - lambda) * redundancy)
            })
            // Earliest candidate wins ties
            .max_by(|a, b| {
                a.1.partial_cmp(&b.1)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| b.0.cmp(&a.0))
            });

        let Some((pos, _)) = best else { break };
        let index = candidates.remove(pos);
        let duplicate = chosen
            .iter()
            .any(|&c| documents[c].text == documents[index].text);
        if !duplicate {
            chosen.push(index);
        }
    }

    Ok(chosen.into_iter().map(|i| &documents[i]).collect())
}

fn mean(documents: &[DocumentRecord]) -> Dimensions {
    let mut sum = math::concatenate(documents.iter().map(|d| &d.dimensions));
    let n = documents.len().max(1) as f64;
    for weight in sum.values_mut() {
        *weight /= n;
    }
    sum
}
