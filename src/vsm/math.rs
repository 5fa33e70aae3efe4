//! Sparse vector math
//!
//! Dimensions are term names mapped to non-negative weights. Every function
//! treats a missing dimension as weight zero.

use std::collections::HashMap;

use crate::error::ConfigError;

/// Sparse dimension map used by vectors and centroids
pub type Dimensions = HashMap<String, f64>;

const EPSILON: f64 = 1e-12;

/// L2 magnitude of a dimension map
pub fn magnitude(dimensions: &Dimensions) -> f64 {
    dimensions.values().map(|w| w * w).sum::<f64>().sqrt()
}

/// Scale a dimension map to unit length in place
///
/// Zero-magnitude maps are left untouched.
pub fn normalize_l2(dimensions: &mut Dimensions) {
    let norm = magnitude(dimensions);
    if norm > EPSILON {
        for weight in dimensions.values_mut() {
            *weight /= norm;
        }
    }
}

/// Cosine similarity between two dimension maps
///
/// Returns 0.0 when either side has zero magnitude, so callers never divide
/// by zero. With non-negative weights the result lies in [0, 1].
pub fn cosine(a: &Dimensions, b: &Dimensions) -> f64 {
    let norm_a = magnitude(a);
    let norm_b = magnitude(b);
    if norm_a < EPSILON || norm_b < EPSILON {
        return 0.0;
    }

    // Iterate the smaller map
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f64 = small
        .iter()
        .filter_map(|(dim, w)| large.get(dim).map(|other| w * other))
        .sum();

    (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
}

/// Sum several dimension maps into one
pub fn concatenate<'a, I>(maps: I) -> Dimensions
where
    I: IntoIterator<Item = &'a Dimensions>,
{
    let mut out = Dimensions::new();
    for map in maps {
        for (dim, weight) in map {
            *out.entry(dim.clone()).or_insert(0.0) += weight;
        }
    }
    out
}

/// Rescale a dimension map so that its largest weight becomes 1.0
pub fn max_normalize(dimensions: &mut Dimensions) {
    let max = dimensions.values().copied().fold(0.0_f64, f64::max);
    if max > EPSILON {
        for weight in dimensions.values_mut() {
            *weight /= max;
        }
    }
}

/// Augmented normalization: `a + (1 - a) * w / max(w)`
pub fn augmented_normalize(dimensions: &Dimensions, a: f64) -> Result<Dimensions, ConfigError> {
    ConfigError::check_range("augmentation", a, 0.0, 1.0, "in [0, 1]")?;

    let max = dimensions.values().copied().fold(0.0_f64, f64::max);
    let max = if max > EPSILON { max } else { 1.0 };
    Ok(dimensions
        .iter()
        .map(|(dim, w)| (dim.clone(), a + (1.0 - a) * w / max))
        .collect())
}
