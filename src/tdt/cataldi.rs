//! Drop-based burst detection (Cataldi)
//!
//! Each term's burst compares the square of its current nutrition with the
//! squares of its historic nutrition, discounted logarithmically by distance:
//!
//! ```text
//! burst = Σ_i (n_t² - n_i²) / log10(i + 2),  i = 0 for the newest window
//! ```
//!
//! Bursts are then sorted in descending order and the "critical drop" splits
//! them: every term ranked above it is bursty.

use serde::{Deserialize, Serialize};

use super::nutrition::NutritionStore;
use super::sort_scores;
use crate::error::ConfigError;

/// Parameters of the drop-based detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CataldiConfig {
    /// Number of historic windows compared against
    pub windows: usize,
    /// Exclusive lower bound on the reported burst
    pub min_burst: f64,
}

impl Default for CataldiConfig {
    fn default() -> Self {
        Self {
            windows: 10,
            min_burst: 0.0,
        }
    }
}

/// Drop-based detector
#[derive(Debug, Clone)]
pub struct Cataldi {
    config: CataldiConfig,
}

impl Cataldi {
    pub fn new(config: CataldiConfig) -> Result<Self, ConfigError> {
        ConfigError::check_positive("detector.windows", config.windows as f64)?;
        ConfigError::check_range(
            "detector.min_burst",
            config.min_burst,
            0.0,
            f64::MAX,
            "finite and non-negative",
        )?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CataldiConfig {
        &self.config
    }

    /// Bursty terms of the window at `timestamp`, highest burst first
    ///
    /// Fewer than two historic windows yield nothing.
    pub fn detect(&self, store: &dyn NutritionStore, timestamp: i64) -> Vec<(String, f64)> {
        let history = store.recent(self.config.windows, timestamp);
        if history.len() < 2 {
            return Vec::new();
        }

        let nutrition = store.get(timestamp);
        let mut bursts: Vec<(String, f64)> = nutrition
            .iter()
            .map(|(term, n)| {
                let burst: f64 = history
                    .iter()
                    .enumerate()
                    .map(|(i, (_, window))| {
                        let old = window.get(term).copied().unwrap_or(0.0);
                        (n * n - old * old) / (i as f64 + 2.0).log10()
                    })
                    .sum();
                (term.clone(), burst)
            })
            .collect();
        sort_scores(&mut bursts);

        let drops = burst_drops(&bursts);
        let critical = critical_drop_index(&drops);
        bursts.truncate(critical);
        bursts.retain(|(_, burst)| *burst > self.config.min_burst);
        bursts
    }
}

/// Differences between consecutive bursts, sorted descending
fn burst_drops(sorted: &[(String, f64)]) -> Vec<f64> {
    sorted.windows(2).map(|w| w[0].1 - w[1].1).collect()
}

/// Number of terms that precede the critical drop
///
/// Only the drops up to the largest one are considered; the critical drop is
/// the first of those that reaches their average. On equal largest drops the
/// earliest wins. When every drop is zero, all terms are kept.
fn critical_drop_index(drops: &[f64]) -> usize {
    if drops.is_empty() {
        return 0;
    }
    if drops.iter().all(|d| *d == 0.0) {
        return drops.len() + 1;
    }

    let max = drops.iter().copied().fold(f64::MIN, f64::max);
    let peak = drops.iter().position(|d| *d == max).unwrap_or(drops.len() - 1);
    let considered = &drops[..=peak];
    let average = considered.iter().sum::<f64>() / considered.len() as f64;

    considered
        .iter()
        .position(|d| *d >= average)
        .map_or(considered.len(), |i| i + 1)
}
