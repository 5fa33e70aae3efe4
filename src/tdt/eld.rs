//! Decay-weighted burst detection (ELD)
//!
//! The burst of a term compares its local nutrition against each of the
//! previous `windows` checkpoints. Recent checkpoints weigh more:
//!
//! ```text
//! burst = Σ_c (n_local - n_c) · decay(c) / Σ_c decay(c)
//! decay(c) = 1 / (e^c)^decay_rate,  c = 1 for the newest checkpoint
//! ```
//!
//! With nutrition scaled to [0, 1] the burst lies in [-1, 1]: negative for
//! fading terms, positive for emerging ones.

use serde::{Deserialize, Serialize};

use super::nutrition::{Nutrition, NutritionStore};
use super::sort_scores;
use crate::error::ConfigError;

/// Parameters of the decay-weighted detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EldConfig {
    /// Number of historic checkpoints compared against
    pub windows: usize,
    pub decay_rate: f64,
    /// Exclusive lower bound on the reported burst
    pub min_burst: f64,
    /// Terms whose local nutrition is below this are ignored
    pub min_nutrition: f64,
}

impl Default for EldConfig {
    fn default() -> Self {
        Self {
            windows: 7,
            decay_rate: 0.5,
            min_burst: 0.0,
            min_nutrition: 0.0,
        }
    }
}

/// Decay-weighted detector
#[derive(Debug, Clone)]
pub struct Eld {
    config: EldConfig,
}

impl Eld {
    pub fn new(config: EldConfig) -> Result<Self, ConfigError> {
        ConfigError::check_positive("detector.windows", config.windows as f64)?;
        ConfigError::check_positive("detector.decay_rate", config.decay_rate)?;
        ConfigError::check_non_negative("detector.min_nutrition", config.min_nutrition)?;
        ConfigError::check_range(
            "detector.min_burst",
            config.min_burst,
            0.0,
            f64::MAX,
            "finite and non-negative",
        )?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EldConfig {
        &self.config
    }

    /// Bursty terms of the window at `timestamp`, highest burst first
    pub fn detect(&self, store: &dyn NutritionStore, timestamp: i64) -> Vec<(String, f64)> {
        let local = store.get(timestamp);
        self.score_local(&local, store, None, timestamp)
            .into_iter()
            .filter(|(_, burst)| *burst > self.config.min_burst)
            .collect()
    }

    /// Burst of every term in an arbitrary local nutrition map
    ///
    /// History is taken from the checkpoints in `[since, until)`, newest
    /// first, capped at `windows`. No history means no scores.
    pub fn score_local(
        &self,
        local: &Nutrition,
        store: &dyn NutritionStore,
        since: Option<i64>,
        until: i64,
    ) -> Vec<(String, f64)> {
        let history: Vec<Nutrition> = store
            .recent(self.config.windows, until)
            .into_iter()
            .filter(|(ts, _)| since.map_or(true, |s| *ts >= s))
            .map(|(_, n)| n)
            .collect();
        if history.is_empty() {
            return Vec::new();
        }

        let decays: Vec<f64> = (1..=history.len()).map(|c| self.decay(c)).collect();
        let coefficient: f64 = decays.iter().sum();

        let mut scores: Vec<(String, f64)> = local
            .iter()
            .filter(|(_, n)| **n >= self.config.min_nutrition)
            .map(|(term, n)| {
                let weighted: f64 = history
                    .iter()
                    .zip(&decays)
                    .map(|(window, decay)| (n - window.get(term).copied().unwrap_or(0.0)) * decay)
                    .sum();
                (term.clone(), weighted / coefficient)
            })
            .collect();
        sort_scores(&mut scores);
        scores
    }

    fn decay(&self, c: usize) -> f64 {
        1.0 / (c as f64).exp().powf(self.config.decay_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tdt::nutrition::MemoryNutritionStore;

    fn series(values: &[f64]) -> MemoryNutritionStore {
        let mut store = MemoryNutritionStore::new();
        for (i, v) in values.iter().enumerate() {
            store.add(i as i64 * 60, [("x".to_string(), *v)].into_iter().collect());
        }
        store
    }

    fn score(store: &MemoryNutritionStore, timestamp: i64) -> f64 {
        let eld = Eld::new(EldConfig::default()).unwrap();
        let local = store.get(timestamp);
        eld.score_local(&local, store, None, timestamp)[0].1
    }

    #[test]
    fn test_fading_term_is_negative() {
        // Seven historic windows followed by the local one
        let store = series(&[10.0, 10.0, 10.0, 10.0, 2.0, 2.0, 2.0, 2.0]);
        assert_eq!(store.recent(7, 7 * 60).len(), 7);
        assert!(score(&store, 7 * 60) < -1.0);
    }

    #[test]
    fn test_emerging_term_is_positive() {
        let store = series(&[2.0, 2.0, 2.0, 2.0, 10.0, 10.0, 10.0, 10.0]);
        assert_eq!(store.recent(7, 7 * 60).len(), 7);
        let burst = score(&store, 7 * 60);
        assert!(burst > 1.0);

        let eld = Eld::new(EldConfig::default()).unwrap();
        let detected = eld.detect(&store, 7 * 60);
        assert_eq!(detected.len(), 1);
        assert_eq!(detected[0].0, "x");
    }

    #[test]
    fn test_fading_term_never_reported() {
        let store = series(&[1.0, 0.8]);
        let eld = Eld::new(EldConfig::default()).unwrap();
        assert!(eld.detect(&store, 60).is_empty());
    }

    #[test]
    fn test_bounded_for_unit_nutrition() {
        let store = series(&[0.0, 0.0, 0.0, 1.0]);
        let burst = score(&store, 3 * 60);
        assert!((burst - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_history_no_burst() {
        let store = series(&[5.0]);
        let eld = Eld::new(EldConfig::default()).unwrap();
        assert!(eld.detect(&store, 0).is_empty());
        assert!(eld.detect(&MemoryNutritionStore::new(), 0).is_empty());
    }

    #[test]
    fn test_min_burst_is_exclusive() {
        let store = series(&[1.0, 1.0]);
        let eld = Eld::new(EldConfig::default()).unwrap();
        // Unchanged nutrition gives a burst of exactly zero
        assert!(eld.detect(&store, 60).is_empty());
    }

    #[test]
    fn test_detect_is_deterministic() {
        let mut store = series(&[1.0, 3.0, 2.0, 8.0]);
        store.add(180, [("y".to_string(), 4.0)].into_iter().collect());
        let eld = Eld::new(EldConfig::default()).unwrap();
        assert_eq!(eld.detect(&store, 180), eld.detect(&store, 180));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let zero_windows = EldConfig {
            windows: 0,
            ..EldConfig::default()
        };
        assert!(Eld::new(zero_windows).is_err());

        let negative_decay = EldConfig {
            decay_rate: -0.5,
            ..EldConfig::default()
        };
        assert!(Eld::new(negative_decay).is_err());

        let negative_burst = EldConfig {
            min_burst: -0.5,
            ..EldConfig::default()
        };
        assert!(matches!(
            Eld::new(negative_burst),
            Err(ConfigError::OutOfRange { field: "detector.min_burst", .. })
        ));

        let infinite_burst = EldConfig {
            min_burst: f64::INFINITY,
            ..EldConfig::default()
        };
        assert!(Eld::new(infinite_burst).is_err());
    }
}
