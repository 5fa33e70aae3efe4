//! Topic detection and tracking
//!
//! Term nutrition is stored per time window and burst detectors decide which
//! terms are emerging at a given window. Three detectors are available:
//! - `Eld`: decay-weighted comparison against recent checkpoints
//! - `Cataldi`: squared nutrition difference with a critical-drop cut-off
//! - `Zhao`: volume ratio between the two halves of dynamic windows
//!
//! Detectors are pure functions of the store contents and their parameters.

pub mod cataldi;
pub mod eld;
pub mod nutrition;
pub mod zhao;

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

pub use cataldi::{Cataldi, CataldiConfig};
pub use eld::{Eld, EldConfig};
pub use nutrition::{MemoryNutritionStore, Nutrition, NutritionSeries, NutritionStore};
pub use zhao::{Zhao, ZhaoConfig};

use crate::error::ConfigError;

/// Detector selection as it appears in configuration files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "lowercase")]
pub enum DetectorConfig {
    Eld(EldConfig),
    Cataldi(CataldiConfig),
    Zhao(ZhaoConfig),
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self::Eld(EldConfig::default())
    }
}

impl DetectorConfig {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Eld(_) => "eld",
            Self::Cataldi(_) => "cataldi",
            Self::Zhao(_) => "zhao",
        }
    }

    /// Default configuration for a detector name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "eld" => Some(Self::Eld(EldConfig::default())),
            "cataldi" => Some(Self::Cataldi(CataldiConfig::default())),
            "zhao" => Some(Self::Zhao(ZhaoConfig::default())),
            _ => None,
        }
    }
}

/// A burst detector chosen at construction time
#[derive(Debug, Clone)]
pub enum BurstDetector {
    Eld(Eld),
    Cataldi(Cataldi),
    Zhao(Zhao),
}

impl BurstDetector {
    /// Build and validate a detector from its configuration
    pub fn from_config(config: &DetectorConfig) -> Result<Self, ConfigError> {
        Ok(match config {
            DetectorConfig::Eld(c) => Self::Eld(Eld::new(c.clone())?),
            DetectorConfig::Cataldi(c) => Self::Cataldi(Cataldi::new(c.clone())?),
            DetectorConfig::Zhao(c) => Self::Zhao(Zhao::new(c.clone())?),
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Eld(_) => "eld",
            Self::Cataldi(_) => "cataldi",
            Self::Zhao(_) => "zhao",
        }
    }

    /// Bursty terms at `timestamp` with their scores, highest first
    ///
    /// Sparse or empty stores yield an empty result, never an error.
    pub fn detect(&self, store: &dyn NutritionStore, timestamp: i64) -> Vec<(String, f64)> {
        match self {
            Self::Eld(d) => d.detect(store, timestamp),
            Self::Cataldi(d) => d.detect(store, timestamp),
            Self::Zhao(d) => d.detect(store, timestamp),
        }
    }

    /// History span in seconds this detector reads behind a checkpoint
    pub fn lookback(&self, window_secs: i64) -> i64 {
        match self {
            Self::Eld(d) => d.config().windows as i64 * window_secs,
            Self::Cataldi(d) => d.config().windows as i64 * window_secs,
            Self::Zhao(d) => d.max_window(),
        }
    }
}

/// Retention horizon for a store shared by several detectors
pub fn max_lookback<'a, I>(detectors: I, window_secs: i64) -> i64
where
    I: IntoIterator<Item = &'a BurstDetector>,
{
    detectors
        .into_iter()
        .map(|d| d.lookback(window_secs))
        .max()
        .unwrap_or(0)
}

/// Sort scores descending, ties broken by term
pub(crate) fn sort_scores(scores: &mut [(String, f64)]) {
    scores.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_validates() {
        let bad = DetectorConfig::Eld(EldConfig {
            windows: 0,
            ..EldConfig::default()
        });
        assert!(BurstDetector::from_config(&bad).is_err());

        let good = BurstDetector::from_config(&DetectorConfig::default()).unwrap();
        assert_eq!(good.name(), "eld");
    }

    #[test]
    fn test_from_name() {
        assert_eq!(DetectorConfig::from_name("Zhao").unwrap().name(), "zhao");
        assert!(DetectorConfig::from_name("kmeans").is_none());
    }

    #[test]
    fn test_lookback() {
        let eld = BurstDetector::from_config(&DetectorConfig::default()).unwrap();
        assert_eq!(eld.lookback(60), 7 * 60);

        let zhao = BurstDetector::from_config(&DetectorConfig::Zhao(ZhaoConfig::default())).unwrap();
        assert_eq!(zhao.lookback(60), 600);

        let cataldi =
            BurstDetector::from_config(&DetectorConfig::Cataldi(CataldiConfig::default())).unwrap();
        assert_eq!(max_lookback([&eld, &zhao, &cataldi], 60), 600);
        assert_eq!(max_lookback(std::iter::empty(), 60), 0);
    }

    #[test]
    fn test_empty_store_never_bursts() {
        let store = MemoryNutritionStore::new();
        for config in [
            DetectorConfig::default(),
            DetectorConfig::Cataldi(CataldiConfig::default()),
            DetectorConfig::Zhao(ZhaoConfig::default()),
        ] {
            let detector = BurstDetector::from_config(&config).unwrap();
            assert!(detector.detect(&store, 0).is_empty());
        }
    }

    #[test]
    fn test_config_toml_shape() {
        let config: DetectorConfig = toml::from_str("algorithm = \"cataldi\"\nwindows = 4\n").unwrap();
        match config {
            DetectorConfig::Cataldi(c) => {
                assert_eq!(c.windows, 4);
                assert_eq!(c.min_burst, 0.0);
            }
            other => panic!("unexpected detector {:?}", other),
        }
    }

    #[test]
    fn test_sort_scores_ties_by_term() {
        let mut scores = vec![("b".to_string(), 1.0), ("a".to_string(), 1.0), ("c".to_string(), 2.0)];
        sort_scores(&mut scores);
        let order: Vec<&str> = scores.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
    }
}
