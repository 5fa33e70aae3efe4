//! Volume-based burst detection (Zhao)
//!
//! Dynamic windows of increasing length are split in two halves. A term
//! bursts when its nutrition in the recent half is at least `post_rate` times
//! its nutrition in the older half. The shortest window that fires decides.
//! Window lengths are in seconds and the recent half includes the window
//! being checked.
//!
//! A term absent from a non-empty older half has an unbounded ratio. It
//! bursts once its recent volume reaches `min_volume` and is scored by that
//! volume.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::nutrition::{NutritionSeries, NutritionStore};
use super::sort_scores;
use crate::error::ConfigError;

/// Parameters of the volume-based detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZhaoConfig {
    /// Dynamic window lengths in seconds, checked in order
    ///
    /// Each half must span at least one consumer window, so windowed
    /// consumers need lengths of at least twice `window.length_secs`.
    pub windows: Vec<i64>,
    /// Minimum recent/older volume ratio
    pub post_rate: f64,
    /// Minimum recent volume, suppresses noise on rare terms
    ///
    /// Max-scaled nutrition peaks at 1 per window.
    pub min_volume: f64,
}

impl Default for ZhaoConfig {
    fn default() -> Self {
        Self {
            // Two, four, six and ten default 60s windows
            windows: vec![120, 240, 360, 600],
            post_rate: 1.7,
            min_volume: 0.5,
        }
    }
}

/// Volume-based detector
#[derive(Debug, Clone)]
pub struct Zhao {
    config: ZhaoConfig,
}

impl Zhao {
    pub fn new(config: ZhaoConfig) -> Result<Self, ConfigError> {
        if config.windows.is_empty() {
            return Err(ConfigError::Empty {
                field: "detector.windows",
            });
        }
        for window in &config.windows {
            ConfigError::check_range(
                "detector.windows",
                *window as f64,
                2.0,
                f64::INFINITY,
                "at least 2 seconds",
            )?;
        }
        ConfigError::check_positive("detector.post_rate", config.post_rate)?;
        ConfigError::check_non_negative("detector.min_volume", config.min_volume)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ZhaoConfig {
        &self.config
    }

    /// Longest dynamic window, in seconds
    pub fn max_window(&self) -> i64 {
        self.config.windows.iter().copied().max().unwrap_or(0)
    }

    /// Bursty terms at `timestamp` with their volume ratio, highest first
    pub fn detect(&self, store: &dyn NutritionStore, timestamp: i64) -> Vec<(String, f64)> {
        let mut bursty: HashMap<String, f64> = HashMap::new();

        for (older, recent) in self.halves(store, timestamp) {
            // Nothing rises without something to rise from
            if older.is_empty() {
                continue;
            }
            let older = term_volume(&older);
            let recent = term_volume(&recent);

            for (term, volume) in recent {
                if bursty.contains_key(&term)
                    || volume <= 0.0
                    || volume < self.config.min_volume
                {
                    continue;
                }
                let before = older.get(&term).copied().unwrap_or(0.0);
                if before <= 0.0 {
                    bursty.insert(term, volume);
                    continue;
                }
                let ratio = volume / before;
                if ratio >= self.config.post_rate {
                    bursty.insert(term, ratio);
                }
            }
        }

        let mut scores: Vec<(String, f64)> = bursty.into_iter().collect();
        sort_scores(&mut scores);
        scores
    }

    /// Whole-stream variant: the emerging period `(start, end)` of the first
    /// dynamic window whose total volume rose by at least `post_rate`
    pub fn detect_period(&self, store: &dyn NutritionStore, timestamp: i64) -> Option<(i64, i64)> {
        self.halves(store, timestamp)
            .into_iter()
            .find_map(|(older, recent)| {
                let before = total_volume(&older);
                if before <= 0.0 {
                    return None;
                }
                let after = total_volume(&recent);
                if after / before < self.config.post_rate {
                    return None;
                }
                let start = recent.keys().next().copied()?;
                let end = recent.keys().next_back().copied()?;
                Some((start, end))
            })
    }

    fn halves(&self, store: &dyn NutritionStore, timestamp: i64) -> Vec<(NutritionSeries, NutritionSeries)> {
        self.config
            .windows
            .iter()
            .map(|window| {
                // older: (t - window, t - half], recent: (t - half, t]
                let half = window / 2;
                let older = store.between(timestamp - window + 1, timestamp - half + 1);
                let recent = store.between(timestamp - half + 1, timestamp + 1);
                (older, recent)
            })
            .collect()
    }
}

fn term_volume(series: &NutritionSeries) -> HashMap<String, f64> {
    let mut volume = HashMap::new();
    for nutrition in series.values() {
        for (term, n) in nutrition {
            *volume.entry(term.clone()).or_insert(0.0) += n;
        }
    }
    volume
}

fn total_volume(series: &NutritionSeries) -> f64 {
    series.values().flat_map(|n| n.values()).sum()
}
