//! Nutrition storage
//!
//! Nutrition is the per-window activity signal of each term. A store maps a
//! window timestamp to the nutrition of every term seen in that window.
//! Every query is total: missing timestamps and empty or inverted ranges
//! simply yield empty results.

use std::collections::{BTreeMap, HashMap};

/// Term → nutrition for one window
pub type Nutrition = HashMap<String, f64>;

/// Window timestamp → nutrition, ordered by time
pub type NutritionSeries = BTreeMap<i64, Nutrition>;

/// Time series of term nutrition
pub trait NutritionStore: Send + Sync {
    /// Merge `nutrition` into the window at `timestamp`, overwriting terms already present
    fn add(&mut self, timestamp: i64, nutrition: Nutrition);

    /// Nutrition of one window, empty when absent
    fn get(&self, timestamp: i64) -> Nutrition;

    fn all(&self) -> NutritionSeries;

    /// Windows with `start <= timestamp < end`
    fn between(&self, start: i64, end: i64) -> NutritionSeries;

    /// Windows with `timestamp >= start`
    fn since(&self, start: i64) -> NutritionSeries;

    /// Windows with `timestamp < end`
    fn until(&self, end: i64) -> NutritionSeries;

    fn remove(&mut self, timestamps: &[i64]);

    /// Up to `n` windows strictly before `before`, newest first
    fn recent(&self, n: usize, before: i64) -> Vec<(i64, Nutrition)>;

    /// Evict every window older than `timestamp`; returns how many were removed
    fn retain_since(&mut self, timestamp: i64) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory nutrition store
#[derive(Debug, Clone, Default)]
pub struct MemoryNutritionStore {
    windows: NutritionSeries,
}

impl MemoryNutritionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn range(&self, start: i64, end: i64) -> NutritionSeries {
        if start >= end {
            return NutritionSeries::new();
        }
        self.windows
            .range(start..end)
            .map(|(ts, n)| (*ts, n.clone()))
            .collect()
    }
}

impl NutritionStore for MemoryNutritionStore {
    fn add(&mut self, timestamp: i64, nutrition: Nutrition) {
        let window = self.windows.entry(timestamp).or_default();
        window.extend(nutrition);
    }

    fn get(&self, timestamp: i64) -> Nutrition {
        self.windows.get(&timestamp).cloned().unwrap_or_default()
    }

    fn all(&self) -> NutritionSeries {
        self.windows.clone()
    }

    fn between(&self, start: i64, end: i64) -> NutritionSeries {
        self.range(start, end)
    }

    fn since(&self, start: i64) -> NutritionSeries {
        self.windows
            .range(start..)
            .map(|(ts, n)| (*ts, n.clone()))
            .collect()
    }

    fn until(&self, end: i64) -> NutritionSeries {
        self.windows
            .range(..end)
            .map(|(ts, n)| (*ts, n.clone()))
            .collect()
    }

    fn remove(&mut self, timestamps: &[i64]) {
        for ts in timestamps {
            self.windows.remove(ts);
        }
    }

    fn recent(&self, n: usize, before: i64) -> Vec<(i64, Nutrition)> {
        self.windows
            .range(..before)
            .rev()
            .take(n)
            .map(|(ts, n)| (*ts, n.clone()))
            .collect()
    }

    fn retain_since(&mut self, timestamp: i64) -> usize {
        let kept = self.windows.split_off(&timestamp);
        let removed = self.windows.len();
        self.windows = kept;
        removed
    }

    fn len(&self) -> usize {
        self.windows.len()
    }
}
