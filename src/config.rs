//! Configuration file handling
//!
//! All sections are optional in the TOML file; missing keys take their
//! defaults. A missing file means the default configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consumer::{JoinConfig, NutritionConfig, WindowConfig, WindowMode};
use crate::error::ConfigError;
use crate::nlp::{TokenizerConfig, WeightingConfig};
use crate::queue::DocumentQueue;
use crate::tdt::{BurstDetector, DetectorConfig};
use crate::timeline::TimelineConfig;
use crate::vsm::ClusteringConfig;

/// Input queue options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum queued documents; unbounded when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<usize>,
}

impl QueueConfig {
    /// Create a queue honouring the configured capacity
    pub fn build<T>(&self) -> Result<DocumentQueue<T>, ConfigError> {
        match self.capacity {
            Some(capacity) => DocumentQueue::bounded(capacity),
            None => Ok(DocumentQueue::unbounded()),
        }
    }
}

/// Complete eventline configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventlineConfig {
    pub window: WindowConfig,
    pub clustering: ClusteringConfig,
    pub detector: DetectorConfig,
    pub nutrition: NutritionConfig,
    pub join: JoinConfig,
    pub queue: QueueConfig,
    pub tokenizer: TokenizerConfig,
    pub weighting: WeightingConfig,
    pub timeline: TimelineConfig,
}

impl EventlineConfig {
    /// Check every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.window.validate()?;
        self.clustering.validate()?;
        BurstDetector::from_config(&self.detector)?;
        // Both halves of a dynamic window need at least one checkpoint
        if let (DetectorConfig::Zhao(zhao), WindowMode::Windowed) =
            (&self.detector, self.window.mode)
        {
            let shortest = 2 * self.window.length_secs;
            for window in &zhao.windows {
                ConfigError::check_range(
                    "detector.windows",
                    *window as f64,
                    shortest as f64,
                    f64::INFINITY,
                    "at least twice window.length_secs",
                )?;
            }
        }
        self.join.validate()?;
        if let Some(capacity) = self.queue.capacity {
            ConfigError::check_positive("queue.capacity", capacity as f64)?;
        }
        ConfigError::check_positive("tokenizer.min_length", self.tokenizer.min_length as f64)?;
        self.timeline.validate()?;
        Ok(())
    }
}

/// Default config location: `<config dir>/eventline/eventline.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("eventline").join("eventline.toml"))
}

/// Load and validate a configuration file
pub fn load_config(path: &Path) -> Result<EventlineConfig, ConfigError> {
    if !path.exists() {
        return Ok(EventlineConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: EventlineConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Save configuration, creating parent directories
pub fn save_config(config: &EventlineConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consumer::TimeMode;
    use crate::tdt::ZhaoConfig;
    use crate::vsm::FreezePolicy;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, EventlineConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("eventline.toml");

        let mut config = EventlineConfig::default();
        config.detector = DetectorConfig::Zhao(ZhaoConfig::default());
        config.clustering.freeze = FreezePolicy::Temporal {
            period_secs: 300,
            recency_decay: 0.5,
        };
        config.queue.capacity = Some(1000);
        save_config(&config, &path).unwrap();

        assert_eq!(load_config(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("eventline.toml");
        std::fs::write(
            &path,
            r#"
[window]
length_secs = 30
mode = "immediate"
time = "live"

[detector]
algorithm = "cataldi"
windows = 5

[clustering.freeze]
kind = "ticks"
period = 10
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.window.length_secs, 30);
        assert_eq!(config.window.mode, WindowMode::Immediate);
        assert_eq!(config.window.time, TimeMode::Live);
        assert_eq!(config.detector.name(), "cataldi");
        assert_eq!(config.clustering.freeze, FreezePolicy::Ticks { period: 10 });
        assert_eq!(config.join, JoinConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("eventline.toml");
        std::fs::write(&path, "[clustering]\nthreshold = 1.5\n").unwrap();
        assert!(matches!(
            load_config(&path),
            Err(ConfigError::OutOfRange { .. })
        ));

        std::fs::write(&path, "[window\n").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_zhao_windows_must_span_two_consumer_windows() {
        let mut config = EventlineConfig {
            detector: DetectorConfig::Zhao(ZhaoConfig::default()),
            ..EventlineConfig::default()
        };
        assert!(config.validate().is_ok());

        config.detector = DetectorConfig::Zhao(ZhaoConfig {
            windows: vec![10, 20, 30, 60],
            ..ZhaoConfig::default()
        });
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { field: "detector.windows", .. })
        ));

        // Immediate consumers checkpoint per batch, not per window
        config.window.mode = WindowMode::Immediate;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_queue_capacity() {
        let config = QueueConfig { capacity: Some(0) };
        assert!(config.build::<u32>().is_err());
        let queue = QueueConfig { capacity: Some(2) }.build::<u32>().unwrap();
        queue.enqueue(1).unwrap();
        queue.enqueue(2).unwrap();
        assert!(queue.enqueue(3).is_err());
    }
}
