//! Configuration for the island simulation.
//!
//! Supports YAML configuration files with sensible defaults.

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub population: PopulationConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Grid dimensions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Number of grid rows
    pub rows: usize,
    /// Number of grid columns
    pub cols: usize,
}

/// Initial population of the island
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Probability that a cell grows grass (0.0 - 1.0)
    pub grass_probability: f64,
    /// Herbivores per cell are drawn uniformly from 0..=this
    pub max_herbivores_per_cell: u32,
    /// Predators per cell are drawn uniformly from 0..=this
    pub max_predators_per_cell: u32,
}

/// Worker pool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Partition tasks per tick; 0 picks hardware parallelism + 2
    pub workers: usize,
    /// Grace period for each shutdown phase, in milliseconds
    pub shutdown_grace_ms: u64,
}

/// Logging and stats configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Ticks between census history snapshots
    pub stats_interval: u64,
    /// Default log filter (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self { rows: 4, cols: 4 }
    }
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            grass_probability: 0.5,
            max_herbivores_per_cell: 2,
            max_predators_per_cell: 1,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            shutdown_grace_ms: 10_000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            stats_interval: 10,
            log_level: "info".to_string(),
        }
    }
}

impl SchedulerConfig {
    /// Resolve the worker count, falling back to hardware parallelism + 2.
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            self.workers
        } else {
            std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(4)
                + 2
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.world.rows == 0 || self.world.cols == 0 {
            return Err("grid dimensions must be at least 1x1".to_string());
        }
        if !(0.0..=1.0).contains(&self.population.grass_probability) {
            return Err("grass_probability must be between 0.0 and 1.0".to_string());
        }
        if self.logging.stats_interval == 0 {
            return Err("stats_interval must be > 0".to_string());
        }
        Ok(())
    }
}
