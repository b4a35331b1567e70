//! # islet
//!
//! Concurrent island ecosystem simulator.
//!
//! A 2D grid of cells holds herbivores, predators and static grass. Every
//! tick, a fixed worker pool runs one partition task per contiguous row
//! range; each task moves, feeds and reproduces the organisms in its cells.
//! Cross-cell movement locks both cells in a canonical order, so concurrent
//! migrations can never deadlock. The simulation ends when nothing is left
//! alive.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use islet::{Config, World};
//!
//! let config = Config::default();
//! let mut world = World::new(config).unwrap();
//!
//! while world.population() > 0 {
//!     world.step();
//! }
//! world.shutdown();
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use islet::Config;
//!
//! let mut config = Config::default();
//! config.world.rows = 8;
//! config.world.cols = 8;
//! config.population.grass_probability = 0.7;
//! ```

pub mod cell;
pub mod config;
pub mod grid;
pub mod organism;
pub mod pool;
pub mod scheduler;
pub mod species;
pub mod stats;
pub mod world;

// Re-export main types
pub use cell::Cell;
pub use config::Config;
pub use grid::Grid;
pub use organism::{FeedOutcome, Kind, Organism, OrganismError, OrganismHandle};
pub use pool::ShutdownOutcome;
pub use scheduler::{Scheduler, TickSummary};
pub use stats::{Census, CensusHistory};
pub use world::World;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run a quick benchmark
pub fn benchmark(ticks: u64, rows: usize, cols: usize) -> Result<BenchmarkResult, OrganismError> {
    use std::time::Instant;

    let mut config = Config::default();
    config.world.rows = rows;
    config.world.cols = cols;

    let mut world = World::new(config)?;
    let initial_population = world.population();

    let start = Instant::now();
    let ticks_run = world.run_until_extinct(ticks);
    let elapsed = start.elapsed();
    let final_population = world.population();
    world.shutdown();

    Ok(BenchmarkResult {
        ticks_run,
        initial_population,
        final_population,
        elapsed_secs: elapsed.as_secs_f64(),
        ticks_per_second: ticks_run as f64 / elapsed.as_secs_f64().max(f64::EPSILON),
    })
}

/// Benchmark result
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub ticks_run: u64,
    pub initial_population: usize,
    pub final_population: usize,
    pub elapsed_secs: f64,
    pub ticks_per_second: f64,
}

impl std::fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Benchmark Results ===")?;
        writeln!(f, "Ticks: {}", self.ticks_run)?;
        writeln!(
            f,
            "Population: {} -> {}",
            self.initial_population, self.final_population
        )?;
        writeln!(f, "Time: {:.3}s", self.elapsed_secs)?;
        writeln!(f, "Speed: {:.1} ticks/s", self.ticks_per_second)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_benchmark_runs() {
        let result = benchmark(20, 3, 3).unwrap();
        assert!(result.ticks_run <= 20);
        assert!(result.ticks_per_second > 0.0);
    }
}
