//! The island world: construction, initial population, and the driver loop.

use std::sync::Arc;
use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::{Config, PopulationConfig};
use crate::grid::Grid;
use crate::organism::{OrganismError, OrganismHandle};
use crate::pool::ShutdownOutcome;
use crate::scheduler::{Scheduler, TickSummary};
use crate::species;
use crate::stats::{Census, CensusHistory};

/// The simulation world: a populated grid plus its tick scheduler.
pub struct World {
    pub grid: Arc<Grid>,
    pub config: Config,
    pub census: Census,
    pub history: CensusHistory,
    scheduler: Scheduler,
    seed: u64,
}

impl World {
    /// Create a world with a random seed.
    pub fn new(config: Config) -> Result<Self, OrganismError> {
        let seed = rand::thread_rng().gen();
        Self::new_with_seed(config, seed)
    }

    /// Create a world with a specific seed so runs can be reproduced
    /// (modulo thread scheduling).
    pub fn new_with_seed(config: Config, seed: u64) -> Result<Self, OrganismError> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let grid = Arc::new(Grid::new(config.world.rows, config.world.cols));
        populate(&grid, &config.population, &mut rng)?;

        let workers = config.scheduler.effective_workers();
        let scheduler = Scheduler::new(Arc::clone(&grid), workers, rng.gen());

        let mut census = Census::new();
        census.scan(&grid);
        log::info!(
            "world ready: {}x{} cells, {} organisms, {} workers, seed {}",
            config.world.rows,
            config.world.cols,
            census.alive,
            workers,
            seed
        );

        let history = CensusHistory::new(config.logging.stats_interval);
        Ok(Self {
            grid,
            config,
            census,
            history,
            scheduler,
            seed,
        })
    }

    /// Run one tick and refresh the census.
    pub fn step(&mut self) -> TickSummary {
        let summary = self.scheduler.run_tick();
        self.census
            .refresh(&self.grid, summary.tick, summary.births, summary.deaths);
        if self.history.should_record(summary.tick) {
            self.history.record(self.census.clone());
        }
        summary
    }

    /// Tick until the island is empty, or until `max_ticks` when it is
    /// nonzero. Returns the number of ticks run.
    pub fn run_until_extinct(&mut self, max_ticks: u64) -> u64 {
        let mut ran = 0;
        while self.population() > 0 {
            if max_ticks > 0 && ran >= max_ticks {
                break;
            }
            self.step();
            ran += 1;
        }
        ran
    }

    /// Living organisms right now (full scan).
    pub fn population(&self) -> usize {
        self.scheduler.count_alive()
    }

    pub fn is_extinct(&self) -> bool {
        self.population() == 0
    }

    #[inline]
    pub fn tick(&self) -> u64 {
        self.scheduler.tick()
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Tear down the worker pool with the configured grace period.
    pub fn shutdown(&mut self) -> ShutdownOutcome {
        let grace = Duration::from_millis(self.config.scheduler.shutdown_grace_ms);
        self.scheduler.shutdown(grace)
    }
}

/// Seed every cell: a grass coin flip, then a random handful of herbivores
/// and predators with species picked from the catalog.
fn populate(
    grid: &Grid,
    config: &PopulationConfig,
    rng: &mut ChaCha8Rng,
) -> Result<(), OrganismError> {
    for cell in grid.cells() {
        let grass = rng.gen_bool(config.grass_probability);
        cell.set_grass(grass);

        let herbivores = rng.gen_range(0..=config.max_herbivores_per_cell);
        for _ in 0..herbivores {
            let organism = species::random_herbivore(rng).spawn()?;
            cell.add_organism_at(OrganismHandle::new(organism), cell.row(), cell.col());
        }

        let predators = rng.gen_range(0..=config.max_predators_per_cell);
        for _ in 0..predators {
            let organism = species::random_predator(rng).spawn()?;
            cell.add_organism_at(OrganismHandle::new(organism), cell.row(), cell.col());
        }

        log::debug!(
            "cell ({}, {}) seeded: grass={grass}, herbivores={herbivores}, predators={predators}",
            cell.row(),
            cell.col()
        );
    }
    Ok(())
}
