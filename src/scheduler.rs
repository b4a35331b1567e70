//! The tick scheduler: partitioned, parallel execution of one simulation
//! step.
//!
//! Each tick, the grid's rows are split into one contiguous range per
//! worker. A partition task walks its rows cell by cell: snapshot the cell,
//! run every organism's move+feed cycle, run the reproduction pass, sweep
//! the dead. The scheduler blocks on a completion channel until every
//! partition has reported; that channel is the tick barrier. A partition
//! that panics is caught at the barrier, logged, and counted; the tick is
//! still reported complete.

use std::collections::HashMap;
use std::ops::Range;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::cell::Cell;
use crate::grid::Grid;
use crate::pool::{ShutdownOutcome, TickPool};
use crate::species::Species;

/// What happened during one tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickSummary {
    /// Tick number, starting at 0.
    pub tick: u64,
    /// Organisms alive once the tick finished.
    pub alive: usize,
    /// Offspring added by the reproduction pass.
    pub births: usize,
    /// Organisms that died this tick (starvation and predation).
    pub deaths: usize,
    /// Partition tasks submitted.
    pub partitions: usize,
    /// Partition tasks that panicked and were swallowed at the barrier.
    pub failed_partitions: usize,
}

#[derive(Debug, Default)]
struct PartitionReport {
    births: usize,
}

/// Drives the simulation over a shared grid with a reusable worker pool.
pub struct Scheduler {
    grid: Arc<Grid>,
    pool: TickPool,
    workers: usize,
    rng: ChaCha8Rng,
    tick: u64,
    last_alive: usize,
}

impl Scheduler {
    /// Build a scheduler with `workers` partition tasks per tick. The seed
    /// feeds every per-partition RNG, keeping all lifecycle randomness
    /// injectable.
    pub fn new(grid: Arc<Grid>, workers: usize, seed: u64) -> Self {
        let workers = workers.max(1);
        let mut scheduler = Self {
            grid,
            pool: TickPool::new(workers),
            workers,
            rng: ChaCha8Rng::seed_from_u64(seed),
            tick: 0,
            last_alive: 0,
        };
        scheduler.last_alive = scheduler.count_alive();
        scheduler
    }

    #[inline]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Run one synchronized pass over all cells and return its summary.
    /// Blocks until every partition task has completed.
    pub fn run_tick(&mut self) -> TickSummary {
        let rows = self.grid.rows();
        let (done_tx, done_rx) = mpsc::channel();

        let mut submitted = 0;
        for partition in 0..self.workers {
            let range = row_range(partition, rows, self.workers);
            let grid = Arc::clone(&self.grid);
            let seed: u64 = self.rng.gen();
            let done = done_tx.clone();
            let accepted = self.pool.execute(move || {
                let result =
                    panic::catch_unwind(AssertUnwindSafe(|| process_rows(&grid, range, seed)));
                let _ = done.send((partition, result));
            });
            if accepted {
                submitted += 1;
            } else {
                log::error!("worker pool unavailable; partition {partition} not submitted");
            }
        }
        drop(done_tx);

        let mut summary = TickSummary {
            tick: self.tick,
            partitions: submitted,
            ..TickSummary::default()
        };
        for _ in 0..submitted {
            match done_rx.recv() {
                Ok((_, Ok(report))) => summary.births += report.births,
                Ok((partition, Err(_))) => {
                    summary.failed_partitions += 1;
                    log::error!(
                        "partition {partition} failed during tick {}; continuing",
                        self.tick
                    );
                }
                Err(_) => break,
            }
        }

        summary.alive = self.count_alive();
        summary.deaths = (self.last_alive + summary.births).saturating_sub(summary.alive);
        self.last_alive = summary.alive;
        self.tick += 1;
        log::debug!(
            "tick {} complete: {} alive, {} born, {} died",
            summary.tick,
            summary.alive,
            summary.births,
            summary.deaths
        );
        summary
    }

    /// Count living organisms across the whole grid. Single-threaded; the
    /// termination predicate for the driver loop.
    pub fn count_alive(&self) -> usize {
        self.grid
            .cells()
            .flat_map(|cell| cell.snapshot_organisms())
            .filter(|organism| organism.is_alive())
            .count()
    }

    /// Tear down the worker pool. Best-effort: a timeout is reported, not
    /// fatal.
    pub fn shutdown(&mut self, grace: Duration) -> ShutdownOutcome {
        self.pool.shutdown(grace)
    }
}

/// Contiguous row range owned by one partition for one tick.
fn row_range(partition: usize, rows: usize, workers: usize) -> Range<usize> {
    (partition * rows / workers)..((partition + 1) * rows / workers)
}

fn process_rows(grid: &Grid, rows: Range<usize>, seed: u64) -> PartitionReport {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut report = PartitionReport::default();
    for row in rows {
        for col in 0..grid.cols() {
            if let Some(cell) = grid.cell_at(row, col) {
                report.births += process_cell(grid, cell, &mut rng);
            }
        }
    }
    report
}

/// Snapshot → lifecycle → reproduction → sweep for one cell. Returns the
/// number of offspring added.
fn process_cell(grid: &Grid, cell: &Cell, rng: &mut impl Rng) -> usize {
    for organism in cell.snapshot_organisms() {
        organism.live_one_cycle(grid, rng);
    }
    let births = run_reproduction(cell);
    cell.sweep_dead();
    births
}

/// Count-based asexual reproduction: each species group of size n in the
/// cell yields floor(n/2) offspring with baseline stats, parents untouched.
fn run_reproduction(cell: &Cell) -> usize {
    let mut groups: HashMap<&'static str, (usize, &'static Species)> = HashMap::new();
    for organism in cell.snapshot_organisms() {
        let org = organism.lock();
        if !org.is_alive() {
            continue;
        }
        groups.entry(org.name()).or_insert((0, org.species())).0 += 1;
    }

    let (row, col) = cell.coords();
    let mut births = 0;
    for (count, species) in groups.into_values() {
        for _ in 0..count / 2 {
            let offspring = species
                .spawn()
                .expect("catalog species have valid baseline stats");
            cell.add_organism_at(crate::organism::OrganismHandle::new(offspring), row, col);
            births += 1;
            log::debug!("new {} born at ({row}, {col})", species.name);
        }
    }
    births
}
