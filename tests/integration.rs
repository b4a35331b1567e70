//! Integration tests for islet

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use islet::species::{self, Species};
use islet::{Config, Grid, Kind, OrganismHandle, Scheduler, ShutdownOutcome, World};

fn place(grid: &Grid, species: &'static Species, row: usize, col: usize) -> OrganismHandle {
    let handle = OrganismHandle::new(species.spawn().unwrap());
    grid.cell_at(row, col)
        .unwrap()
        .add_organism_at(handle.clone(), row, col);
    handle
}

#[test]
fn test_simulation_terminates_under_starvation() {
    let mut config = Config::default();
    config.world.rows = 6;
    config.world.cols = 6;
    // No grass anywhere: herbivores only lose satiety, so each reproduction
    // wave is at most half the previous population and herbivores vanish in
    // a bounded number of ticks; the predators then starve behind them.
    config.population.grass_probability = 0.0;
    config.population.max_herbivores_per_cell = 3;
    config.scheduler.workers = 4;

    let mut world = World::new_with_seed(config, 20240801).unwrap();
    assert!(world.population() > 0, "seed produced an empty island");

    let ran = world.run_until_extinct(200);
    assert!(world.is_extinct(), "population survived {ran} ticks");

    // The driver loop exits on exactly the tick that emptied the island.
    assert_eq!(world.population(), 0);
    assert_eq!(world.shutdown(), ShutdownOutcome::Clean);
}

#[test]
fn test_one_cell_predator_and_prey() {
    let grid = Arc::new(Grid::new(1, 1));
    let wolf = place(&grid, &species::WOLF, 0, 0);
    let rabbit = place(&grid, &species::RABBIT, 0, 0);

    let mut scheduler = Scheduler::new(Arc::clone(&grid), 2, 99);
    scheduler.run_tick();

    // With a single living herbivore in the cell, the predator cannot miss.
    assert!(!rabbit.is_alive());
    assert!(wolf.is_alive());
    assert_eq!(wolf.lock().satiety(), species::WOLF.initial_satiety + 1);

    // No prey left: the wolf starves in a bounded number of ticks.
    let mut ticks = 0;
    while scheduler.count_alive() > 0 {
        scheduler.run_tick();
        ticks += 1;
        assert!(ticks <= 10, "wolf survived too long without prey");
    }
    assert_eq!(scheduler.count_alive(), 0);
    scheduler.shutdown(Duration::from_secs(2));
}

#[test]
fn test_reproduction_through_a_full_tick() {
    let grid = Arc::new(Grid::new(1, 1));
    grid.cell_at(0, 0).unwrap().set_grass(true);
    let originals: Vec<_> = (0..5).map(|_| place(&grid, &species::GOAT, 0, 0)).collect();

    let mut scheduler = Scheduler::new(Arc::clone(&grid), 2, 7);
    let summary = scheduler.run_tick();

    // Goats start at satiety 4 and lose at most 2, so all five survive the
    // feeding phase; floor(5/2) offspring join them.
    assert_eq!(summary.births, 2);
    assert_eq!(summary.alive, 7);
    for original in &originals {
        assert!(original.is_alive());
    }
    scheduler.shutdown(Duration::from_secs(2));
}

#[test]
fn test_out_of_bounds_moves_keep_organism_in_place() {
    let grid = Arc::new(Grid::new(1, 1));
    grid.cell_at(0, 0).unwrap().set_grass(true);
    let goat = place(&grid, &species::GOAT, 0, 0);

    let mut scheduler = Scheduler::new(Arc::clone(&grid), 2, 13);
    scheduler.run_tick();

    // Every non-zero offset lands outside the 1x1 grid.
    assert_eq!(goat.coords(), (0, 0));
    assert_eq!(grid.cell_at(0, 0).unwrap().snapshot_organisms().len(), 1);
    scheduler.shutdown(Duration::from_secs(2));
}

#[test]
fn test_census_conservation_and_invariants() {
    let mut config = Config::default();
    config.world.rows = 8;
    config.world.cols = 8;
    config.population.max_herbivores_per_cell = 3;
    config.scheduler.workers = 6;

    let mut world = World::new_with_seed(config, 4242).unwrap();
    let mut previous_alive = world.population();

    for _ in 0..20 {
        let summary = world.step();

        // alive_before + births - deaths == alive_after, exactly.
        assert_eq!(previous_alive + summary.births - summary.deaths, summary.alive);
        previous_alive = summary.alive;

        if summary.alive > 5_000 {
            break;
        }

        // Every living organism satisfies the satiety and speed bounds.
        for cell in world.grid.cells() {
            for organism in cell.snapshot_organisms() {
                let org = organism.lock();
                if !org.is_alive() {
                    continue;
                }
                assert!(org.satiety() > 0, "{} alive at satiety 0", org.name());
                assert!(org.satiety() <= org.max_satiety());
                assert!(org.speed() <= org.max_speed());
                assert_eq!(organism.coords(), cell.coords());
            }
        }

        if world.is_extinct() {
            break;
        }
    }
    world.shutdown();
}

// A grazer that always succeeds (chance roll of 0 is even) so stress threads
// keep their organisms alive while hammering cross-cell migration.
static SPRINTER: Species = Species {
    name: "sprinter",
    kind: Kind::Herbivore,
    weight: 10,
    speed: 5,
    max_speed: 5,
    max_satiety: 10,
    eating_chance: 0,
    initial_satiety: 10,
};

#[test]
fn test_concurrent_opposing_moves_never_deadlock() {
    let grid = Arc::new(Grid::new(2, 2));
    for cell in grid.cells() {
        cell.set_grass(true);
    }

    let threads = 8;
    let (done_tx, done_rx) = mpsc::channel();
    for i in 0..threads {
        let grid = Arc::clone(&grid);
        let done = done_tx.clone();
        thread::spawn(move || {
            let mut rng = ChaCha8Rng::seed_from_u64(i as u64);
            let mut organism = OrganismHandle::new(SPRINTER.spawn().unwrap());
            let home = grid.cell_at(i % 2, (i / 2) % 2).unwrap();
            home.add_organism_at(organism.clone(), home.row(), home.col());

            for _ in 0..500 {
                // Overfed sprinters slow to a halt; swap in a fresh one so
                // migrations keep flowing in both directions.
                let stuck = {
                    let org = organism.lock();
                    !org.is_alive() || org.speed() == 0
                };
                if stuck {
                    organism = OrganismHandle::new(SPRINTER.spawn().unwrap());
                    home.add_organism_at(organism.clone(), home.row(), home.col());
                }
                organism.live_one_cycle(&grid, &mut rng);
            }
            let _ = done.send(());
        });
    }
    drop(done_tx);

    for _ in 0..threads {
        done_rx
            .recv_timeout(Duration::from_secs(30))
            .expect("stress thread blocked: likely a lock-ordering deadlock");
    }
}

#[test]
fn test_parallel_ticks_on_busy_grid_complete() {
    let grid = Arc::new(Grid::new(4, 4));
    for cell in grid.cells() {
        cell.set_grass(true);
        for _ in 0..2 {
            place(&grid, &species::RABBIT, cell.row(), cell.col());
        }
        place(&grid, &species::WOLF, cell.row(), cell.col());
    }

    let (done_tx, done_rx) = mpsc::channel();
    thread::spawn(move || {
        let mut scheduler = Scheduler::new(grid, 8, 31337);
        for _ in 0..50 {
            let summary = scheduler.run_tick();
            assert_eq!(summary.failed_partitions, 0);
            if summary.alive == 0 || summary.alive > 5_000 {
                break;
            }
        }
        scheduler.shutdown(Duration::from_secs(2));
        let _ = done_tx.send(());
    });

    done_rx
        .recv_timeout(Duration::from_secs(60))
        .expect("scheduler did not finish 50 ticks: likely deadlocked");
}

#[test]
fn test_shutdown_is_observable_and_repeatable() {
    let mut config = Config::default();
    config.world.rows = 2;
    config.world.cols = 2;
    config.scheduler.workers = 2;
    config.scheduler.shutdown_grace_ms = 2_000;

    let mut world = World::new_with_seed(config, 1).unwrap();
    world.step();
    assert_eq!(world.shutdown(), ShutdownOutcome::Clean);
    // A second shutdown finds nothing left to stop.
    assert_eq!(world.shutdown(), ShutdownOutcome::Clean);
}
