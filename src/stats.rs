//! Population census and history tracking.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::grid::Grid;
use crate::organism::Kind;

/// Population snapshot for one tick.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Census {
    /// Tick this census describes
    pub tick: u64,
    /// Total living organisms
    pub alive: usize,
    /// Living herbivores
    pub herbivores: usize,
    /// Living predators
    pub predators: usize,
    /// Offspring born this tick
    pub births: usize,
    /// Organisms that died this tick
    pub deaths: usize,
    /// Living organisms per species name
    pub by_species: HashMap<String, usize>,
}

impl Census {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recount the living population from the grid.
    pub fn scan(&mut self, grid: &Grid) {
        self.alive = 0;
        self.herbivores = 0;
        self.predators = 0;
        self.by_species.clear();

        for cell in grid.cells() {
            for organism in cell.snapshot_organisms() {
                let org = organism.lock();
                if !org.is_alive() {
                    continue;
                }
                self.alive += 1;
                match org.kind() {
                    Kind::Herbivore => self.herbivores += 1,
                    Kind::Predator => self.predators += 1,
                }
                *self.by_species.entry(org.name().to_string()).or_insert(0) += 1;
            }
        }
    }

    /// Refresh all fields after a completed tick.
    pub fn refresh(&mut self, grid: &Grid, tick: u64, births: usize, deaths: usize) {
        self.scan(grid);
        self.tick = tick;
        self.births = births;
        self.deaths = deaths;
    }

    /// One-line human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "tick {:>5} | alive {:>4} ({} herbivores, {} predators) | +{} born, -{} died",
            self.tick, self.alive, self.herbivores, self.predators, self.births, self.deaths
        )
    }
}

/// Census snapshots recorded at a fixed tick interval.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CensusHistory {
    pub snapshots: Vec<Census>,
    interval: u64,
}

impl CensusHistory {
    pub fn new(interval: u64) -> Self {
        Self {
            snapshots: Vec::new(),
            interval: interval.max(1),
        }
    }

    #[inline]
    pub fn should_record(&self, tick: u64) -> bool {
        tick % self.interval == 0
    }

    pub fn record(&mut self, census: Census) {
        self.snapshots.push(census);
    }

    /// (tick, alive) series for plotting or analysis.
    pub fn population_series(&self) -> Vec<(u64, usize)> {
        self.snapshots.iter().map(|c| (c.tick, c.alive)).collect()
    }

    /// Save history to a JSON file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::organism::OrganismHandle;
    use crate::species;

    fn seeded_grid() -> Grid {
        let grid = Grid::new(2, 2);
        for (species, row, col) in [
            (&species::RABBIT, 0, 0),
            (&species::RABBIT, 0, 1),
            (&species::WOLF, 1, 0),
        ] {
            let handle = OrganismHandle::new(species.spawn().unwrap());
            grid.cell_at(row, col)
                .unwrap()
                .add_organism_at(handle, row, col);
        }
        grid
    }

    #[test]
    fn test_scan_counts_by_kind_and_species() {
        let grid = seeded_grid();
        let mut census = Census::new();
        census.scan(&grid);

        assert_eq!(census.alive, 3);
        assert_eq!(census.herbivores, 2);
        assert_eq!(census.predators, 1);
        assert_eq!(census.by_species["rabbit"], 2);
        assert_eq!(census.by_species["wolf"], 1);
    }

    #[test]
    fn test_scan_skips_dead() {
        let grid = seeded_grid();
        let doomed = OrganismHandle::new(species::GOAT.spawn().unwrap());
        doomed.lock().kill();
        grid.cell_at(1, 1).unwrap().add_organism_at(doomed, 1, 1);

        let mut census = Census::new();
        census.scan(&grid);
        assert_eq!(census.alive, 3);
        assert!(!census.by_species.contains_key("goat"));
    }

    #[test]
    fn test_summary_format() {
        let grid = seeded_grid();
        let mut census = Census::new();
        census.refresh(&grid, 7, 2, 1);
        let line = census.summary();
        assert!(line.contains("tick"));
        assert!(line.contains("alive"));
        assert!(line.contains("+2 born"));
        assert!(line.contains("-1 died"));
    }

    #[test]
    fn test_history_records_and_series() {
        let mut history = CensusHistory::new(5);
        assert!(history.should_record(0));
        assert!(!history.should_record(3));
        assert!(history.should_record(10));

        let mut census = Census::new();
        census.tick = 0;
        census.alive = 12;
        history.record(census.clone());
        census.tick = 5;
        census.alive = 9;
        history.record(census);

        assert_eq!(history.population_series(), vec![(0, 12), (5, 9)]);
    }

    #[test]
    fn test_history_save() {
        let mut history = CensusHistory::new(1);
        history.record(Census::new());
        let path = std::env::temp_dir().join("islet_census_history_test.json");
        history.save(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("snapshots"));
        std::fs::remove_file(&path).ok();
    }
}
