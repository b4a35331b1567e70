//! Organisms and their per-tick lifecycle: move, feed, die.
//!
//! An organism is shared between cells and tasks through [`OrganismHandle`],
//! because a predator mutates its victim across the snapshot boundary and a
//! migrating organism changes cells while stale snapshots may still hold a
//! reference to it. Lock hierarchy: cell locks are acquired before organism
//! locks, never the other way around, and no code path holds more than one
//! organism lock at a time.

use std::sync::{Arc, Mutex, MutexGuard};

use rand::Rng;
use thiserror::Error;

use crate::cell::{lock_ordered, Cell};
use crate::grid::Grid;
use crate::species::Species;

/// What an organism eats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Herbivore,
    Predator,
}

/// Construction-time validation failures. These propagate to the caller and
/// are never caught inside the simulation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrganismError {
    #[error("species name must not be empty")]
    EmptyName,
    #[error("weight must be positive")]
    NonPositiveWeight,
    #[error("speed {0} outside 0..=5")]
    SpeedOutOfRange(u32),
    #[error("max satiety {0} outside 1..=10")]
    MaxSatietyOutOfRange(i32),
    #[error("eating chance {0} outside 0..=5")]
    EatingChanceOutOfRange(u32),
    #[error("satiety {satiety} outside 0..={max_satiety}")]
    SatietyOutOfRange { satiety: i32, max_satiety: i32 },
}

/// Result of one feeding attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedOutcome {
    /// Herbivore found grass and the chance roll came up even.
    Grazed,
    /// Herbivore found no grass or lost the roll.
    WentHungry,
    /// Predator killed a herbivore of the named species.
    Hunted(&'static str),
    /// Predator found no living herbivore in its cell.
    NoPrey,
}

/// An animal on the island.
///
/// Static stats (name, kind, weight, limits) come from the species record;
/// only position, speed, satiety and the alive flag change over a lifetime.
#[derive(Debug)]
pub struct Organism {
    species: &'static Species,
    speed: u32,
    satiety: i32,
    alive: bool,
    row: usize,
    col: usize,
}

impl Organism {
    /// Build an organism with its species' baseline stats, validating every
    /// attribute range. This is the single validated construction boundary.
    pub fn new(species: &'static Species) -> Result<Self, OrganismError> {
        if species.name.trim().is_empty() {
            return Err(OrganismError::EmptyName);
        }
        if species.weight == 0 {
            return Err(OrganismError::NonPositiveWeight);
        }
        if species.speed > 5 {
            return Err(OrganismError::SpeedOutOfRange(species.speed));
        }
        if !(1..=10).contains(&species.max_satiety) {
            return Err(OrganismError::MaxSatietyOutOfRange(species.max_satiety));
        }
        if species.eating_chance > 5 {
            return Err(OrganismError::EatingChanceOutOfRange(species.eating_chance));
        }
        if species.initial_satiety < 0 || species.initial_satiety > species.max_satiety {
            return Err(OrganismError::SatietyOutOfRange {
                satiety: species.initial_satiety,
                max_satiety: species.max_satiety,
            });
        }
        Ok(Self {
            species,
            speed: species.speed,
            satiety: species.initial_satiety,
            alive: true,
            row: 0,
            col: 0,
        })
    }

    #[inline]
    pub fn species(&self) -> &'static Species {
        self.species
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.species.name
    }

    #[inline]
    pub fn kind(&self) -> Kind {
        self.species.kind
    }

    #[inline]
    pub fn weight(&self) -> u32 {
        self.species.weight
    }

    #[inline]
    pub fn speed(&self) -> u32 {
        self.speed
    }

    #[inline]
    pub fn max_speed(&self) -> u32 {
        self.species.max_speed
    }

    #[inline]
    pub fn max_satiety(&self) -> i32 {
        self.species.max_satiety
    }

    #[inline]
    pub fn eating_chance(&self) -> u32 {
        self.species.eating_chance
    }

    #[inline]
    pub fn satiety(&self) -> i32 {
        self.satiety
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    #[inline]
    pub fn row(&self) -> usize {
        self.row
    }

    #[inline]
    pub fn col(&self) -> usize {
        self.col
    }

    #[inline]
    pub fn coords(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    pub(crate) fn set_coords(&mut self, row: usize, col: usize) {
        self.row = row;
        self.col = col;
    }

    /// Mark the organism dead. Returns whether this call performed the
    /// alive → dead transition (two predators can race for one victim).
    pub(crate) fn kill(&mut self) -> bool {
        let was_alive = self.alive;
        self.alive = false;
        was_alive
    }

    pub(crate) fn gain_satiety(&mut self, amount: i32) {
        self.satiety = (self.satiety + amount).min(self.species.max_satiety);
    }

    pub(crate) fn lose_satiety(&mut self, amount: i32) {
        self.satiety -= amount;
    }

    /// Post-feed transitions, applied to the updated satiety: starving or
    /// overfed organisms slow down, comfortable ones recover full speed, and
    /// an empty stomach kills within the same lifecycle step.
    pub(crate) fn settle_after_feed(&mut self) {
        let max = self.species.max_satiety;
        if self.satiety < max / 2 || f64::from(self.satiety) > 0.8 * f64::from(max) {
            self.speed = self.speed.saturating_sub(1);
        } else {
            self.speed = self.species.max_speed;
        }
        if self.satiety <= 0 {
            self.alive = false;
        }
    }
}

/// Shared handle to an organism.
#[derive(Clone)]
pub struct OrganismHandle(Arc<Mutex<Organism>>);

impl OrganismHandle {
    pub fn new(organism: Organism) -> Self {
        Self(Arc::new(Mutex::new(organism)))
    }

    /// Lock the organism. Poisoning is recovered for the same reason as cell
    /// locks: a swallowed partition panic must not wedge shared state.
    pub fn lock(&self) -> MutexGuard<'_, Organism> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Identity comparison: does this handle refer to the same organism?
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn is_alive(&self) -> bool {
        self.lock().is_alive()
    }

    pub fn kind(&self) -> Kind {
        self.lock().kind()
    }

    pub fn species_name(&self) -> &'static str {
        self.lock().name()
    }

    pub fn coords(&self) -> (usize, usize) {
        self.lock().coords()
    }

    /// One tick of life: move, then feed. Dead organisms do nothing, and the
    /// alive check is repeated before feeding because a predator may have
    /// struck while this organism was migrating.
    pub fn live_one_cycle(&self, grid: &Grid, rng: &mut impl Rng) -> Option<FeedOutcome> {
        if !self.is_alive() {
            return None;
        }
        self.move_step(grid, rng);
        if !self.is_alive() {
            return None;
        }
        let (row, col) = self.coords();
        let cell = grid.cell_at(row, col)?;
        Some(self.feed(cell, rng))
    }

    /// Draw a candidate destination within `speed` cells on each axis and
    /// migrate there. Out-of-bounds candidates mean the organism stays put
    /// this tick; a candidate equal to the current cell is a no-op.
    fn move_step(&self, grid: &Grid, rng: &mut impl Rng) {
        let (row, col, speed) = {
            let org = self.lock();
            (org.row(), org.col(), org.speed())
        };
        let span = i64::from(speed);
        let delta_row = rng.gen_range(-span..=span);
        let delta_col = rng.gen_range(-span..=span);
        let candidate_row = row as i64 + delta_row;
        let candidate_col = col as i64 + delta_col;
        if candidate_row < 0 || candidate_col < 0 {
            return;
        }
        let (new_row, new_col) = (candidate_row as usize, candidate_col as usize);
        if new_row >= grid.rows() || new_col >= grid.cols() {
            return;
        }
        if (new_row, new_col) == (row, col) {
            return;
        }
        let (Some(source), Some(dest)) = (grid.cell_at(row, col), grid.cell_at(new_row, new_col))
        else {
            return;
        };

        // Removal and insertion must be atomic with respect to any observer:
        // both locks are held, acquired in canonical order.
        let (mut source_state, mut dest_state) = lock_ordered(source, dest);
        source_state.remove(self);
        self.lock().set_coords(new_row, new_col);
        dest_state.add(self.clone());
        log::debug!(
            "{} moved from ({row}, {col}) to ({new_row}, {new_col})",
            self.species_name()
        );
    }

    /// Attempt to feed in `cell`, then apply the post-feed speed and status
    /// transitions.
    pub fn feed(&self, cell: &Cell, rng: &mut impl Rng) -> FeedOutcome {
        let outcome = match self.kind() {
            Kind::Herbivore => self.graze(cell, rng),
            Kind::Predator => self.hunt(cell, rng),
        };
        self.lock().settle_after_feed();
        outcome
    }

    fn graze(&self, cell: &Cell, rng: &mut impl Rng) -> FeedOutcome {
        let grass = cell.has_grass();
        let chance = self.lock().eating_chance();
        let roll = rng.gen_range(0..=chance);
        let mut org = self.lock();
        if grass && roll % 2 == 0 {
            org.gain_satiety(1);
            log::debug!("{} grazed at ({}, {})", org.name(), org.row(), org.col());
            FeedOutcome::Grazed
        } else {
            org.lose_satiety(2);
            log::debug!(
                "{} found nothing to graze at ({}, {})",
                org.name(),
                org.row(),
                org.col()
            );
            FeedOutcome::WentHungry
        }
    }

    fn hunt(&self, cell: &Cell, rng: &mut impl Rng) -> FeedOutcome {
        let prey: Vec<OrganismHandle> = cell
            .snapshot_organisms()
            .into_iter()
            .filter(|other| {
                let org = other.lock();
                org.kind() == Kind::Herbivore && org.is_alive()
            })
            .collect();

        if prey.is_empty() {
            let mut org = self.lock();
            org.lose_satiety(2);
            log::debug!(
                "{} found no prey at ({}, {})",
                org.name(),
                org.row(),
                org.col()
            );
            return FeedOutcome::NoPrey;
        }

        let victim = &prey[rng.gen_range(0..prey.len())];
        let victim_name = {
            let mut victim = victim.lock();
            victim.kill();
            victim.name()
        };
        let mut org = self.lock();
        org.gain_satiety(1);
        log::debug!(
            "{} ate a {} at ({}, {})",
            org.name(),
            victim_name,
            org.row(),
            org.col()
        );
        FeedOutcome::Hunted(victim_name)
    }
}
