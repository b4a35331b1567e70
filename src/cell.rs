//! A single grid cell: organisms, grass, and the per-cell lock protocol.
//!
//! Every mutable piece of simulation state (the organism collection and the
//! grass flag) lives behind exactly one mutex per cell. Single-cell
//! operations acquire that one lock for the duration of the operation.
//! Cross-cell migration is the only code path that ever holds two cell locks
//! at once, and it must acquire them through [`lock_ordered`], which imposes
//! a total order over all cells by (row, col) and thereby rules out
//! lock-order deadlocks between concurrent migrations.

use std::sync::{Mutex, MutexGuard};

use crate::organism::OrganismHandle;

/// Mutable contents of a cell, guarded by the cell's lock.
#[derive(Default)]
pub struct CellState {
    organisms: Vec<OrganismHandle>,
    grass: bool,
}

impl CellState {
    /// The organisms currently resident in this cell.
    pub fn organisms(&self) -> &[OrganismHandle] {
        &self.organisms
    }

    pub fn has_grass(&self) -> bool {
        self.grass
    }

    pub fn set_grass(&mut self, grass: bool) {
        self.grass = grass;
    }

    /// Append an organism to the collection.
    pub fn add(&mut self, organism: OrganismHandle) {
        self.organisms.push(organism);
    }

    /// Remove a departing organism. Returns whether it was present.
    pub fn remove(&mut self, organism: &OrganismHandle) -> bool {
        match self.organisms.iter().position(|o| o.ptr_eq(organism)) {
            Some(idx) => {
                self.organisms.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Drop every organism whose status is dead. Returns how many were removed.
    pub fn sweep_dead(&mut self) -> usize {
        let before = self.organisms.len();
        self.organisms.retain(|o| o.is_alive());
        before - self.organisms.len()
    }
}

/// One grid position with its own lock.
pub struct Cell {
    row: usize,
    col: usize,
    state: Mutex<CellState>,
}

impl Cell {
    pub fn new(row: usize, col: usize) -> Self {
        Self {
            row,
            col,
            state: Mutex::new(CellState::default()),
        }
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

    /// Acquire this cell's lock. Recovers from poisoning: a panicking
    /// partition task is logged and swallowed at the tick barrier, and must
    /// not wedge the cell for the rest of the run.
    pub(crate) fn lock(&self) -> MutexGuard<'_, CellState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `action` with the cell's lock held. The lock is released on every
    /// exit path, including a panic inside `action`.
    pub fn with_lock<T>(&self, action: impl FnOnce(&mut CellState) -> T) -> T {
        let mut state = self.lock();
        action(&mut state)
    }

    /// Add an organism that already carries its coordinates.
    pub fn add_organism(&self, organism: OrganismHandle) {
        self.with_lock(|state| state.add(organism));
    }

    /// Add an organism arriving from elsewhere, updating its stored position
    /// to this cell's coordinates while the cell lock is held.
    pub fn add_organism_at(&self, organism: OrganismHandle, row: usize, col: usize) {
        self.with_lock(|state| {
            organism.lock().set_coords(row, col);
            state.add(organism);
        });
    }

    /// Remove a departing organism.
    pub fn remove_organism(&self, organism: &OrganismHandle) -> bool {
        self.with_lock(|state| state.remove(organism))
    }

    /// Remove every dead organism from the collection.
    pub fn sweep_dead(&self) -> usize {
        self.with_lock(|state| state.sweep_dead())
    }

    /// Point-in-time copy of the organism collection. Never a live view, so
    /// iterating the snapshot cannot race with concurrent mutation.
    pub fn snapshot_organisms(&self) -> Vec<OrganismHandle> {
        self.with_lock(|state| state.organisms().to_vec())
    }

    pub fn has_grass(&self) -> bool {
        self.with_lock(|state| state.has_grass())
    }

    /// Set the grass flag. Written only during initial population.
    pub fn set_grass(&self, grass: bool) {
        self.with_lock(|state| state.set_grass(grass));
    }
}

/// Lock two distinct cells in canonical (row, col) order and return their
/// guards in argument order. Acquiring both locks through this single entry
/// point is what makes concurrent migrations deadlock-free: whichever cell
/// compares lexicographically smaller is always taken first, regardless of
/// which side is the source and which the destination.
pub(crate) fn lock_ordered<'a>(
    a: &'a Cell,
    b: &'a Cell,
) -> (MutexGuard<'a, CellState>, MutexGuard<'a, CellState>) {
    debug_assert_ne!(a.coords(), b.coords(), "lock_ordered requires distinct cells");
    if b.coords() < a.coords() {
        let guard_b = b.lock();
        let guard_a = a.lock();
        (guard_a, guard_b)
    } else {
        let guard_a = a.lock();
        let guard_b = b.lock();
        (guard_a, guard_b)
    }
}
