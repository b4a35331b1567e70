//! Species records: static configuration describing each kind of animal.
//!
//! A species is data, not behavior: baseline stats plus an offspring
//! factory. The random pickers are used only while seeding the island.

use rand::Rng;

use crate::organism::{Kind, Organism, OrganismError};

/// Baseline stats for one species. Offspring always start from these values;
/// nothing is inherited from the parents.
#[derive(Debug, Clone, Copy)]
pub struct Species {
    pub name: &'static str,
    pub kind: Kind,
    /// Body weight in kilograms.
    pub weight: u32,
    /// Starting speed, in cells per tick.
    pub speed: u32,
    /// Speed an organism recovers to when comfortably fed.
    pub max_speed: u32,
    pub max_satiety: i32,
    /// Upper bound of the feeding chance roll.
    pub eating_chance: u32,
    pub initial_satiety: i32,
}

impl Species {
    /// Factory operation: a fresh organism with this species' baseline
    /// stats, validated at construction.
    pub fn spawn(&'static self) -> Result<Organism, OrganismError> {
        Organism::new(self)
    }
}

pub static WOLF: Species = Species {
    name: "wolf",
    kind: Kind::Predator,
    weight: 20,
    speed: 3,
    max_speed: 10,
    max_satiety: 10,
    eating_chance: 4,
    initial_satiety: 3,
};

pub static BEAR: Species = Species {
    name: "bear",
    kind: Kind::Predator,
    weight: 150,
    speed: 2,
    max_speed: 10,
    max_satiety: 10,
    eating_chance: 4,
    initial_satiety: 5,
};

pub static RABBIT: Species = Species {
    name: "rabbit",
    kind: Kind::Herbivore,
    weight: 2,
    speed: 4,
    max_speed: 9,
    max_satiety: 5,
    eating_chance: 3,
    initial_satiety: 3,
};

pub static GOAT: Species = Species {
    name: "goat",
    kind: Kind::Herbivore,
    weight: 60,
    speed: 3,
    max_speed: 7,
    max_satiety: 8,
    eating_chance: 4,
    initial_satiety: 4,
};

pub static HERBIVORES: [&Species; 2] = [&RABBIT, &GOAT];
pub static PREDATORS: [&Species; 2] = [&WOLF, &BEAR];

/// Pick a herbivore species uniformly at random.
pub fn random_herbivore(rng: &mut impl Rng) -> &'static Species {
    HERBIVORES[rng.gen_range(0..HERBIVORES.len())]
}

/// Pick a predator species uniformly at random.
pub fn random_predator(rng: &mut impl Rng) -> &'static Species {
    PREDATORS[rng.gen_range(0..PREDATORS.len())]
}
