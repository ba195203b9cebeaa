//! Default rows inserted on first startup.

use crate::{CoreError, NewCar};

/// Make/model pairs seeded into an empty store, in insertion order.
pub const DEFAULT_CARS: [(&str, &str); 3] = [
    ("Toyota", "Hilux"),
    ("Volkswagen", "Beetle"),
    ("Fiat", "Panda"),
];

/// Result of a seeding attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeedOutcome {
    /// The store was empty and this many rows were inserted.
    Seeded(usize),
    /// The store already held rows; nothing was inserted.
    AlreadySeeded,
}

pub fn default_cars() -> Result<Vec<NewCar>, CoreError> {
    DEFAULT_CARS
        .iter()
        .map(|(make, model)| NewCar::new(*make, *model))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cars_are_valid() {
        let cars = default_cars().unwrap();
        assert_eq!(cars.len(), 3);
        assert_eq!(cars[0].make(), "Toyota");
        assert_eq!(cars[2].model(), "Panda");
    }
}
