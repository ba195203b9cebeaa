use crate::seed::{default_cars, SeedOutcome};
use crate::{Car, CarId, CarRepository, Clock, CoreError, NewCar};

/// Application service for the car resource.
///
/// Generic over repository and clock so the domain stays testable without
/// external dependencies. Timestamps come from the clock; the repository only
/// stores them.
pub struct CarService<R: CarRepository, C: Clock> {
    repo: R,
    clock: C,
}

impl<R: CarRepository, C: Clock> CarService<R, C> {
    pub fn new(repo: R, clock: C) -> Self {
        Self { repo, clock }
    }

    /// List all cars, or only those whose make matches ignoring case.
    pub fn find_all(&self, make: Option<&str>) -> Result<Vec<Car>, CoreError> {
        match make {
            Some(make) => self.repo.find_by_make_ignore_case(make),
            None => self.repo.find_all(),
        }
    }

    /// Get a car by id; `None` when absent.
    pub fn find_by_id(&self, id: CarId) -> Result<Option<Car>, CoreError> {
        self.repo.find_by_id(id)
    }

    /// Persist a new car. Any id or timestamps the caller had are not carried
    /// by `NewCar`, so the store assigns fresh ones.
    pub fn save(&self, input: NewCar) -> Result<Car, CoreError> {
        self.repo.insert(input, self.clock.now())
    }

    /// Replace make and model of an existing car.
    pub fn update_by_id(&self, id: CarId, input: NewCar) -> Result<Car, CoreError> {
        let mut existing = self.repo.find_by_id(id)?.ok_or(CoreError::NotFound(id))?;
        existing.apply(input, self.clock.now());
        self.repo.update(&existing)?;
        Ok(existing)
    }

    pub fn delete_by_id(&self, id: CarId) -> Result<(), CoreError> {
        self.repo.delete_by_id(id)
    }

    /// Insert the default rows when the store is empty.
    pub fn seed_if_empty(&self) -> Result<SeedOutcome, CoreError> {
        if self.repo.count()? > 0 {
            return Ok(SeedOutcome::AlreadySeeded);
        }
        let inserted = self.repo.insert_all(default_cars()?, self.clock.now())?;
        Ok(SeedOutcome::Seeded(inserted.len()))
    }

    pub fn count(&self) -> Result<u64, CoreError> {
        self.repo.count()
    }
}
