use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::SystemTime;

use crate::{Car, CarId, CarRepository, CoreError, NewCar};

/// Simple in-memory repository. Ids start at 1 and are never reused, matching
/// the SQLite adapter's AUTOINCREMENT behavior.
pub struct InMemoryCarRepo {
    inner: Mutex<BTreeMap<CarId, Car>>,
    next_id: AtomicI64,
}

impl InMemoryCarRepo {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<CarId, Car>>, CoreError> {
        self.inner
            .lock()
            .map_err(|_| CoreError::Repository("mutex poisoned".into()))
    }

    fn reserve_id(&self) -> CarId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for InMemoryCarRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl CarRepository for InMemoryCarRepo {
    fn find_all(&self) -> Result<Vec<Car>, CoreError> {
        let map = self.lock()?;
        Ok(map.values().cloned().collect())
    }

    fn find_by_make_ignore_case(&self, make: &str) -> Result<Vec<Car>, CoreError> {
        let map = self.lock()?;
        Ok(map
            .values()
            .filter(|c| c.make_matches(make))
            .cloned()
            .collect())
    }

    fn find_by_id(&self, id: CarId) -> Result<Option<Car>, CoreError> {
        let map = self.lock()?;
        Ok(map.get(&id).cloned())
    }

    fn insert(&self, car: NewCar, now: SystemTime) -> Result<Car, CoreError> {
        let mut map = self.lock()?;
        let stored = Car::from_new(self.reserve_id(), car, now);
        map.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn insert_all(&self, cars: Vec<NewCar>, now: SystemTime) -> Result<Vec<Car>, CoreError> {
        // Single lock for the whole batch so readers never see a partial seed.
        let mut map = self.lock()?;
        let stored: Vec<Car> = cars
            .into_iter()
            .map(|c| Car::from_new(self.reserve_id(), c, now))
            .collect();
        for car in &stored {
            map.insert(car.id, car.clone());
        }
        Ok(stored)
    }

    fn update(&self, car: &Car) -> Result<(), CoreError> {
        let mut map = self.lock()?;
        match map.get_mut(&car.id) {
            Some(existing) => {
                existing.make = car.make.clone();
                existing.model = car.model.clone();
                existing.updated_at = car.updated_at;
                Ok(())
            }
            None => Err(CoreError::NotFound(car.id)),
        }
    }

    fn delete_by_id(&self, id: CarId) -> Result<(), CoreError> {
        let mut map = self.lock()?;
        map.remove(&id);
        Ok(())
    }

    fn count(&self) -> Result<u64, CoreError> {
        let map = self.lock()?;
        Ok(map.len() as u64)
    }
}
