//! Storage selection: one repository type the handlers can hold regardless of
//! which backend the config picked.

use std::sync::Arc;
use std::time::SystemTime;

use domain::adapters::memory_repo::InMemoryCarRepo;
use domain::{Car, CarId, CarRepository, CoreError, NewCar};

enum RepoKind {
    Memory(InMemoryCarRepo),
    #[cfg(feature = "sqlite")]
    Sqlite(sqlite_adapter::SqliteCarRepo),
}

#[derive(Clone)]
pub struct AnyRepo {
    kind: Arc<RepoKind>,
}

impl AnyRepo {
    pub fn memory() -> Self {
        Self {
            kind: Arc::new(RepoKind::Memory(InMemoryCarRepo::new())),
        }
    }

    #[cfg(feature = "sqlite")]
    pub fn sqlite(path: &std::path::Path) -> Result<Self, CoreError> {
        Ok(Self {
            kind: Arc::new(RepoKind::Sqlite(sqlite_adapter::SqliteCarRepo::open(path)?)),
        })
    }

    pub fn backend(&self) -> &'static str {
        match &*self.kind {
            RepoKind::Memory(_) => "memory",
            #[cfg(feature = "sqlite")]
            RepoKind::Sqlite(_) => "sqlite",
        }
    }

    fn inner(&self) -> &dyn CarRepository {
        match &*self.kind {
            RepoKind::Memory(r) => r,
            #[cfg(feature = "sqlite")]
            RepoKind::Sqlite(r) => r,
        }
    }
}

impl CarRepository for AnyRepo {
    fn find_all(&self) -> Result<Vec<Car>, CoreError> {
        self.inner().find_all()
    }

    fn find_by_make_ignore_case(&self, make: &str) -> Result<Vec<Car>, CoreError> {
        self.inner().find_by_make_ignore_case(make)
    }

    fn find_by_id(&self, id: CarId) -> Result<Option<Car>, CoreError> {
        self.inner().find_by_id(id)
    }

    fn insert(&self, car: NewCar, now: SystemTime) -> Result<Car, CoreError> {
        self.inner().insert(car, now)
    }

    fn insert_all(&self, cars: Vec<NewCar>, now: SystemTime) -> Result<Vec<Car>, CoreError> {
        self.inner().insert_all(cars, now)
    }

    fn update(&self, car: &Car) -> Result<(), CoreError> {
        self.inner().update(car)
    }

    fn delete_by_id(&self, id: CarId) -> Result<(), CoreError> {
        self.inner().delete_by_id(id)
    }

    fn count(&self) -> Result<u64, CoreError> {
        self.inner().count()
    }
}
