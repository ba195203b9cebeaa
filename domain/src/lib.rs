//! Domain library for the car catalog.
//!
//! This crate is dependency-free (inherits workspace metadata only) and holds
//! the domain types, ports (traits), and error definitions. Keep adapters and
//! IO concerns out of this crate.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::SystemTime;

use crate::validate::validate_required_text;

/// Server-assigned surrogate key of a car.
pub type CarId = i64;

/// Validated input for creating or updating a car.
///
/// Only constructible through [`NewCar::new`], so every write path carries a
/// non-blank make and model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewCar {
    make: String,
    model: String,
}

impl NewCar {
    pub fn new<M: Into<String>, N: Into<String>>(make: M, model: N) -> Result<Self, CoreError> {
        let make = make.into();
        let model = model.into();
        validate_required_text("make", &make)?;
        validate_required_text("model", &model)?;
        Ok(Self { make, model })
    }

    pub fn make(&self) -> &str {
        &self.make
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn into_parts(self) -> (String, String) {
        (self.make, self.model)
    }
}

/// Stored car record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Car {
    pub id: CarId,
    pub make: String,
    pub model: String,
    /// Set once at insertion.
    pub created_at: SystemTime,
    /// Set at insertion and refreshed on every update.
    pub updated_at: SystemTime,
}

impl Car {
    /// Build a freshly inserted car; both timestamps start at `now`.
    pub fn from_new(id: CarId, input: NewCar, now: SystemTime) -> Self {
        let (make, model) = input.into_parts();
        Self {
            id,
            make,
            model,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the user-editable fields and bump `updated_at`.
    pub fn apply(&mut self, input: NewCar, now: SystemTime) {
        let (make, model) = input.into_parts();
        self.make = make;
        self.model = model;
        self.updated_at = now;
    }

    /// Case-insensitive make comparison shared by all repository adapters.
    pub fn make_matches(&self, make: &str) -> bool {
        fold_case(&self.make) == fold_case(make)
    }
}

/// Unicode-aware case folding used for make lookups.
pub fn fold_case(s: &str) -> String {
    s.to_lowercase()
}

/// Time source abstraction to make code testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}

/// Wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Repository port for persisting and loading cars.
pub trait CarRepository: Send + Sync {
    /// All cars ordered by id.
    fn find_all(&self) -> Result<Vec<Car>, CoreError>;
    /// Cars whose make equals `make`, ignoring case, ordered by id.
    fn find_by_make_ignore_case(&self, make: &str) -> Result<Vec<Car>, CoreError>;
    fn find_by_id(&self, id: CarId) -> Result<Option<Car>, CoreError>;
    /// Insert a new row; the store assigns the id.
    fn insert(&self, car: NewCar, now: SystemTime) -> Result<Car, CoreError>;
    /// Insert several rows atomically.
    fn insert_all(&self, cars: Vec<NewCar>, now: SystemTime) -> Result<Vec<Car>, CoreError>;
    /// Overwrite make, model and updated_at of an existing row.
    fn update(&self, car: &Car) -> Result<(), CoreError>;
    /// Delete by id. Missing ids are not an error.
    fn delete_by_id(&self, id: CarId) -> Result<(), CoreError>;
    fn count(&self) -> Result<u64, CoreError>;
}

impl<R: CarRepository + ?Sized> CarRepository for Arc<R> {
    fn find_all(&self) -> Result<Vec<Car>, CoreError> {
        (**self).find_all()
    }

    fn find_by_make_ignore_case(&self, make: &str) -> Result<Vec<Car>, CoreError> {
        (**self).find_by_make_ignore_case(make)
    }

    fn find_by_id(&self, id: CarId) -> Result<Option<Car>, CoreError> {
        (**self).find_by_id(id)
    }

    fn insert(&self, car: NewCar, now: SystemTime) -> Result<Car, CoreError> {
        (**self).insert(car, now)
    }

    fn insert_all(&self, cars: Vec<NewCar>, now: SystemTime) -> Result<Vec<Car>, CoreError> {
        (**self).insert_all(cars, now)
    }

    fn update(&self, car: &Car) -> Result<(), CoreError> {
        (**self).update(car)
    }

    fn delete_by_id(&self, id: CarId) -> Result<(), CoreError> {
        (**self).delete_by_id(id)
    }

    fn count(&self) -> Result<u64, CoreError> {
        (**self).count()
    }
}

/// Core domain errors (no external error crates to keep deps at zero).
#[derive(Debug)]
pub enum CoreError {
    InvalidCar(String),
    NotFound(CarId),
    Repository(String),
}

impl Display for CoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CoreError::InvalidCar(msg) => write!(f, "invalid car: {}", msg),
            CoreError::NotFound(id) => write!(f, "could not find car with id: {}", id),
            CoreError::Repository(msg) => write!(f, "repository error: {}", msg),
        }
    }
}

impl Error for CoreError {}

pub mod adapters;
pub mod seed;
pub mod service;
pub mod validate;
