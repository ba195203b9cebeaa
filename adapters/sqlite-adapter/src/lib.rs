//! sqlite-adapter — SQLite implementation of the CarRepository port.
//!
//! Purpose
//! - Provide the relational, file-based store for the car catalog.
//! - Implements the `CarRepository` trait from the `domain` crate.
//!
//! Notes
//! - Uses `rusqlite` with the `bundled` feature for portability.
//! - Stores timestamps as milliseconds since UNIX_EPOCH (i64).
//! - Registers a `fold_case` SQL function so make lookups use the same
//!   Unicode case folding as the domain instead of SQLite's ASCII-only NOCASE.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use domain::{Car, CarId, CarRepository, CoreError, NewCar};
use rusqlite::functions::FunctionFlags;
use rusqlite::{params, Connection};

const CAR_SELECT_SQL: &str = "SELECT id, make, model, created_at, updated_at FROM cars";

/// SQLite-backed car repository.
pub struct SqliteCarRepo {
    conn: Mutex<Connection>,
}

impl SqliteCarRepo {
    /// Open (or create) a SQLite database at the given path and ensure schema.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        let conn = Connection::open(path).map_err(map_sqerr)?;
        Self::from_connection(conn)
    }

    /// Like [`SqliteCarRepo::new`], but creates the parent directory first.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .map_err(|e| CoreError::Repository(format!("create {}: {e}", dir.display())))?;
        }
        Self::new(path)
    }

    /// Private in-memory database; contents vanish on drop.
    pub fn in_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory().map_err(map_sqerr)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, CoreError> {
        register_functions(&conn)?;
        init_schema(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, CoreError> {
        self.conn
            .lock()
            .map_err(|_| CoreError::Repository("mutex poisoned".into()))
    }
}

fn register_functions(conn: &Connection) -> Result<(), CoreError> {
    conn.create_scalar_function(
        "fold_case",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let s: String = ctx.get(0)?;
            Ok(domain::fold_case(&s))
        },
    )
    .map_err(map_sqerr)
}

fn init_schema(conn: &Connection) -> Result<(), CoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS cars (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            make TEXT NOT NULL,
            model TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        "#,
    )
    .map_err(map_sqerr)
}

fn map_sqerr<E: std::fmt::Display>(e: E) -> CoreError {
    CoreError::Repository(format!("sqlite error: {e}"))
}

fn system_time_to_millis(t: SystemTime) -> i64 {
    t.duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as i64
}

fn millis_to_system_time(ms: i64) -> SystemTime {
    UNIX_EPOCH + Duration::from_millis(ms.max(0) as u64)
}

fn row_to_car(row: &rusqlite::Row) -> Result<Car, CoreError> {
    let created_at: i64 = row.get(3).map_err(map_sqerr)?;
    let updated_at: i64 = row.get(4).map_err(map_sqerr)?;
    Ok(Car {
        id: row.get(0).map_err(map_sqerr)?,
        make: row.get(1).map_err(map_sqerr)?,
        model: row.get(2).map_err(map_sqerr)?,
        created_at: millis_to_system_time(created_at),
        updated_at: millis_to_system_time(updated_at),
    })
}

fn insert_row(conn: &Connection, car: NewCar, now: SystemTime) -> Result<Car, CoreError> {
    let now_ms = system_time_to_millis(now);
    conn.execute(
        "INSERT INTO cars(make, model, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
        params![car.make(), car.model(), now_ms],
    )
    .map_err(map_sqerr)?;
    let id = conn.last_insert_rowid();
    // Read back through the same millisecond truncation the table applies.
    Ok(Car::from_new(id, car, millis_to_system_time(now_ms)))
}

fn query_cars<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<Car>, CoreError> {
    let mut stmt = conn.prepare(sql).map_err(map_sqerr)?;
    let mut rows = stmt.query(params).map_err(map_sqerr)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().map_err(map_sqerr)? {
        out.push(row_to_car(row)?);
    }
    Ok(out)
}

impl CarRepository for SqliteCarRepo {
    fn find_all(&self) -> Result<Vec<Car>, CoreError> {
        let conn = self.lock()?;
        query_cars(&conn, &format!("{CAR_SELECT_SQL} ORDER BY id"), [])
    }

    fn find_by_make_ignore_case(&self, make: &str) -> Result<Vec<Car>, CoreError> {
        let conn = self.lock()?;
        query_cars(
            &conn,
            &format!("{CAR_SELECT_SQL} WHERE fold_case(make) = fold_case(?1) ORDER BY id"),
            params![make],
        )
    }

    fn find_by_id(&self, id: CarId) -> Result<Option<Car>, CoreError> {
        let conn = self.lock()?;
        let mut found = query_cars(&conn, &format!("{CAR_SELECT_SQL} WHERE id = ?1"), params![id])?;
        Ok(found.pop())
    }

    fn insert(&self, car: NewCar, now: SystemTime) -> Result<Car, CoreError> {
        let conn = self.lock()?;
        insert_row(&conn, car, now)
    }

    fn insert_all(&self, cars: Vec<NewCar>, now: SystemTime) -> Result<Vec<Car>, CoreError> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction().map_err(map_sqerr)?;
        let mut out = Vec::with_capacity(cars.len());
        for car in cars {
            out.push(insert_row(&tx, car, now)?);
        }
        tx.commit().map_err(map_sqerr)?;
        Ok(out)
    }

    fn update(&self, car: &Car) -> Result<(), CoreError> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE cars SET make = ?1, model = ?2, updated_at = ?3 WHERE id = ?4",
                params![car.make, car.model, system_time_to_millis(car.updated_at), car.id],
            )
            .map_err(map_sqerr)?;
        if changed == 0 {
            Err(CoreError::NotFound(car.id))
        } else {
            Ok(())
        }
    }

    fn delete_by_id(&self, id: CarId) -> Result<(), CoreError> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM cars WHERE id = ?1", params![id])
            .map_err(map_sqerr)?;
        Ok(())
    }

    fn count(&self) -> Result<u64, CoreError> {
        let conn = self.lock()?;
        conn.query_row("SELECT COUNT(*) FROM cars", [], |row| row.get::<_, i64>(0))
            .map(|n| n as u64)
            .map_err(map_sqerr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::seed::SeedOutcome;
    use domain::service::CarService;
    use domain::SystemClock;

    fn tmp_db() -> (SqliteCarRepo, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.db");
        let repo = SqliteCarRepo::new(path).unwrap();
        (repo, dir)
    }

    fn mk(make: &str, model: &str) -> NewCar {
        NewCar::new(make, model).unwrap()
    }

    fn at(ms: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_millis(ms)
    }

    #[test]
    fn insert_get_roundtrip() {
        let (repo, _dir) = tmp_db();
        let car = repo.insert(mk("Toyota", "Hilux"), at(1_500)).unwrap();
        assert!(car.id > 0);

        let got = repo.find_by_id(car.id).unwrap().unwrap();
        assert_eq!(got, car);
        assert_eq!(got.created_at, at(1_500));
        assert_eq!(got.updated_at, at(1_500));
    }

    #[test]
    fn find_by_id_missing() {
        let (repo, _dir) = tmp_db();
        assert!(repo.find_by_id(-1).unwrap().is_none());
        assert!(repo.find_by_id(1).unwrap().is_none());
    }

    #[test]
    fn find_all_orders_by_id() {
        let (repo, _dir) = tmp_db();
        for i in 0..4 {
            repo.insert(mk(&format!("Make{i}"), "M"), at(10 - i)).unwrap();
        }
        let all = repo.find_all().unwrap();
        assert_eq!(all.len(), 4);
        assert!(all.windows(2).all(|w| w[0].id < w[1].id));
        assert_eq!(all[0].make, "Make0");
    }

    #[test]
    fn make_filter_ignores_case() {
        let (repo, _dir) = tmp_db();
        repo.insert(mk("Fiat", "Panda"), at(0)).unwrap();
        repo.insert(mk("FIAT", "Uno"), at(0)).unwrap();
        repo.insert(mk("Toyota", "Hilux"), at(0)).unwrap();

        let fiats = repo.find_by_make_ignore_case("fiat").unwrap();
        assert_eq!(fiats.len(), 2);
        assert!(fiats.iter().all(|c| c.make_matches("Fiat")));

        assert!(repo.find_by_make_ignore_case("Ford").unwrap().is_empty());
    }

    #[test]
    fn make_filter_folds_non_ascii() {
        let (repo, _dir) = tmp_db();
        repo.insert(mk("Škoda", "Octavia"), at(0)).unwrap();
        assert_eq!(repo.find_by_make_ignore_case("ŠKODA").unwrap().len(), 1);
        assert!(repo.find_by_make_ignore_case("Skoda").unwrap().is_empty());
    }

    #[test]
    fn schema_has_no_unused_index() {
        let (repo, _dir) = tmp_db();
        let conn = repo.lock().unwrap();
        let indexes: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND tbl_name = 'cars'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(indexes, 0);
    }

    #[test]
    fn update_keeps_created_at() {
        let (repo, _dir) = tmp_db();
        let mut car = repo.insert(mk("Honda", "Civic"), at(1_000)).unwrap();
        car.apply(mk("Nissan", "Qashqai"), at(2_000));
        car.created_at = at(9_999);
        repo.update(&car).unwrap();

        let got = repo.find_by_id(car.id).unwrap().unwrap();
        assert_eq!(got.make, "Nissan");
        assert_eq!(got.model, "Qashqai");
        assert_eq!(got.created_at, at(1_000));
        assert_eq!(got.updated_at, at(2_000));
    }

    #[test]
    fn update_missing_is_not_found() {
        let (repo, _dir) = tmp_db();
        let ghost = Car::from_new(77, mk("Ghost", "Car"), at(0));
        assert!(matches!(repo.update(&ghost), Err(CoreError::NotFound(77))));
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn delete_is_idempotent_and_ids_not_reused() {
        let (repo, _dir) = tmp_db();
        let a = repo.insert(mk("Honda", "Civic"), at(0)).unwrap();
        repo.delete_by_id(a.id).unwrap();
        repo.delete_by_id(a.id).unwrap();
        repo.delete_by_id(-5).unwrap();
        assert!(repo.find_by_id(a.id).unwrap().is_none());

        let b = repo.insert(mk("Mazda", "MX-5"), at(0)).unwrap();
        assert!(b.id > a.id);
    }

    #[test]
    fn insert_all_is_visible_as_batch() {
        let (repo, _dir) = tmp_db();
        let stored = repo
            .insert_all(vec![mk("A", "1"), mk("B", "2"), mk("C", "3")], at(42))
            .unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(repo.count().unwrap(), 3);
        assert!(stored.iter().all(|c| c.created_at == at(42)));
    }

    #[test]
    fn seeding_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cars.db");

        let first = CarService::new(SqliteCarRepo::open(&path).unwrap(), SystemClock);
        assert_eq!(first.seed_if_empty().unwrap(), SeedOutcome::Seeded(3));
        drop(first);

        let second = CarService::new(SqliteCarRepo::open(&path).unwrap(), SystemClock);
        assert_eq!(second.seed_if_empty().unwrap(), SeedOutcome::AlreadySeeded);
        assert_eq!(second.count().unwrap(), 3);
        assert_eq!(second.find_all(Some("fiat")).unwrap()[0].model, "Panda");
    }

    #[test]
    fn in_memory_database_works() {
        let repo = SqliteCarRepo::in_memory().unwrap();
        repo.insert(mk("Volvo", "240"), at(0)).unwrap();
        assert_eq!(repo.count().unwrap(), 1);
    }
}
