//! `/v1/cars` routes.
//!
//! Status mapping:
//! - list: 200 with a JSON array, or 404 when the (filtered) result is empty
//! - get: 200 or 404
//! - create: 201 + Location, 400 on a bad body, 500 on storage failure
//! - update: 204 + Location, 404 when the id is unknown, 400 on a bad body
//! - delete: 204 whether or not the id existed

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use domain::service::CarService;
use domain::{Car, CarId, CoreError, NewCar, SystemClock};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::repo::AnyRepo;

pub type Cars = CarService<AnyRepo, SystemClock>;

#[derive(Clone)]
pub struct AppState {
    pub cars: Arc<Cars>,
}

impl AppState {
    pub fn new(cars: Cars) -> Self {
        Self {
            cars: Arc::new(cars),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/cars", get(list_cars).post(create_car))
        .route(
            "/v1/cars/:id",
            get(get_car).put(update_car).delete(delete_car),
        )
        .route("/health", get(health))
        .with_state(state)
}

/// Request body for create and update. Only make and model are read; id,
/// timestamps and unknown fields are ignored.
#[derive(Deserialize)]
struct CarIn {
    make: Option<String>,
    model: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarOut {
    pub id: CarId,
    pub make: String,
    pub model: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Car> for CarOut {
    fn from(car: Car) -> Self {
        Self {
            id: car.id,
            make: car.make,
            model: car.model,
            created_at: http_common::system_time_to_rfc3339(car.created_at),
            updated_at: http_common::system_time_to_rfc3339(car.updated_at),
        }
    }
}

#[derive(Deserialize)]
struct ListQuery {
    make: Option<String>,
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(http_common::json_err("not_found"))).into_response()
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(http_common::json_error_with_message("bad_request", message)),
    )
        .into_response()
}

fn core_error_response(op: &'static str, e: CoreError) -> Response {
    match e {
        CoreError::InvalidCar(msg) => {
            warn!(op, %msg, "invalid car");
            bad_request(&msg)
        }
        CoreError::NotFound(id) => {
            warn!(op, id, "car not found");
            not_found()
        }
        CoreError::Repository(msg) => {
            error!(op, err = %msg, "repository error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(http_common::json_err("internal")),
            )
                .into_response()
        }
    }
}

/// Turn an extractor rejection into the structured 400 body.
fn rejected(what: &'static str, body_text: String) -> Response {
    warn!(what, err = %body_text, "rejected request");
    bad_request(&body_text)
}

fn bind_id(path: Result<Path<CarId>, PathRejection>) -> Result<CarId, Response> {
    path.map(|Path(id)| id)
        .map_err(|rej| rejected("id", rej.body_text()))
}

/// Bind and validate a request body before it reaches the service.
fn bind_car(payload: Result<Json<CarIn>, JsonRejection>) -> Result<NewCar, Response> {
    let Json(body) = payload.map_err(|rej| rejected("body", rej.body_text()))?;
    NewCar::new(
        body.make.unwrap_or_default(),
        body.model.unwrap_or_default(),
    )
    .map_err(|e| {
        warn!(err = %e, "invalid car body");
        bad_request(&e.to_string())
    })
}

async fn list_cars(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Response {
    let Query(q) = match query {
        Ok(q) => q,
        Err(rej) => return rejected("query", rej.body_text()),
    };
    match state.cars.find_all(q.make.as_deref()) {
        Ok(cars) if cars.is_empty() => {
            warn!(make = ?q.make, "list 404");
            not_found()
        }
        Ok(cars) => {
            let out: Vec<CarOut> = cars.into_iter().map(CarOut::from).collect();
            (StatusCode::OK, Json(out)).into_response()
        }
        Err(e) => core_error_response("list", e),
    }
}

async fn get_car(
    State(state): State<AppState>,
    path: Result<Path<CarId>, PathRejection>,
) -> Response {
    let id = match bind_id(path) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match state.cars.find_by_id(id) {
        Ok(Some(car)) => (StatusCode::OK, Json(CarOut::from(car))).into_response(),
        Ok(None) => {
            warn!(id, "get 404");
            not_found()
        }
        Err(e) => core_error_response("get", e),
    }
}

async fn create_car(
    State(state): State<AppState>,
    payload: Result<Json<CarIn>, JsonRejection>,
) -> Response {
    let input = match bind_car(payload) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    match state.cars.save(input) {
        Ok(car) => {
            info!(id = car.id, make = %car.make, model = %car.model, "create ok");
            (
                StatusCode::CREATED,
                [(header::LOCATION, http_common::car_location(car.id))],
            )
                .into_response()
        }
        Err(e) => core_error_response("create", e),
    }
}

async fn update_car(
    State(state): State<AppState>,
    path: Result<Path<CarId>, PathRejection>,
    payload: Result<Json<CarIn>, JsonRejection>,
) -> Response {
    let id = match bind_id(path) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let input = match bind_car(payload) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    match state.cars.update_by_id(id, input) {
        Ok(car) => {
            info!(id = car.id, "update ok");
            (
                StatusCode::NO_CONTENT,
                [(header::LOCATION, http_common::car_location(car.id))],
            )
                .into_response()
        }
        Err(e) => core_error_response("update", e),
    }
}

async fn delete_car(
    State(state): State<AppState>,
    path: Result<Path<CarId>, PathRejection>,
) -> Response {
    let id = match bind_id(path) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match state.cars.delete_by_id(id) {
        Ok(()) => {
            info!(id, "delete ok");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => core_error_response("delete", e),
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}
