use std::{collections::HashMap, fmt};

use axum::{
	extract::{
		rejection::{JsonRejection, PathRejection},
		Path, Query, State,
	},
	http::Method,
	Json,
};
use chrono::{DateTime, Utc};
use hyper::StatusCode;
use log::info;
use postgres_from_row::FromRow;

use super::{object_id, permissions};
use crate::{
	auth::Requester,
	error::AppError,
	search::CarFilter,
	state::AppState,
	validation::{self, FieldErrors, Fields},
};

pub const MAKE_MAX: usize = 100;
pub const MODEL_MAX: usize = 100;

#[derive(serde::Serialize, Debug, Clone, PartialEq, FromRow)]
pub struct Car {
	pub id: i64,
	pub make: String,
	pub model: String,
	pub year: i32,
	pub description: String,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	pub owner: i64,
	#[serde(skip_serializing)]
	pub owner_name: String,
}

impl fmt::Display for Car {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} {} ({})", self.make, self.model, self.year)
	}
}

/// Writable fields of a car about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCar {
	pub make: String,
	pub model: String,
	pub year: i32,
	pub description: String,
}

/// Writable fields of an update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CarChanges {
	pub make: Option<String>,
	pub model: Option<String>,
	pub year: Option<i32>,
	pub description: Option<String>,
}

impl CarChanges {
	/// With `partial` unset every writable field is required.
	pub fn from_fields(fields: &Fields, partial: bool) -> Result<Self, FieldErrors> {
		let required = !partial;
		let mut errors = FieldErrors::new();
		let changes = CarChanges {
			make: validation::text(fields, "make", Some(MAKE_MAX), required, &mut errors),
			model: validation::text(fields, "model", Some(MODEL_MAX), required, &mut errors),
			year: validation::integer(fields, "year", required, &mut errors),
			description: validation::text(fields, "description", None, required, &mut errors),
		};
		errors.finish(changes)
	}

	pub fn apply(self, car: &mut Car) {
		if let Some(make) = self.make {
			car.make = make;
		}
		if let Some(model) = self.model {
			car.model = model;
		}
		if let Some(year) = self.year {
			car.year = year;
		}
		if let Some(description) = self.description {
			car.description = description;
		}
	}
}

impl NewCar {
	pub fn from_fields(fields: &Fields) -> Result<Self, FieldErrors> {
		match CarChanges::from_fields(fields, false)? {
			CarChanges {
				make: Some(make),
				model: Some(model),
				year: Some(year),
				description: Some(description),
			} => Ok(NewCar { make, model, year, description }),
			_ => Err(FieldErrors::single(validation::NON_FIELD, "Incomplete car.")),
		}
	}
}

impl From<NewCar> for CarChanges {
	fn from(car: NewCar) -> Self {
		CarChanges {
			make: Some(car.make),
			model: Some(car.model),
			year: Some(car.year),
			description: Some(car.description),
		}
	}
}

pub async fn list_cars(
	State(state): State<AppState>,
	_requester: Requester,
	Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Car>>, AppError> {
	let filter = CarFilter::from_params(&params)?;
	Ok(Json(state.store.list_cars(&filter).await?))
}

pub async fn create_car(
	State(state): State<AppState>,
	requester: Requester,
	payload: Result<Json<Fields>, JsonRejection>,
) -> Result<(StatusCode, Json<Car>), AppError> {
	let owner = permissions::authenticated_or_read_only(&Method::POST, &requester)?.ok_or(AppError::NotAuthenticated)?;
	let Json(fields) = payload?;
	let draft = NewCar::from_fields(&fields)?;
	let car = state.store.create_car(owner.id, draft).await?;
	info!("user {} created car {} ({})", owner.username, car.id, car);
	Ok((StatusCode::CREATED, Json(car)))
}

pub async fn retrieve_car(
	State(state): State<AppState>,
	_requester: Requester,
	path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Car>, AppError> {
	let id = object_id(path)?;
	let car = state.store.get_car(id).await?.ok_or_else(AppError::no_car)?;
	Ok(Json(car))
}

pub async fn update_car(
	State(state): State<AppState>,
	requester: Requester,
	path: Result<Path<i64>, PathRejection>,
	payload: Result<Json<Fields>, JsonRejection>,
) -> Result<Json<Car>, AppError> {
	save_car(state, &Method::PUT, requester, path, payload, false).await
}

pub async fn partial_update_car(
	State(state): State<AppState>,
	requester: Requester,
	path: Result<Path<i64>, PathRejection>,
	payload: Result<Json<Fields>, JsonRejection>,
) -> Result<Json<Car>, AppError> {
	save_car(state, &Method::PATCH, requester, path, payload, true).await
}

async fn save_car(
	state: AppState,
	method: &Method,
	requester: Requester,
	path: Result<Path<i64>, PathRejection>,
	payload: Result<Json<Fields>, JsonRejection>,
	partial: bool,
) -> Result<Json<Car>, AppError> {
	permissions::authenticated_or_read_only(method, &requester)?;
	let id = object_id(path)?;
	let car = state.store.get_car(id).await?.ok_or_else(AppError::no_car)?;
	permissions::car_owner_or_read_only(method, &requester, &car)?;

	let Json(fields) = payload?;
	let changes = CarChanges::from_fields(&fields, partial)?;
	let car = state.store.update_car(id, changes).await?.ok_or_else(AppError::no_car)?;
	info!("car {} updated by its owner", car.id);
	Ok(Json(car))
}

pub async fn destroy_car(
	State(state): State<AppState>,
	requester: Requester,
	path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, AppError> {
	permissions::authenticated_or_read_only(&Method::DELETE, &requester)?;
	let id = object_id(path)?;
	let car = state.store.get_car(id).await?.ok_or_else(AppError::no_car)?;
	permissions::car_owner_or_read_only(&Method::DELETE, &requester, &car)?;

	if !state.store.delete_car(id).await? {
		return Err(AppError::no_car());
	}
	info!("car {} ({}) deleted with its comments", id, car);
	Ok(StatusCode::NO_CONTENT)
}
