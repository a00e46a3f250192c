use axum::extract::{rejection::PathRejection, Path};

use crate::error::AppError;

pub mod cars;
pub mod comments;
pub mod permissions;

pub use cars::{Car, CarChanges, NewCar};
pub use comments::Comment;

/// A path id that is not a number can never match a car.
pub(crate) fn object_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, AppError> {
	path.map(|Path(id)| id).map_err(|_| AppError::no_car())
}
