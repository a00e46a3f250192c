//! Access rules: reading is open to everyone, writing needs a signed-in
//! requester, and changing a car needs its owner.

use axum::http::Method;

use super::cars::Car;
use crate::{auth::Requester, error::AppError, users::User};

pub fn is_safe(method: &Method) -> bool {
	matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Returns the signed-in user, if any, once the request may proceed.
pub fn authenticated_or_read_only<'a>(method: &Method, requester: &'a Requester) -> Result<Option<&'a User>, AppError> {
	match requester.user() {
		Some(user) => Ok(Some(user)),
		None if is_safe(method) => Ok(None),
		None => Err(AppError::NotAuthenticated),
	}
}

pub fn car_owner_or_read_only(method: &Method, requester: &Requester, car: &Car) -> Result<(), AppError> {
	if is_safe(method) {
		return Ok(());
	}
	let user = requester.user().ok_or(AppError::NotAuthenticated)?;
	if is_owner(Some(user), car) {
		Ok(())
	} else {
		Err(AppError::PermissionDenied)
	}
}

pub fn is_owner(user: Option<&User>, car: &Car) -> bool {
	user.is_some_and(|user| user.id == car.owner)
}
