//! Moderation views. Admins can browse, filter and delete cars and comments
//! but never add or change them.

use std::collections::HashMap;

use axum::{
	extract::{rejection::PathRejection, Path, Query, State},
	http::Uri,
	response::IntoResponse,
};
use log::info;

use super::{found, templates, PageError, PageResult};
use crate::{
	auth::Requester,
	cars::object_id,
	error::AppError,
	search::{CarFilter, CommentFilter},
	state::AppState,
	users::User,
	validation::FieldErrors,
};

pub const NO_COMMENT: &str = "No Comment matches the given query.";

fn admin<'a>(requester: &'a Requester, uri: &Uri) -> Result<&'a User, PageError> {
	match requester.user() {
		Some(user) if user.is_admin => Ok(user),
		_ => Err(PageError::login(uri)),
	}
}

pub async fn cars(
	State(state): State<AppState>,
	requester: Requester,
	uri: Uri,
	Query(params): Query<HashMap<String, String>>,
) -> PageResult {
	let user = admin(&requester, &uri)?;
	let (cars, errors) = match CarFilter::from_params(&params) {
		Ok(filter) => (state.store.list_cars(&filter).await?, FieldErrors::new()),
		Err(errors) => (Vec::new(), errors),
	};
	Ok(templates::admin_cars(user, &cars, &params, &errors).into_response())
}

pub async fn delete_car(
	State(state): State<AppState>,
	requester: Requester,
	uri: Uri,
	path: Result<Path<i64>, PathRejection>,
) -> PageResult {
	let user = admin(&requester, &uri)?;
	let id = object_id(path)?;
	if !state.store.delete_car(id).await? {
		return Err(AppError::no_car().into());
	}
	info!("admin {} deleted car {}", user.username, id);
	Ok(found("/admin/cars/"))
}

pub async fn comments(
	State(state): State<AppState>,
	requester: Requester,
	uri: Uri,
	Query(params): Query<HashMap<String, String>>,
) -> PageResult {
	let user = admin(&requester, &uri)?;
	let (comments, errors) = match CommentFilter::from_params(&params) {
		Ok(filter) => (state.store.list_comments(&filter).await?, FieldErrors::new()),
		Err(errors) => (Vec::new(), errors),
	};
	Ok(templates::admin_comments(user, &comments, &params, &errors).into_response())
}

pub async fn delete_comment(
	State(state): State<AppState>,
	requester: Requester,
	uri: Uri,
	path: Result<Path<i64>, PathRejection>,
) -> PageResult {
	let user = admin(&requester, &uri)?;
	let id = path.map(|Path(id)| id).map_err(|_| AppError::NotFound(NO_COMMENT))?;
	if !state.store.delete_comment(id).await? {
		return Err(AppError::NotFound(NO_COMMENT).into());
	}
	info!("admin {} deleted comment {}", user.username, id);
	Ok(found("/admin/comments/"))
}
