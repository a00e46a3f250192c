use std::fmt;

use axum::{
	extract::{
		rejection::{JsonRejection, PathRejection},
		Path, State,
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
	search::CommentFilter,
	state::AppState,
	validation::{self, FieldErrors, Fields},
};

/// The car is left out of the JSON form; comments are only reachable through it.
#[derive(serde::Serialize, Debug, Clone, PartialEq, FromRow)]
pub struct Comment {
	pub id: i64,
	pub content: String,
	pub created_at: DateTime<Utc>,
	#[serde(skip_serializing)]
	pub car: i64,
	pub author: i64,
	#[serde(skip_serializing)]
	pub author_name: String,
}

impl fmt::Display for Comment {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Comment by {} at {}", self.author_name, self.created_at.format("%Y-%m-%d %H:%M"))
	}
}

pub fn content_from_fields(fields: &Fields) -> Result<String, FieldErrors> {
	let mut errors = FieldErrors::new();
	let content = validation::text(fields, "content", None, true, &mut errors);
	match content {
		Some(content) if errors.is_empty() => Ok(content),
		_ => Err(errors),
	}
}

pub async fn list_comments(
	State(state): State<AppState>,
	_requester: Requester,
	path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Vec<Comment>>, AppError> {
	let car_pk = object_id(path)?;
	if state.store.get_car(car_pk).await?.is_none() {
		return Err(AppError::no_car());
	}
	let comments = state.store.list_comments(&CommentFilter::for_car(car_pk)).await?;
	Ok(Json(comments))
}

pub async fn create_comment(
	State(state): State<AppState>,
	requester: Requester,
	path: Result<Path<i64>, PathRejection>,
	payload: Result<Json<Fields>, JsonRejection>,
) -> Result<(StatusCode, Json<Comment>), AppError> {
	let author = permissions::authenticated_or_read_only(&Method::POST, &requester)?.ok_or(AppError::NotAuthenticated)?;
	let car_pk = object_id(path)?;
	if state.store.get_car(car_pk).await?.is_none() {
		return Err(AppError::no_car());
	}

	let Json(fields) = payload?;
	let content = content_from_fields(&fields)?;
	let comment = state
		.store
		.create_comment(car_pk, author.id, content)
		.await?
		.ok_or_else(AppError::no_car)?;
	info!("user {} commented on car {}", author.username, car_pk);
	Ok((StatusCode::CREATED, Json(comment)))
}
