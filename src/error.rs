use axum::{
	extract::rejection::JsonRejection,
	http::{header::WWW_AUTHENTICATE, StatusCode},
	response::{IntoResponse, Response},
	Json,
};
use log::error;
use serde_json::json;
use thiserror::Error;

use crate::{store::StoreError, validation::FieldErrors};

pub const NO_CAR: &str = "No Car matches the given query.";

#[derive(Error, Debug)]
pub enum AppError {
	#[error("{0}")]
	NotFound(&'static str),

	#[error("Authentication credentials were not provided.")]
	NotAuthenticated,

	#[error("Invalid token.")]
	InvalidToken,

	#[error("You do not have permission to perform this action.")]
	PermissionDenied,

	#[error("Invalid input: {0}")]
	Validation(#[from] FieldErrors),

	#[error(transparent)]
	Payload(#[from] JsonRejection),

	#[error("Storage error: {0}")]
	Store(#[from] StoreError),

	#[error("Token error: {0}")]
	Token(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
	pub fn no_car() -> Self {
		AppError::NotFound(NO_CAR)
	}

	pub fn status(&self) -> StatusCode {
		match self {
			AppError::NotFound(_) => StatusCode::NOT_FOUND,
			AppError::NotAuthenticated | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
			AppError::PermissionDenied => StatusCode::FORBIDDEN,
			AppError::Validation(_) => StatusCode::BAD_REQUEST,
			AppError::Payload(rejection) => rejection.status(),
			AppError::Store(_) | AppError::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response {
		let status = self.status();
		match self {
			AppError::Validation(errors) => (status, Json(errors)).into_response(),
			AppError::NotAuthenticated | AppError::InvalidToken => {
				(status, [(WWW_AUTHENTICATE, "Bearer")], Json(json!({ "detail": self.to_string() }))).into_response()
			}
			AppError::Payload(rejection) => (status, Json(json!({ "detail": rejection.body_text() }))).into_response(),
			AppError::Store(_) | AppError::Token(_) => {
				error!("{}", self);
				(status, Json(json!({ "detail": "A server error occurred." }))).into_response()
			}
			_ => (status, Json(json!({ "detail": self.to_string() }))).into_response(),
		}
	}
}
