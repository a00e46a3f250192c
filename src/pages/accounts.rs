use std::collections::HashMap;

use axum::{
	extract::{Query, State},
	response::IntoResponse,
	Form,
};
use log::info;

use super::{found, safe_next, templates, templates::FormValues, with_cookie, PageResult, HOME_URL};
use crate::{
	auth::{session_clear_cookie, session_set_cookie},
	error::AppError,
	state::AppState,
	users::users,
	validation::{self, FieldErrors},
};

pub const BAD_LOGIN: &str = "Please enter a correct username and password. Note that both fields may be case-sensitive.";

pub async fn register_form() -> PageResult {
	Ok(templates::register(&FormValues::new(), &FieldErrors::new()).into_response())
}

/// Creates the account and signs it in.
pub async fn register(State(state): State<AppState>, Form(form): Form<FormValues>) -> PageResult {
	let fields = validation::from_form(form.clone());
	let user = match users::register(state.store.as_ref(), &fields, &state.config).await {
		Ok(user) => user,
		Err(AppError::Validation(errors)) => return Ok(templates::register(&form, &errors).into_response()),
		Err(e) => return Err(e.into()),
	};
	let token = state.keys.issue(&user)?;
	Ok(with_cookie(found(HOME_URL), &session_set_cookie(&token, state.keys.ttl_seconds(), state.config.secure_cookies)))
}

pub async fn login_form(Query(params): Query<HashMap<String, String>>) -> PageResult {
	Ok(templates::login(&FormValues::new(), None, params.get("next").map(String::as_str)).into_response())
}

pub async fn login(State(state): State<AppState>, Form(form): Form<FormValues>) -> PageResult {
	let username = form.get("username").map(|u| u.trim()).unwrap_or_default();
	let password = form.get("password").map(String::as_str).unwrap_or_default();
	let next = form.get("next").map(String::as_str);

	let user = if username.is_empty() || password.is_empty() {
		None
	} else {
		users::authenticate(state.store.as_ref(), username, password).await?
	};
	let Some(user) = user else {
		return Ok(templates::login(&form, Some(BAD_LOGIN), next).into_response());
	};

	let token = state.keys.issue(&user)?;
	info!("user {} logged in", user.username);
	Ok(with_cookie(found(safe_next(next)), &session_set_cookie(&token, state.keys.ttl_seconds(), state.config.secure_cookies)))
}

pub async fn logout(State(state): State<AppState>) -> PageResult {
	Ok(with_cookie(found(HOME_URL), &session_clear_cookie(state.config.secure_cookies)))
}
