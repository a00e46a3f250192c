use axum::{extract::rejection::JsonRejection, extract::State, Json};
use chrono::{DateTime, Utc};
use log::{info, warn};
use postgres_from_row::FromRow;
use serde_json::{json, Value};

use crate::{
	config::Config,
	encryption_engine::{hash_password, verify_password},
	error::AppError,
	state::AppState,
	store::{Store, StoreError},
	validation::{self, FieldErrors, Fields, NON_FIELD},
};

pub const USERNAME_MAX: usize = 150;
pub const PASSWORD_MIN: usize = 8;

pub const USERNAME_INVALID: &str =
	"Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";
pub const USERNAME_TAKEN: &str = "A user with that username already exists.";
pub const PASSWORD_MISMATCH: &str = "The two password fields didn't match.";
pub const BAD_CREDENTIALS: &str = "Unable to log in with provided credentials.";

#[derive(serde::Serialize, Debug, Clone, PartialEq, FromRow)]
pub struct User {
	pub id: i64,
	pub username: String,
	#[serde(skip_serializing)]
	pub password_hash: String,
	pub is_admin: bool,
	pub created_at: DateTime<Utc>,
}

/// A validated sign-up request; the username is not yet known to be free.
#[derive(Debug)]
pub struct Registration {
	pub username: String,
	pub password: String,
}

impl Registration {
	pub fn from_fields(fields: &Fields) -> Result<Self, FieldErrors> {
		let mut errors = FieldErrors::new();

		let username = validation::text(fields, "username", None, true, &mut errors);
		if let Some(name) = &username {
			if name.chars().count() > USERNAME_MAX {
				errors.add(
					"username",
					format!("Ensure this value has at most {} characters (it has {}).", USERNAME_MAX, name.chars().count()),
				);
			} else if !name.chars().all(is_username_char) {
				errors.add("username", USERNAME_INVALID);
			}
		}

		let password1 = raw_password(fields, "password1", &mut errors);
		let password2 = raw_password(fields, "password2", &mut errors);

		if let (Some(p1), Some(p2)) = (&password1, &password2) {
			if p1 != p2 {
				errors.add("password2", PASSWORD_MISMATCH);
			} else {
				check_password_strength(p1, username.as_deref(), &mut errors);
			}
		}

		match (username, password1) {
			(Some(username), Some(password)) if errors.is_empty() => Ok(Registration { username, password }),
			_ => Err(errors),
		}
	}
}

fn is_username_char(c: char) -> bool {
	c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_')
}

// Passwords keep their whitespace.
fn raw_password(fields: &Fields, name: &str, errors: &mut FieldErrors) -> Option<String> {
	match fields.get(name) {
		Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
		Some(Value::String(_)) | None => {
			errors.add(name, validation::REQUIRED);
			None
		}
		Some(_) => {
			errors.add(name, validation::NOT_A_STRING);
			None
		}
	}
}

fn check_password_strength(password: &str, username: Option<&str>, errors: &mut FieldErrors) {
	if password.chars().count() < PASSWORD_MIN {
		errors.add(
			"password2",
			format!("This password is too short. It must contain at least {} characters.", PASSWORD_MIN),
		);
	}
	if password.chars().all(|c| c.is_ascii_digit()) {
		errors.add("password2", "This password is entirely numeric.");
	}
	if username.is_some_and(|name| name.eq_ignore_ascii_case(password)) {
		errors.add("password2", "The password is too similar to the username.");
	}
}

/// Validates and stores a new account. Configured admin names are promoted right away.
pub async fn register(store: &dyn Store, fields: &Fields, config: &Config) -> Result<User, AppError> {
	let registration = Registration::from_fields(fields)?;
	let hash = hash_password(&registration.password, config.password_iterations);
	match store.create_user(&registration.username, &hash).await {
		Ok(mut user) => {
			info!("registered user {} ({})", user.username, user.id);
			if config.admin_users.contains(&user.username) {
				store.promote_admins(std::slice::from_ref(&user.username)).await?;
				user.is_admin = true;
				info!("user {} is an admin", user.username);
			}
			Ok(user)
		}
		Err(StoreError::UsernameTaken(_)) => Err(FieldErrors::single("username", USERNAME_TAKEN).into()),
		Err(e) => Err(e.into()),
	}
}

pub async fn authenticate(store: &dyn Store, username: &str, password: &str) -> Result<Option<User>, StoreError> {
	let Some(user) = store.user_by_username(username).await? else {
		warn!("login attempt for unknown user {}", username);
		return Ok(None);
	};
	if verify_password(password, &user.password_hash) {
		Ok(Some(user))
	} else {
		warn!("wrong password for user {}", username);
		Ok(None)
	}
}

/// `POST /api/token/` exchanges credentials for a bearer token.
pub async fn obtain_token(
	State(state): State<AppState>,
	payload: Result<Json<Fields>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
	let Json(fields) = payload?;
	let mut errors = FieldErrors::new();
	let username = validation::text(&fields, "username", None, true, &mut errors);
	let password = raw_password(&fields, "password", &mut errors);
	let (Some(username), Some(password)) = (username, password) else {
		return Err(errors.into());
	};

	let Some(user) = authenticate(state.store.as_ref(), &username, &password).await? else {
		return Err(FieldErrors::single(NON_FIELD, BAD_CREDENTIALS).into());
	};
	let token = state.keys.issue(&user)?;
	Ok(Json(json!({ "token": token })))
}
