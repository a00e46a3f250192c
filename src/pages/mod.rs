//! Server-rendered pages. Forms post back to the page that shows them and
//! redirect on success; sessions live in the `session` cookie.

use axum::{
	http::{
		header::{LOCATION, SET_COOKIE},
		StatusCode, Uri,
	},
	response::{IntoResponse, Response},
	routing::{get, post},
	Router,
};
use log::error;

use crate::{error::AppError, state::AppState, store::StoreError};

pub mod accounts;
pub mod admin;
pub mod cars;
pub mod templates;

pub const LOGIN_URL: &str = "/accounts/login/";
pub const HOME_URL: &str = "/cars/";

pub fn router() -> Router<AppState> {
	Router::new()
		.route("/", get(home))
		.route("/cars/", get(cars::car_list))
		.route("/cars/create/", get(cars::car_create_form).post(cars::car_create))
		.route("/cars/:id/", get(cars::car_detail).post(cars::car_comment))
		.route("/cars/:id/edit/", get(cars::car_edit_form).post(cars::car_edit))
		.route("/cars/:id/delete/", get(cars::car_delete_confirm).post(cars::car_delete))
		.route("/accounts/register/", get(accounts::register_form).post(accounts::register))
		.route("/accounts/login/", get(accounts::login_form).post(accounts::login))
		.route("/accounts/logout/", post(accounts::logout))
		.route("/admin/cars/", get(admin::cars))
		.route("/admin/cars/:id/delete/", post(admin::delete_car))
		.route("/admin/comments/", get(admin::comments))
		.route("/admin/comments/:id/delete/", post(admin::delete_comment))
}

async fn home() -> Response {
	(StatusCode::MOVED_PERMANENTLY, [(LOCATION, HOME_URL)]).into_response()
}

pub enum PageError {
	App(AppError),
	/// Send the visitor to the login form, then back to this path.
	Login(String),
}

pub type PageResult = Result<Response, PageError>;

impl PageError {
	/// Login redirect back to the requested path, query string included.
	pub fn login(uri: &Uri) -> Self {
		let next = uri.path_and_query().map_or(uri.path(), |p| p.as_str());
		PageError::Login(next.to_owned())
	}
}

impl From<AppError> for PageError {
	fn from(e: AppError) -> Self {
		PageError::App(e)
	}
}

impl From<StoreError> for PageError {
	fn from(e: StoreError) -> Self {
		PageError::App(e.into())
	}
}

impl From<jsonwebtoken::errors::Error> for PageError {
	fn from(e: jsonwebtoken::errors::Error) -> Self {
		PageError::App(e.into())
	}
}

impl IntoResponse for PageError {
	fn into_response(self) -> Response {
		match self {
			PageError::Login(next) => redirect_to_login(&next),
			PageError::App(e) => {
				let status = e.status();
				let message = match &e {
					AppError::Store(_) | AppError::Token(_) => {
						error!("{}", e);
						"A server error occurred.".to_owned()
					}
					_ => e.to_string(),
				};
				(status, templates::error_page(status.as_u16(), &message)).into_response()
			}
		}
	}
}

/// `302 Found`, what browsers expect after a form post.
pub fn found(location: &str) -> Response {
	(StatusCode::FOUND, [(LOCATION, location.to_owned())]).into_response()
}

pub fn redirect_to_login(next: &str) -> Response {
	found(&format!("{}?next={}", LOGIN_URL, urlencoding::encode(next)))
}

pub fn with_cookie(mut response: Response, cookie: &str) -> Response {
	if let Ok(value) = cookie.parse() {
		response.headers_mut().append(SET_COOKIE, value);
	}
	response
}

/// Only same-site absolute paths are followed after login.
///
/// Browsers drop tabs and newlines from a `Location` before resolving it, so
/// any control or whitespace character disqualifies the path.
pub fn safe_next(next: Option<&str>) -> &str {
	match next {
		Some(n)
			if n.starts_with('/')
				&& !n.starts_with("//")
				&& !n.contains('\\')
				&& !n.chars().any(|c| c.is_control() || c.is_whitespace()) =>
		{
			n
		}
		_ => HOME_URL,
	}
}
