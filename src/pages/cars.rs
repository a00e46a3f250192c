use axum::{
	extract::{rejection::PathRejection, Path, State},
	http::Uri,
	response::IntoResponse,
	Form,
};
use log::{info, warn};

use super::{found, templates, templates::FormValues, PageError, PageResult, HOME_URL};
use crate::{
	auth::Requester,
	cars::{comments, object_id, permissions, Car, CarChanges, NewCar},
	error::AppError,
	search::{CarFilter, CommentFilter},
	state::AppState,
	users::User,
	validation::{self, FieldErrors},
};

pub const ANONYMOUS_COMMENT: &str = "Only registered users can leave comments.";

fn detail_url(id: i64) -> String {
	format!("/cars/{}/", id)
}

pub async fn car_list(State(state): State<AppState>, requester: Requester) -> PageResult {
	let cars = state.store.list_cars(&CarFilter::default()).await?;
	Ok(templates::car_list(requester.user(), &cars).into_response())
}

pub async fn car_create_form(requester: Requester, uri: Uri) -> PageResult {
	let user = requester.user().ok_or_else(|| PageError::login(&uri))?;
	Ok(templates::car_create(Some(user), &FormValues::new(), &FieldErrors::new()).into_response())
}

pub async fn car_create(
	State(state): State<AppState>,
	requester: Requester,
	uri: Uri,
	Form(form): Form<FormValues>,
) -> PageResult {
	let user = requester.user().ok_or_else(|| PageError::login(&uri))?;
	let draft = match NewCar::from_fields(&validation::from_form(form.clone())) {
		Ok(draft) => draft,
		Err(errors) => return Ok(templates::car_create(Some(user), &form, &errors).into_response()),
	};
	let car = state.store.create_car(user.id, draft).await?;
	info!("user {} created car {} ({})", user.username, car.id, car);
	Ok(found(&detail_url(car.id)))
}

pub async fn car_detail(
	State(state): State<AppState>,
	requester: Requester,
	path: Result<Path<i64>, PathRejection>,
) -> PageResult {
	let id = object_id(path)?;
	let car = state.store.get_car(id).await?.ok_or_else(AppError::no_car)?;
	let comments = state.store.list_comments(&CommentFilter::for_car(id)).await?;
	let page = templates::CarDetail {
		user: requester.user(),
		car: &car,
		comments: &comments,
		values: &FormValues::new(),
		errors: &FieldErrors::new(),
		error_message: None,
	};
	Ok(page.render().into_response())
}

/// Adds a comment from the detail page.
pub async fn car_comment(
	State(state): State<AppState>,
	requester: Requester,
	path: Result<Path<i64>, PathRejection>,
	Form(form): Form<FormValues>,
) -> PageResult {
	let id = object_id(path)?;
	let car = state.store.get_car(id).await?.ok_or_else(AppError::no_car)?;

	let (error_message, errors) = match requester.user() {
		None => (Some(ANONYMOUS_COMMENT), FieldErrors::new()),
		Some(author) => match comments::content_from_fields(&validation::from_form(form.clone())) {
			Ok(content) => {
				state.store.create_comment(id, author.id, content).await?.ok_or_else(AppError::no_car)?;
				info!("user {} commented on car {}", author.username, id);
				return Ok(found(&detail_url(id)));
			}
			Err(errors) => (None, errors),
		},
	};

	let comments = state.store.list_comments(&CommentFilter::for_car(id)).await?;
	let page = templates::CarDetail {
		user: requester.user(),
		car: &car,
		comments: &comments,
		values: &form,
		errors: &errors,
		error_message,
	};
	Ok(page.render().into_response())
}

/// Signed-in owner and the car, or a trip to the login page.
async fn owned_car(
	state: &AppState,
	requester: &Requester,
	uri: &Uri,
	path: Result<Path<i64>, PathRejection>,
) -> Result<(User, Car), PageError> {
	let user = requester.user().ok_or_else(|| PageError::login(uri))?;
	let id = object_id(path)?;
	let car = state.store.get_car(id).await?.ok_or_else(AppError::no_car)?;
	if !permissions::is_owner(Some(user), &car) {
		warn!("user {} tried to change car {} owned by {}", user.username, car.id, car.owner_name);
		return Err(PageError::login(uri));
	}
	Ok((user.clone(), car))
}

pub async fn car_edit_form(
	State(state): State<AppState>,
	requester: Requester,
	uri: Uri,
	path: Result<Path<i64>, PathRejection>,
) -> PageResult {
	let (user, car) = owned_car(&state, &requester, &uri, path).await?;
	Ok(templates::car_update(Some(&user), &car, &templates::car_values(&car), &FieldErrors::new()).into_response())
}

pub async fn car_edit(
	State(state): State<AppState>,
	requester: Requester,
	uri: Uri,
	path: Result<Path<i64>, PathRejection>,
	Form(form): Form<FormValues>,
) -> PageResult {
	let (user, car) = owned_car(&state, &requester, &uri, path).await?;
	let changes = match CarChanges::from_fields(&validation::from_form(form.clone()), false) {
		Ok(changes) => changes,
		Err(errors) => return Ok(templates::car_update(Some(&user), &car, &form, &errors).into_response()),
	};
	let car = state.store.update_car(car.id, changes).await?.ok_or_else(AppError::no_car)?;
	info!("car {} updated by its owner", car.id);
	Ok(found(&detail_url(car.id)))
}

pub async fn car_delete_confirm(
	State(state): State<AppState>,
	requester: Requester,
	uri: Uri,
	path: Result<Path<i64>, PathRejection>,
) -> PageResult {
	let (user, car) = owned_car(&state, &requester, &uri, path).await?;
	Ok(templates::car_delete(Some(&user), &car).into_response())
}

pub async fn car_delete(
	State(state): State<AppState>,
	requester: Requester,
	uri: Uri,
	path: Result<Path<i64>, PathRejection>,
) -> PageResult {
	let (_, car) = owned_car(&state, &requester, &uri, path).await?;
	if !state.store.delete_car(car.id).await? {
		return Err(AppError::no_car().into());
	}
	info!("car {} ({}) deleted with its comments", car.id, car);
	Ok(found(HOME_URL))
}
